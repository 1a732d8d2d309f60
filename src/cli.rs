
use clap::Parser;
use chrono::Datelike;
use lazy_static::lazy_static;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use crate::data_types::model_result::ModelError;
use crate::greedy_search::SearchConfig;

lazy_static! {
    /// Stores the full version string we plan to use.
    /// # Examples
    /// * `0.3.0-6bb9635-dirty` - while on a dirty branch
    /// * `0.3.0-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));
}

#[derive(Clone, Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = format!("Copyright (C) 2017-{}
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year()))]
pub struct Settings {
    /// Input site evidence table (tsv/csv) with columns site, treat_top1, treat_top2, ctrl_top1, ctrl_top2
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(value_name = "TABLE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_filename: PathBuf,

    /// Output genotype call table (tsv/csv)
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "TABLE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: PathBuf,

    /// Output per-model summary file (optional, csv/tsv)
    #[clap(long = "summary-file")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub summary_filename: Option<PathBuf>,

    /// Number of threads to use for model fitting
    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Upper bound on the fitted allele ratio; the lower bound is 1 minus this value
    #[clap(long = "max-allowed-ratio")]
    #[clap(value_name = "RATIO")]
    #[clap(default_value = "0.99")]
    #[clap(help_heading = Some("Model Fitting"))]
    pub max_allowed_ratio: f64,

    /// Minimum log likelihood improvement for the greedy search to keep walking
    #[clap(long = "search-tolerance")]
    #[clap(value_name = "DELTA")]
    #[clap(default_value = "1e-8")]
    #[clap(help_heading = Some("Model Fitting"))]
    #[clap(hide = true)]
    pub search_tolerance: f64,

    /// Cross-checks every greedy search against a full scan and warns on disagreement (debug only, slow)
    #[clap(long = "verify-unimodal")]
    #[clap(help_heading = Some("Model Fitting"))]
    #[clap(hide = true)]
    pub verify_unimodal: bool,
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
fn check_required_filename(filename: &Path, label: &str) {
    if !filename.exists() {
        error!("{} does not exist: \"{}\"", label, filename.display());
        std::process::exit(exitcode::NOINPUT);
    } else {
        info!("{}: \"{}\"", label, filename.display());
    }
}

impl Settings {
    /// Wrapper function to build the greedy search configuration from our CLI settings
    pub fn search_config(&self) -> Result<SearchConfig, ModelError> {
        SearchConfig::new(self.search_tolerance, self.max_allowed_ratio, self.verify_unimodal)
    }
}

pub fn get_raw_settings() -> Settings {
    Settings::parse()
}

/// Do some additional checks here, we may increase these as we go.
/// Also can modify settings if needed since we're passing it around.
/// # Arguments
/// * `settings` - the raw settings, nothing has been checked other than what clap does for us.
pub fn check_settings(mut settings: Settings) -> Settings {
    check_required_filename(&settings.input_filename, "Site evidence file");
    info!("Output call file: \"{}\"", settings.output_filename.display());
    if settings.input_filename == settings.output_filename {
        error!("Input and output tables must be different files");
        std::process::exit(exitcode::USAGE);
    }

    // 0 doesn't make sense, so lets just error proof it up to 1
    if settings.threads == 0 {
        settings.threads = 1;
    }

    if let Err(e) = settings.search_config() {
        error!("Invalid model fitting settings: {e}");
        std::process::exit(exitcode::USAGE);
    }

    // dump stuff to the logger
    info!("Model fitting:");
    info!("\tAllele ratio band: [{:.4}, {:.4}]", 1.0 - settings.max_allowed_ratio, settings.max_allowed_ratio);
    info!("\tGreedy search tolerance: {:e}", settings.search_tolerance);
    if settings.verify_unimodal {
        warn!("\tUnimodality verification: ENABLED, every search will also run a full scan");
    }
    info!("Processing threads: {}", settings.threads);

    //send the settings back
    settings
}
