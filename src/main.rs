
use varstat::cli::{Settings, check_settings, get_raw_settings};
use varstat::data_types::model_result::ModelError;
use varstat::greedy_search::SearchConfig;
use varstat::site_caller::{SiteCall, call_site};
use varstat::site_reader::{SiteReader, SiteRecord};
use varstat::writers::call_summary::CallSummary;
use varstat::writers::ordered_call_writer::OrderedCallWriter;

use log::{LevelFilter, debug, error, info, warn};
use std::fs::File;
use std::sync::mpsc;
use std::time::Instant;
use threadpool::ThreadPool;

/// What a worker sends back: (site index, site label, call result)
type SiteResult = (usize, String, Result<SiteCall, ModelError>);

fn main() {
    // get the settings
    let settings: Settings = get_raw_settings();
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };

    // immediately setup logging first
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    // okay, now we can check all the other settings
    let cli_settings: Settings = check_settings(settings);
    let search_config: SearchConfig = match cli_settings.search_config() {
        Ok(sc) => sc,
        Err(e) => {
            error!("Invalid model fitting settings: {}", e);
            std::process::exit(exitcode::USAGE);
        }
    };

    let mut site_reader: SiteReader<File> = match SiteReader::from_path(&cli_settings.input_filename) {
        Ok(sr) => sr,
        Err(e) => {
            error!("Error while opening site evidence file: {}", e);
            std::process::exit(exitcode::IOERR);
        }
    };

    // this writer will write "in-order" provided we correctly pass the ordering of data to it
    let mut call_writer: OrderedCallWriter<File> = match OrderedCallWriter::new(&cli_settings.output_filename) {
        Ok(cw) => cw,
        Err(e) => {
            error!("Error during call writer creation: {}", e);
            std::process::exit(exitcode::IOERR);
        }
    };

    let mut call_summary: CallSummary = CallSummary::new();

    let start_time: Instant = Instant::now();
    let mut jobs_queued: u64 = 0;
    let mut results_received: u64 = 0;

    // values related to printing
    const UPDATE_SPEED: u64 = 10000;
    info!("Site genotyping starting...");

    if cli_settings.threads <= 1 {
        for record_result in site_reader.by_ref() {
            let record: SiteRecord = match record_result {
                Ok(r) => r,
                Err(e) => {
                    error!("Error while parsing site evidence file: {}", e);
                    std::process::exit(exitcode::IOERR);
                }
            };
            debug!("site {}: {}", record.index, record.site);
            jobs_queued += 1;

            let call_result = call_site(&record.evidence, &search_config);
            results_received += 1;
            process_result(
                (record.index, record.site, call_result),
                &mut call_writer, &mut call_summary
            );

            if results_received % UPDATE_SPEED == 0 {
                let time_so_far: f64 = start_time.elapsed().as_secs_f64();
                let sites_per_sec: f64 = results_received as f64 / time_so_far;
                info!("Received results for {} sites: {:.4} sites/sec", results_received, sites_per_sec);
            }
        }
    } else {
        //set up job configuration
        info!("Starting job pool with {} threads...", cli_settings.threads);
        let job_slots: u64 = 40 * cli_settings.threads as u64;

        //we need to set up the multiprocessing components now
        let pool = ThreadPool::new(cli_settings.threads);
        let (tx, rx) = mpsc::channel::<SiteResult>();

        for record_result in site_reader.by_ref() {
            // make sure no panics encountered so far
            if pool.panic_count() > 0 {
                error!("Panic detected in ThreadPool, check above for details.");
                std::process::exit(exitcode::SOFTWARE);
            }

            if jobs_queued - results_received >= job_slots {
                let site_result: SiteResult = receive_result(&rx);
                results_received += 1;
                process_result(site_result, &mut call_writer, &mut call_summary);

                if results_received % UPDATE_SPEED == 0 {
                    let time_so_far: f64 = start_time.elapsed().as_secs_f64();
                    let sites_per_sec: f64 = results_received as f64 / time_so_far;
                    info!("Received results for {} sites: {:.4} sites/sec, writer waiting on site {}", results_received, sites_per_sec, call_writer.get_wait_index());
                }
            }

            let record: SiteRecord = match record_result {
                Ok(r) => r,
                Err(e) => {
                    error!("Error while parsing site evidence file: {}", e);
                    std::process::exit(exitcode::IOERR);
                }
            };
            debug!("site {}: {}", record.index, record.site);

            jobs_queued += 1;
            if jobs_queued % UPDATE_SPEED == 0 {
                info!("Queued {} sites, latest site: {}", jobs_queued, record.site);
            }

            let tx = tx.clone();
            pool.execute(move|| {
                let call_result = call_site(&record.evidence, &search_config);
                tx.send((record.index, record.site, call_result)).expect("channel will be there waiting for the pool");
            });
        }

        while results_received < jobs_queued {
            // make sure no panics encountered so far
            if pool.panic_count() > 0 {
                error!("Panic detected in ThreadPool, check above for details.");
                std::process::exit(exitcode::SOFTWARE);
            }

            let site_result: SiteResult = receive_result(&rx);
            results_received += 1;
            process_result(site_result, &mut call_writer, &mut call_summary);

            // do an update if we're on the mod of our speed OR it's the last one for a thread
            if results_received % UPDATE_SPEED == 0 || (jobs_queued - results_received) < cli_settings.threads as u64 {
                let time_so_far: f64 = start_time.elapsed().as_secs_f64();
                let sites_per_sec: f64 = results_received as f64 / time_so_far;
                info!("Received results for {} / {} sites: {:.4} sites/sec, writer waiting on site {}", results_received, jobs_queued, sites_per_sec, call_writer.get_wait_index());
            }
        }
    }

    info!("All sites analyzed, finalizing output files...");
    if let Err(e) = call_writer.finalize() {
        error!("Error while finalizing call file: {}", e);
        std::process::exit(exitcode::IOERR);
    }

    if let Some(ref filename) = cli_settings.summary_filename {
        info!("Saving call summary to {:?}...", filename);
        match call_summary.write_summary(filename) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while writing summary file: {}", e);
                std::process::exit(exitcode::IOERR);
            }
        };
    }

    if call_summary.num_skipped() > 0 {
        warn!("Skipped {} sites with no treatment reads.", call_summary.num_skipped());
    }
    info!("Called {} of {} sites.", call_summary.num_called(), call_summary.num_sites());
    info!("Total time: {:.4} seconds", start_time.elapsed().as_secs_f64());
    info!("Process finished successfully.");
}

/// Blocks until a worker reports back, exiting if every sender is gone
fn receive_result(rx: &mpsc::Receiver<SiteResult>) -> SiteResult {
    match rx.recv() {
        Ok(r) => r,
        Err(e) => {
            error!("Worker channel closed before all sites were reported: {}", e);
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

/// Handles a finished site: sites without treatment reads are written as skipped, any other error is fatal
/// # Arguments
/// * `site_result` - the index, label, and call result for a site
/// * `call_writer` - the ordered writer for the call table
/// * `call_summary` - collects run totals
fn process_result(
    site_result: SiteResult,
    call_writer: &mut OrderedCallWriter<File>,
    call_summary: &mut CallSummary
) {
    let (index, site, call_result) = site_result;
    let opt_call: Option<SiteCall> = match call_result {
        Ok(call) => {
            call_summary.add_call(&call);
            Some(call)
        },
        Err(ModelError::EmptyTreatment) => {
            debug!("Skipping site {} ({}), no treatment reads", index, site);
            call_summary.add_skipped();
            None
        },
        Err(e) => {
            error!("Error while processing site {} ({}):", index, site);
            error!("  {}", e);
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    match call_writer.write_call(index, site, opt_call) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while writing call file: {}", e);
            std::process::exit(exitcode::IOERR);
        }
    };
}
