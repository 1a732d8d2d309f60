
/// Failures raised while fitting or configuring the genotype models
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("treatment reads required, total number of treatment reads is 0")]
    EmptyTreatment,
    #[error("error in {search}: neither k={k} nor its neighbors dominate")]
    SearchInconsistency { search: &'static str, k: usize },
    #[error("max_allowed_ratio must be in (0.5, 1.0), got {0}")]
    InvalidMaxAllowedRatio(f64),
    #[error("tolerance must be finite and >= 0, got {0}")]
    InvalidTolerance(f64)
}

/// The score of one genotype model at a site.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModelResult {
    /// Natural log likelihood of the evidence under the fitted model
    pub log_likelihood: f64,
    /// Bayesian information criterion, `-2 * lnL + penalty`; lower is better
    pub bic: f64
}

impl ModelResult {
    pub fn new(log_likelihood: f64, bic: f64) -> ModelResult {
        ModelResult {
            log_likelihood,
            bic
        }
    }
}

/// Result of the heterozygous model with allele-specific bias.
/// The fitted values are reported only, they do not take part in model selection beyond the BIC.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeterAsResult {
    /// The combined treatment + control score
    pub model: ModelResult,
    /// The fitted number of treatment reads supporting top1
    pub treatment_k: usize,
    /// The fitted top1 allele ratio in the treatment, always inside the clamp band
    pub allele_ratio: f64
}

/// The genotype models a site is scored against.
/// The declaration order is the tie-break order when two BIC values are identical.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, strum_macros::Display, strum_macros::EnumCount, strum_macros::EnumIter, strum_macros::FromRepr)]
pub enum GenotypeModel {
    /// All reads truly carry top1, anything else is a sequencing error
    #[strum(serialize = "homo_major")]
    HomozygousMajor=0,
    /// All reads truly carry top2
    #[strum(serialize = "homo_minor")]
    HomozygousMinor,
    /// Both alleles present at an even 1:1 ratio
    #[strum(serialize = "heter_noAS")]
    HeterozygousNoAs,
    /// Both alleles present at a fitted, possibly skewed ratio
    #[strum(serialize = "heter_AS")]
    HeterozygousAs
}

impl GenotypeModel {
    pub fn is_homozygous(&self) -> bool {
        matches!(self, GenotypeModel::HomozygousMajor | GenotypeModel::HomozygousMinor)
    }
}
