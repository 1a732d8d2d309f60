
/*!
The three genotype models scored at a site from treatment and control read evidence.
Each returns a log likelihood and a BIC with a per-model penalty for the free parameters it fits.
*/

use crate::data_types::model_result::{HeterAsResult, ModelError, ModelResult};
use crate::data_types::read_evidence::{GroupEvidence, SiteEvidence};
use crate::greedy_search::{AsFit, NoAsFit, SearchConfig, greedy_max_as, greedy_max_no_as};
use crate::likelihood::{phred_to_ln_correct_prob, phred_to_ln_error_prob};

use log::debug;

/// Log likelihood of a group under the homozygous-top1 model: every top1 read is a correct call and every top2 read is an error.
fn homozygous_group_ln(group: &GroupEvidence) -> f64 {
    let correct: f64 = group.top1_quals().iter().map(|&q| phred_to_ln_correct_prob(q)).sum();
    let errors: f64 = group.top2_quals().iter().map(|&q| phred_to_ln_error_prob(q)).sum();
    correct + errors
}

/// Scores the homozygous (top1) model. There is no free parameter, so `BIC = -2 * lnL`.
/// Pass `site.swapped()` to score homozygous top2 instead.
/// # Arguments
/// * `site` - the treatment and control evidence
pub fn cal_model_homo(site: &SiteEvidence) -> ModelResult {
    let ln_l: f64 = homozygous_group_ln(site.treatment()) + homozygous_group_ln(site.control());
    let result = ModelResult::new(ln_l, -2.0 * ln_l);
    debug!("homo: {result:?}");
    result
}

/// Scores the heterozygous model without allele-specific bias, both groups fitted at a 0.5 ratio.
/// Each non-empty group adds `ln(tn)` to the BIC for its fitted `k`.
/// # Arguments
/// * `site` - the treatment and control evidence, control may be empty
/// * `config` - search settings
/// # Errors
/// * `ModelError::EmptyTreatment` if there are no treatment reads
/// * any error from the greedy search
pub fn cal_model_heter_no_as(site: &SiteEvidence, config: &SearchConfig) -> Result<ModelResult, ModelError> {
    let treatment: &GroupEvidence = site.treatment();
    if treatment.is_empty() {
        return Err(ModelError::EmptyTreatment);
    }
    let tn_t: usize = treatment.total();
    let treat_fit: NoAsFit = greedy_max_no_as(treatment.top1_quals(), treatment.top2_quals(), config)?;
    let mut ln_l: f64 = treat_fit.log_likelihood;
    let mut bic: f64 = -2.0 * treat_fit.log_likelihood + (tn_t as f64).ln();

    if let Some(control_fit) = fit_control(site.control(), config)? {
        let tn_c: usize = site.control().total();
        ln_l += control_fit.log_likelihood;
        bic += -2.0 * control_fit.log_likelihood + (tn_c as f64).ln();
    }

    let result = ModelResult::new(ln_l, bic);
    debug!("heter_noAS: {result:?}, k_T={}", treat_fit.k);
    Ok(result)
}

/// Scores the heterozygous model with allele-specific bias.
/// The treatment fits both `k` and the ratio (`2 * ln(tn_T)` penalty); control is assumed unbiased and fitted at 0.5 (`ln(tn_C)`).
/// # Arguments
/// * `site` - the treatment and control evidence, control may be empty
/// * `config` - search settings, including the allowed ratio band
/// # Errors
/// * `ModelError::EmptyTreatment` if there are no treatment reads
/// * any error from the greedy searches
pub fn cal_model_heter_as(site: &SiteEvidence, config: &SearchConfig) -> Result<HeterAsResult, ModelError> {
    let treatment: &GroupEvidence = site.treatment();
    if treatment.is_empty() {
        return Err(ModelError::EmptyTreatment);
    }
    let tn_t: usize = treatment.total();
    let treat_fit: AsFit = greedy_max_as(treatment.top1_quals(), treatment.top2_quals(), config)?;
    let mut ln_l: f64 = treat_fit.log_likelihood;
    let mut bic: f64 = -2.0 * treat_fit.log_likelihood + 2.0 * (tn_t as f64).ln();

    if let Some(control_fit) = fit_control(site.control(), config)? {
        let tn_c: usize = site.control().total();
        ln_l += control_fit.log_likelihood;
        bic += -2.0 * control_fit.log_likelihood + (tn_c as f64).ln();
    }

    let result = HeterAsResult {
        model: ModelResult::new(ln_l, bic),
        treatment_k: treat_fit.k,
        allele_ratio: treat_fit.allele_ratio
    };
    debug!("heter_AS: {result:?}");
    Ok(result)
}

/// Fits the control group at a 0.5 ratio, or returns None when it has no reads
fn fit_control(control: &GroupEvidence, config: &SearchConfig) -> Result<Option<NoAsFit>, ModelError> {
    if control.is_empty() {
        Ok(None)
    } else {
        Ok(Some(greedy_max_no_as(control.top1_quals(), control.top2_quals(), config)?))
    }
}
