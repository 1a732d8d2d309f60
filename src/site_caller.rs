
use crate::data_types::model_result::{GenotypeModel, HeterAsResult, ModelError, ModelResult};
use crate::data_types::read_evidence::SiteEvidence;
use crate::genotype_models::{cal_model_heter_as, cal_model_heter_no_as, cal_model_homo};
use crate::greedy_search::SearchConfig;
use crate::quality_scores::{calculate_gq, calculate_gq_heter_as_sig};

use log::debug;
use strum::IntoEnumIterator;

/// Every model score at a site along with the selected model and its confidence values.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteCall {
    /// The model with the lowest BIC
    pub model: GenotypeModel,
    /// Homozygous for top1
    pub homo_major: ModelResult,
    /// Homozygous for top2
    pub homo_minor: ModelResult,
    /// Heterozygous at a 1:1 ratio
    pub heter_no_as: ModelResult,
    /// Heterozygous at a fitted ratio
    pub heter_as: HeterAsResult,
    /// Genotype quality of the selected model
    pub gq: u8,
    /// Confidence that the allele-specific bias is real
    pub as_sig: u8
}

impl SiteCall {
    /// Returns the score for any of the models
    pub fn result(&self, model: GenotypeModel) -> ModelResult {
        match model {
            GenotypeModel::HomozygousMajor => self.homo_major,
            GenotypeModel::HomozygousMinor => self.homo_minor,
            GenotypeModel::HeterozygousNoAs => self.heter_no_as,
            GenotypeModel::HeterozygousAs => self.heter_as.model
        }
    }

    /// The fitted treatment top1 ratio from the allele-specific model
    pub fn allele_ratio(&self) -> f64 {
        self.heter_as.allele_ratio
    }

    pub fn is_heterozygous(&self) -> bool {
        !self.model.is_homozygous()
    }

    /// The lower-BIC of the two homozygous models; ties go to top1
    fn best_homozygous(&self) -> GenotypeModel {
        if self.homo_minor.bic < self.homo_major.bic {
            GenotypeModel::HomozygousMinor
        } else {
            GenotypeModel::HomozygousMajor
        }
    }
}

/// Scores a site against every genotype model and selects the one with the minimum BIC.
/// The genotype quality compares the selected model against the other two of {best homozygous, heter_noAS, heter_AS}.
/// # Arguments
/// * `site` - the read evidence; treatment reads are required
/// * `config` - search settings
/// # Errors
/// * `ModelError::EmptyTreatment` if there are no treatment reads
/// * any error from the greedy searches
pub fn call_site(site: &SiteEvidence, config: &SearchConfig) -> Result<SiteCall, ModelError> {
    let homo_major: ModelResult = cal_model_homo(site);
    let homo_minor: ModelResult = cal_model_homo(&site.swapped());
    let heter_no_as: ModelResult = cal_model_heter_no_as(site, config)?;
    let heter_as: HeterAsResult = cal_model_heter_as(site, config)?;

    let mut call = SiteCall {
        model: GenotypeModel::HomozygousMajor,
        homo_major,
        homo_minor,
        heter_no_as,
        heter_as,
        gq: 0,
        as_sig: 0
    };

    // strict less-than keeps the earlier model on a tie
    for model in GenotypeModel::iter() {
        if call.result(model).bic < call.result(call.model).bic {
            call.model = model;
        }
    }

    let ln_l_homo: f64 = call.result(call.best_homozygous()).log_likelihood;
    let ln_l_no_as: f64 = heter_no_as.log_likelihood;
    let ln_l_as: f64 = heter_as.model.log_likelihood;
    call.gq = match call.model {
        GenotypeModel::HomozygousMajor | GenotypeModel::HomozygousMinor => {
            calculate_gq(call.result(call.model).log_likelihood, ln_l_no_as, ln_l_as)
        },
        GenotypeModel::HeterozygousNoAs => calculate_gq(ln_l_no_as, ln_l_homo, ln_l_as),
        GenotypeModel::HeterozygousAs => calculate_gq(ln_l_as, ln_l_homo, ln_l_no_as)
    };
    call.as_sig = calculate_gq_heter_as_sig(ln_l_as, ln_l_no_as);

    debug!("call_site: {} GQ={} AS_sig={} ratio={}", call.model, call.gq, call.as_sig, call.allele_ratio());
    Ok(call)
}
