
/*!
Phred-style quality scores derived from the relative likelihoods of competing models.
*/

/// Scales a natural log into a Phred-like value, `-10 / ln(10)`
const PHRED_SCALE: f64 = -4.34294;
/// Relative likelihoods are floored here so the scores never see a 0 or an underflow
const MIN_RELATIVE_LIKELIHOOD: f64 = 1e-110;
/// Largest reportable quality
pub const MAX_QUALITY: u8 = 255;

/// Likelihood of a model relative to the reference model, clamped into `[1e-110, 1]`.
/// Two impossible models (both `-inf`) are equal; any other NaN difference is floored.
#[inline]
fn relative_likelihood(ln_l: f64, ln_l_reference: f64) -> f64 {
    let ln_ratio: f64 = ln_l - ln_l_reference;
    if ln_ratio.is_nan() {
        if ln_l == f64::NEG_INFINITY && ln_l_reference == f64::NEG_INFINITY {
            1.0
        } else {
            MIN_RELATIVE_LIKELIHOOD
        }
    } else {
        ln_ratio.exp().clamp(MIN_RELATIVE_LIKELIHOOD, 1.0)
    }
}

/// Converts the probability mass not on the reference model into a capped Phred score
fn mass_to_quality(other_mass: f64) -> u8 {
    if other_mass > MIN_RELATIVE_LIKELIHOOD {
        let score: f64 = (PHRED_SCALE * other_mass.ln()).round();
        score.clamp(0.0, MAX_QUALITY as f64) as u8
    } else {
        MAX_QUALITY
    }
}

/// Genotype quality of model 1 against models 2 and 3: `-10 * log10((L2 + L3) / (L1 + L2 + L3))`,
/// with every likelihood taken relative to model 1 and clamped to at most 1.
/// # Arguments
/// * `ln_l1` - log likelihood of the model being scored (usually the selected one)
/// * `ln_l2` - log likelihood of the first alternative
/// * `ln_l3` - log likelihood of the second alternative
pub fn calculate_gq(ln_l1: f64, ln_l2: f64, ln_l3: f64) -> u8 {
    let l2: f64 = relative_likelihood(ln_l2, ln_l1);
    let l3: f64 = relative_likelihood(ln_l3, ln_l1);
    mass_to_quality((l2 + l3) / (1.0 + l2 + l3))
}

/// Confidence that model 1 (allele-specific) beats model 2 (no allele-specific bias), `-10 * log10(L2 / (L1 + L2))`.
/// # Arguments
/// * `ln_l1` - log likelihood of the heterozygous model with allele-specific bias
/// * `ln_l2` - log likelihood of the heterozygous model without it
pub fn calculate_gq_heter_as_sig(ln_l1: f64, ln_l2: f64) -> u8 {
    let l2: f64 = relative_likelihood(ln_l2, ln_l1);
    mass_to_quality(l2 / (1.0 + l2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_likelihoods() {
        // (L2 + L3) / (1 + L2 + L3) = 2/3
        let expected = (PHRED_SCALE * (2.0_f64 / 3.0).ln()).round() as u8;
        assert_eq!(expected, 2);
        assert_eq!(calculate_gq(0.0, 0.0, 0.0), expected);
        assert_eq!(calculate_gq(-5.0, -5.0, -5.0), expected);

        // L2 / (1 + L2) = 1/2
        assert_eq!(calculate_gq_heter_as_sig(-12.5, -12.5), 3);
    }

    #[test]
    fn test_alternatives_better() {
        // alternatives above model 1 are clamped to 1, so this is the same as the equal case
        assert_eq!(calculate_gq(-10.0, 0.0, 0.0), 2);
        assert_eq!(calculate_gq_heter_as_sig(-10.0, 0.0), 3);
    }

    #[test]
    fn test_reference_values() {
        // skewed site: heter_AS against homo and heter_noAS
        assert_eq!(calculate_gq(-26.987583855708845, -69.11757280316472, -32.15783822018663), 22);
        assert_eq!(calculate_gq_heter_as_sig(-26.987583855708845, -32.15783822018663), 22);
        assert_eq!(calculate_gq_heter_as_sig(0.0, -20.0), 87);
    }

    #[test]
    fn test_saturation() {
        assert_eq!(calculate_gq(0.0, -300.0, -300.0), MAX_QUALITY);
        assert_eq!(calculate_gq(0.0, -1e6, f64::NEG_INFINITY), MAX_QUALITY);
        assert_eq!(calculate_gq_heter_as_sig(0.0, -300.0), MAX_QUALITY);
        assert_eq!(calculate_gq_heter_as_sig(0.0, f64::NEG_INFINITY), MAX_QUALITY);
    }

    #[test]
    fn test_worst_model_floor() {
        // when model 1 is no better than either alternative, the score bottoms out at the equal case
        let values = [0.0, -0.5, -1.0, -3.0, -10.0, -55.5, -120.0, -400.0, 15.0];
        for &a in values.iter() {
            for &b in values.iter() {
                if a <= b {
                    assert_eq!(calculate_gq_heter_as_sig(a, b), 3);
                }
                for &c in values.iter() {
                    if a <= b && a <= c {
                        assert_eq!(calculate_gq(a, b, c), 2);
                    }
                }
            }
        }
    }

    #[test]
    fn test_impossible_models() {
        // -inf against -inf is an even split, not an underflow
        assert_eq!(calculate_gq_heter_as_sig(f64::NEG_INFINITY, f64::NEG_INFINITY), 3);
        assert_eq!(calculate_gq(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY), 2);
        assert_eq!(calculate_gq(f64::NEG_INFINITY, 0.0, f64::NEG_INFINITY), 2);
        assert_eq!(calculate_gq(0.0, f64::NEG_INFINITY, f64::NEG_INFINITY), MAX_QUALITY);

        // a NaN alternative is floored like an impossible one
        assert_eq!(calculate_gq_heter_as_sig(0.0, f64::NAN), calculate_gq_heter_as_sig(0.0, f64::NEG_INFINITY));
    }

    #[test]
    fn test_monotonic() {
        // a larger gap to the alternatives never lowers the score
        let mut last = 0;
        for gap in 0..60 {
            let gq = calculate_gq(0.0, -(gap as f64), -(gap as f64) - 1.0);
            assert!(gq >= last);
            last = gq;
        }
    }
}
