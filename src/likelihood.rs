
/*!
Log-likelihood of a top1/top2 read split under a base-call error model.

A read with Phred score `q` is a miscall with probability `e = 10^(-q/10)`.
Given that `k` of the `tn` reads truly carry top1, a read observed as top1 has probability
`(1-e) * k/tn + e * (1 - k/tn)` and a read observed as top2 has the symmetric probability.
On top of this per-read term, the likelihood carries the binomial probability of drawing `k` top1
reads out of `tn` at a top1 rate `r`.
*/

use log::trace;

/// ln(10) / 10, converts a Phred score into the natural log of its error probability
pub const LN10_TENTH: f64 = std::f64::consts::LN_10 / 10.0;

/// Default upper bound on the top1 allele ratio, the lower bound is `1 - DEFAULT_MAX_ALLOWED_RATIO`
pub const DEFAULT_MAX_ALLOWED_RATIO: f64 = 0.99;

/// Natural log of the error probability for a Phred score.
#[inline]
pub fn phred_to_ln_error_prob(phred: u8) -> f64 {
    -(phred as f64) * LN10_TENTH
}

/// Error probability for a Phred score, `10^(-q/10)`.
#[inline]
pub fn phred_to_error_prob(phred: u8) -> f64 {
    phred_to_ln_error_prob(phred).exp()
}

/// Natural log of the probability that a base call is correct, `ln(1 - 10^(-q/10))`.
/// Phred 0 gives `-inf`.
#[inline]
pub fn phred_to_ln_correct_prob(phred: u8) -> f64 {
    (-phred_to_error_prob(phred)).ln_1p()
}

/// Clamps an allele ratio into `[1 - max_allowed_ratio, max_allowed_ratio]`.
/// # Arguments
/// * `r` - the ratio to clamp
/// * `max_allowed_ratio` - the upper bound, expected to be in (0.5, 1.0)
#[inline]
pub fn clamp_ratio(r: f64, max_allowed_ratio: f64) -> f64 {
    if r > max_allowed_ratio {
        max_allowed_ratio
    } else if r < 1.0 - max_allowed_ratio {
        1.0 - max_allowed_ratio
    } else {
        r
    }
}

/// Returns `ln(C(tn, k))` as a running sum of `ln((tn-i)/(k-i))`, never forming a factorial.
/// Uses the shorter side of the coefficient, and is 0 when `k` is 0 or `tn`.
/// # Arguments
/// * `tn` - total number of draws
/// * `k` - number of successes, must be `<= tn`
pub fn ln_binomial_coefficient(tn: usize, k: usize) -> f64 {
    assert!(k <= tn);
    if k == 0 || k == tn {
        return 0.0;
    }

    // 2*k <= tn is the integer form of k <= tn/2
    let short_side: usize = if 2 * k <= tn { k } else { tn - k };
    (0..short_side)
        .map(|i| ((tn - i) as f64 / (short_side - i) as f64).ln())
        .sum()
}

/// Calculates the log likelihood of `k` top1 reads out of `tn = m + n` reads given top1 ratio `r`,
/// combined with the per-read base quality error model.
/// `m` and `n` are the lengths of `top_quals` and `second_quals`.
/// # Arguments
/// * `top_quals` - Phred scores of the `m` reads observed as top1
/// * `second_quals` - Phred scores of the `n` reads observed as top2
/// * `r` - the assumed top1 ratio; outside the allowed band only the binomial term uses the band edge instead
/// * `k` - the assumed number of reads that truly carry top1, `0 <= k <= tn`
/// * `max_allowed_ratio` - the upper edge of the allowed ratio band
/// # Panics
/// * if `k > tn`
pub fn calculate_ln(top_quals: &[u8], second_quals: &[u8], r: f64, k: usize, max_allowed_ratio: f64) -> f64 {
    let tn: usize = top_quals.len() + second_quals.len();
    assert!(k <= tn, "k={k} cannot exceed tn={tn}");

    // binomial ratio term; an extreme r would otherwise send this to +-inf
    let r_used: f64 = clamp_ratio(r, max_allowed_ratio);
    let mut ln_l: f64 = k as f64 * r_used.ln() + (tn - k) as f64 * (1.0 - r_used).ln();

    // combinatorial term
    ln_l += ln_binomial_coefficient(tn, k);

    // per-read error mixture; tn > 0 whenever either loop runs
    let k_frac: f64 = k as f64 / tn as f64;
    for &q in top_quals.iter() {
        let e: f64 = phred_to_error_prob(q);
        ln_l += ((1.0 - e) * k_frac + e * (1.0 - k_frac)).ln();
    }
    for &q in second_quals.iter() {
        let e: f64 = phred_to_error_prob(q);
        ln_l += ((1.0 - e) * (1.0 - k_frac) + e * k_frac).ln();
    }

    trace!("calculate_ln(m={}, n={}, r={r}, k={k}) = {ln_l}", top_quals.len(), second_quals.len());
    ln_l
}
