//! Small numerically-stable math utilities used across mixture code.

/// Natural log of `2π`.
pub const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// Stable `log(Σ exp(x_i))`.
///
/// Subtracts the running maximum before exponentiating so intermediate
/// magnitudes stay bounded. Empty input and all-`-inf` input both return
/// `NEG_INFINITY` (an empty mixture term sum has zero mass).
#[inline]
pub fn logsumexp(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NEG_INFINITY;
    }
    let mut m = f64::NEG_INFINITY;
    for &x in xs {
        if x > m {
            m = x;
        }
    }
    if !m.is_finite() {
        return m;
    }
    let mut s = 0.0;
    for &x in xs {
        s += (x - m).exp();
    }
    m + s.ln()
}

/// Stable softmax: normalize unconstrained logits into a probability vector.
///
/// `softmax(z)_k = exp(z_k - max(z)) / Σ_j exp(z_j - max(z))`.
///
/// This is the boundary transform that turns raw trainable mixing logits
/// into the weight vector a mixture consumes. Returns an empty vector for
/// empty input.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    if logits.is_empty() {
        return Vec::new();
    }
    let m = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut out: Vec<f64> = logits.iter().map(|&z| (z - m).exp()).collect();
    let s: f64 = out.iter().sum();
    for w in &mut out {
        *w /= s;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logsumexp_matches_naive_moderate_values() {
        let xs: [f64; 4] = [-2.0, 0.3, 1.7, -0.5];
        let naive: f64 = xs.iter().map(|x| x.exp()).sum::<f64>().ln();
        assert!((logsumexp(&xs) - naive).abs() < 1e-12);
    }

    #[test]
    fn test_logsumexp_is_finite_extremes() {
        // Naive exponentiation overflows (+inf) or underflows (0 → ln gives -inf).
        let expected = 1.0 + (-1.0f64).exp().ln_1p();
        let hi = logsumexp(&[1000.0, 999.0]);
        assert!(hi.is_finite());
        assert!((hi - 999.0 - expected).abs() < 1e-12);
        let lo = logsumexp(&[-1000.0, -1001.0]);
        assert!(lo.is_finite());
        assert!((lo + 1001.0 - expected).abs() < 1e-12);
    }

    #[test]
    fn test_logsumexp_empty_and_neg_inf() {
        assert_eq!(logsumexp(&[]), f64::NEG_INFINITY);
        assert_eq!(logsumexp(&[f64::NEG_INFINITY; 3]), f64::NEG_INFINITY);
    }

    #[test]
    fn test_logsumexp_single_term() {
        assert!((logsumexp(&[-3.25]) + 3.25).abs() < 1e-15);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let w = softmax(&[0.1, -1.3, 2.2, 0.0]);
        let s: f64 = w.iter().sum();
        assert!((s - 1.0).abs() < 1e-12);
        assert!(w.iter().all(|&x| x > 0.0));
    }

    #[test]
    fn test_softmax_uniform_logits() {
        let w = softmax(&[5.0, 5.0, 5.0]);
        for &x in &w {
            assert!((x - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_softmax_shift_invariant_and_stable() {
        let a = softmax(&[1.0, 2.0, 3.0]);
        let b = softmax(&[1001.0, 1002.0, 1003.0]);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12);
            assert!(y.is_finite());
        }
    }
}
