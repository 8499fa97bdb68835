use crate::math::LN_2PI;
use crate::pdf::MixtureComponent;
use gmx_core::{Error, Result};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};

/// Multivariate normal with diagonal covariance.
///
/// Parameterized by a single flat vector of length `2·D`: the first half is
/// the mean, the second half the per-dimension log standard deviation.
/// Standard deviations are recovered as `exp(log_std)` on demand (never
/// stored), so they are strictly positive by construction.
///
/// Known numerical edge case: an extremely negative `log_std` entry makes
/// `exp(log_std)` underflow toward zero. That is not treated as an error
/// here; mixture-level evaluation stays finite because aggregation happens
/// in the log domain.
#[derive(Debug, Clone)]
pub struct DiagGaussian {
    flat: Vec<f64>,
    dim: usize,
}

impl DiagGaussian {
    /// Create a component from a flat parameter vector `mean ‖ log_std`.
    ///
    /// Fails with [`Error::InvalidParameterShape`] if the length is odd,
    /// shorter than 2, or contains non-finite entries.
    pub fn new(flat: Vec<f64>) -> Result<Self> {
        if flat.len() < 2 || flat.len() % 2 != 0 {
            return Err(Error::InvalidParameterShape(format!(
                "flat parameter vector must have even length >= 2, got {}",
                flat.len()
            )));
        }
        if let Some(v) = flat.iter().find(|v| !v.is_finite()) {
            return Err(Error::InvalidParameterShape(format!(
                "flat parameter vector must be finite, got {v}"
            )));
        }
        let dim = flat.len() / 2;
        Ok(Self { flat, dim })
    }

    /// The flat parameter vector this component was built from, unchanged.
    pub fn flat_params(&self) -> &[f64] {
        &self.flat
    }

    /// The per-dimension log standard deviations (second half of the flat vector).
    pub fn log_std(&self) -> &[f64] {
        &self.flat[self.dim..]
    }

    /// The mode of the density. For a Gaussian this is exactly the mean.
    pub fn mode(&self) -> &[f64] {
        self.mean()
    }

    /// Evaluate the negative log-density for a row-major batch of points.
    ///
    /// `xs` must have length `out.len() * dim()`; the reduction runs over the
    /// trailing (feature) axis only, producing one scalar per row.
    pub fn neg_log_density_batch(&self, xs: &[f64], out: &mut [f64]) -> Result<()> {
        if xs.len() != out.len() * self.dim {
            return Err(Error::DimensionMismatch {
                expected: out.len() * self.dim,
                got: xs.len(),
            });
        }
        for (row, o) in xs.chunks_exact(self.dim).zip(out.iter_mut()) {
            *o = self.neg_log_density(row)?;
        }
        Ok(())
    }

    fn check_dim(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, got: x.len() });
        }
        Ok(())
    }
}

impl MixtureComponent for DiagGaussian {
    fn dim(&self) -> usize {
        self.dim
    }

    fn n_params(&self) -> usize {
        self.flat.len()
    }

    fn mean(&self) -> &[f64] {
        &self.flat[..self.dim]
    }

    /// `0.5·Σ z_i² + 0.5·D·ln(2π) + Σ log_std_i` with `z_i = (x_i − μ_i)/σ_i`.
    ///
    /// The `Σ log_std_i` term uses the stored log-std directly rather than
    /// `ln(exp(log_std))`, skipping a redundant log-of-exp round trip.
    fn neg_log_density(&self, x: &[f64]) -> Result<f64> {
        self.check_dim(x)?;
        let (mean, log_std) = (self.mean(), self.log_std());
        let mut quad = 0.0;
        let mut log_std_sum = 0.0;
        for i in 0..self.dim {
            let z = (x[i] - mean[i]) * (-log_std[i]).exp();
            quad += z * z;
            log_std_sum += log_std[i];
        }
        Ok(0.5 * quad + 0.5 * self.dim as f64 * LN_2PI + log_std_sum)
    }

    fn neg_log_density_grad(&self, x: &[f64], out_grad: &mut [f64]) -> Result<f64> {
        self.check_dim(x)?;
        if out_grad.len() != self.flat.len() {
            return Err(Error::DimensionMismatch {
                expected: self.flat.len(),
                got: out_grad.len(),
            });
        }
        let (mean, log_std) = (self.mean(), self.log_std());
        let mut quad = 0.0;
        let mut log_std_sum = 0.0;
        for i in 0..self.dim {
            let inv_std = (-log_std[i]).exp();
            let z = (x[i] - mean[i]) * inv_std;
            quad += z * z;
            log_std_sum += log_std[i];
            // d nll / d mean_i, d nll / d log_std_i
            out_grad[i] = -z * inv_std;
            out_grad[self.dim + i] = 1.0 - z * z;
        }
        Ok(0.5 * quad + 0.5 * self.dim as f64 * LN_2PI + log_std_sum)
    }

    /// Reparameterized draw `μ + σ ⊙ ε` with `ε ~ N(0, I)`.
    fn sample(&self, rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        let (mean, log_std) = (self.mean(), self.log_std());
        let mut out = Vec::with_capacity(self.dim);
        for i in 0..self.dim {
            let eps: f64 = StandardNormal.sample(rng);
            out.push(mean[i] + log_std[i].exp() * eps);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_new_rejects_odd_length() {
        assert!(matches!(
            DiagGaussian::new(vec![0.0, 1.0, 2.0]),
            Err(Error::InvalidParameterShape(_))
        ));
        assert!(DiagGaussian::new(vec![]).is_err());
    }

    #[test]
    fn test_new_rejects_non_finite() {
        assert!(DiagGaussian::new(vec![0.0, f64::NAN]).is_err());
        assert!(DiagGaussian::new(vec![f64::INFINITY, 0.0]).is_err());
    }

    #[test]
    fn test_flat_params_round_trip() {
        let flat = vec![0.2, -1.1, 3.0, -0.4, 0.1, -2.0];
        let g = DiagGaussian::new(flat.clone()).unwrap();
        assert_eq!(g.flat_params(), flat.as_slice());
        assert_eq!(g.dim(), 3);
        assert_eq!(g.mean(), &flat[..3]);
        assert_eq!(g.log_std(), &flat[3..]);
    }

    #[test]
    fn test_mode_is_mean() {
        let g = DiagGaussian::new(vec![1.5, -0.5, 0.0, 0.0]).unwrap();
        assert_eq!(g.mode(), &[1.5, -0.5]);
    }

    #[test]
    fn test_nll_at_mean_is_normalization_only() {
        // The quadratic term vanishes at the mean, leaving
        // 0.5·D·ln(2π) + Σ log_std exactly.
        let mean = [0.7, -0.3, 2.0];
        let log_std = [-1.0, 0.5, -2.3];
        let mut flat = mean.to_vec();
        flat.extend_from_slice(&log_std);
        let g = DiagGaussian::new(flat).unwrap();

        let nll = g.neg_log_density(&mean).unwrap();
        let expected = 0.5 * 3.0 * LN_2PI + log_std.iter().sum::<f64>();
        assert!((nll - expected).abs() < 1e-15);
    }

    #[test]
    fn test_nll_permutation_invariant() {
        let g = DiagGaussian::new(vec![0.1, 0.2, 0.3, -0.5, 0.4, -1.2]).unwrap();
        let a = g.neg_log_density(&[1.0, 2.0, 3.0]).unwrap();

        // Permute dimensions consistently across x, mean, log_std.
        let p = DiagGaussian::new(vec![0.3, 0.1, 0.2, -1.2, -0.5, 0.4]).unwrap();
        let b = p.neg_log_density(&[3.0, 1.0, 2.0]).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_nll_dimension_mismatch() {
        let g = DiagGaussian::new(vec![0.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(matches!(
            g.neg_log_density(&[1.0]),
            Err(Error::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_batch_matches_scalar() {
        let g = DiagGaussian::new(vec![0.5, -0.5, -0.2, 0.3]).unwrap();
        let xs = [0.0, 0.0, 1.0, -1.0, 0.5, -0.5];
        let mut out = [0.0f64; 3];
        g.neg_log_density_batch(&xs, &mut out).unwrap();
        for (row, o) in xs.chunks_exact(2).zip(out.iter()) {
            assert!((g.neg_log_density(row).unwrap() - o).abs() < 1e-15);
        }
    }

    #[test]
    fn test_batch_length_mismatch() {
        let g = DiagGaussian::new(vec![0.0, 0.0]).unwrap();
        let mut out = [0.0f64; 2];
        assert!(g.neg_log_density_batch(&[1.0, 2.0, 3.0], &mut out).is_err());
    }

    #[test]
    fn test_sample_is_mean_shifted_scaled_noise() {
        // With a tiny sigma every draw hugs the mean.
        let g = DiagGaussian::new(vec![5.0, -3.0, -20.0, -20.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let s = g.sample(&mut rng).unwrap();
            assert_eq!(s.len(), 2);
            assert!((s[0] - 5.0).abs() < 1e-6);
            assert!((s[1] + 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sample_moments() {
        let g = DiagGaussian::new(vec![1.0, 0.0]).unwrap(); // N(1, 1)
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for _ in 0..n {
            let s = g.sample(&mut rng).unwrap()[0];
            sum += s;
            sum_sq += s * s;
        }
        let mean = sum / n as f64;
        let var = sum_sq / n as f64 - mean * mean;
        // 5σ-ish tolerances for 20k draws.
        assert!((mean - 1.0).abs() < 0.04, "empirical mean {mean}");
        assert!((var - 1.0).abs() < 0.06, "empirical variance {var}");
    }
}
