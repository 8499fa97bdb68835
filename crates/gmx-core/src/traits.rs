//! Core traits for gmx
//!
//! This module defines the trait seam between density models and the
//! optimizers/samplers that consume them: high-level fitting logic depends
//! on [`LogDensity`], not on a concrete model type.

use crate::{Error, Result};

/// A scalar log-density over `ℝ^D`.
pub trait LogDensity: Send + Sync {
    /// Dimensionality `D` of the support.
    fn dim(&self) -> usize;

    /// Evaluate `log p(x)` at a single point of length `dim()`.
    fn log_density(&self, x: &[f64]) -> Result<f64>;

    /// Evaluate `log p` for a row-major batch of points.
    ///
    /// `xs` must have length `out.len() * dim()`; one scalar is written per
    /// batch row. Implementations may parallelize; the default evaluates
    /// rows sequentially.
    fn log_density_batch(&self, xs: &[f64], out: &mut [f64]) -> Result<()> {
        let d = self.dim();
        if xs.len() != out.len() * d {
            return Err(Error::DimensionMismatch { expected: out.len() * d, got: xs.len() });
        }
        for (row, o) in xs.chunks_exact(d).zip(out.iter_mut()) {
            *o = self.log_density(row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Standard normal in 1D, enough to exercise the default batch path.
    struct UnitNormal;

    impl LogDensity for UnitNormal {
        fn dim(&self) -> usize {
            1
        }

        fn log_density(&self, x: &[f64]) -> Result<f64> {
            Ok(-0.5 * x[0] * x[0] - 0.5 * (2.0 * std::f64::consts::PI).ln())
        }
    }

    #[test]
    fn test_default_batch_matches_scalar() {
        let m = UnitNormal;
        let xs = [0.0, 1.0, -2.5];
        let mut out = [0.0f64; 3];
        m.log_density_batch(&xs, &mut out).unwrap();
        for (x, lp) in xs.iter().zip(out.iter()) {
            assert!((m.log_density(&[*x]).unwrap() - lp).abs() < 1e-15);
        }
    }

    #[test]
    fn test_default_batch_length_mismatch() {
        let m = UnitNormal;
        let mut out = [0.0f64; 2];
        assert!(m.log_density_batch(&[1.0, 2.0, 3.0], &mut out).is_err());
    }
}
