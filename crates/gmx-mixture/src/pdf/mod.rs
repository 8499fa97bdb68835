//! Mixture component densities.

use gmx_core::Result;
use rand::RngCore;

mod diag_gaussian;

pub use diag_gaussian::DiagGaussian;

/// Trait for densities usable as mixture components.
///
/// A [`crate::GaussianMixture`] holds its components as shared trait objects:
/// it composes them polymorphically without owning their parameter storage
/// (an external trainable-parameter store is the true owner).
pub trait MixtureComponent: Send + Sync {
    /// Dimensionality `D` of the support.
    fn dim(&self) -> usize;

    /// Number of trainable parameters for this component.
    fn n_params(&self) -> usize;

    /// The component mean (length `dim()`).
    fn mean(&self) -> &[f64];

    /// Evaluate the negative log-density at `x` (length `dim()`).
    fn neg_log_density(&self, x: &[f64]) -> Result<f64>;

    /// Evaluate the negative log-density and its gradient w.r.t. the
    /// component's flat parameter vector.
    ///
    /// `out_grad` must have length `n_params()`.
    fn neg_log_density_grad(&self, x: &[f64], out_grad: &mut [f64]) -> Result<f64>;

    /// Draw one sample from the component density.
    fn sample(&self, rng: &mut dyn RngCore) -> Result<Vec<f64>>;
}
