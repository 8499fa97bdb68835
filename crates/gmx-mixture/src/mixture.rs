//! Finite mixture of diagonal-Gaussian components with learned weights.

use crate::math::logsumexp;
use crate::pdf::MixtureComponent;
use gmx_core::traits::LogDensity;
use gmx_core::{Error, Result};
use rand::RngCore;
use rand::distr::{Distribution, StandardUniform};
use rayon::prelude::*;
use std::sync::Arc;

/// Tolerance for the mixing-weight normalization check at sampling time.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// A weighted combination of `K` component densities over a shared `ℝ^D`.
///
/// Components are held by reference (`Arc`); their parameter storage belongs
/// to whoever built them. Structural shape (`K`, `D`) is fixed for the
/// lifetime of the mixture.
pub struct GaussianMixture {
    components: Vec<Arc<dyn MixtureComponent>>,
    weights: Vec<f64>,
    dim: usize,
}

impl GaussianMixture {
    /// Create a mixture from components and a mixing-weight vector.
    ///
    /// Weights must be finite and non-negative; the sum-to-one check is
    /// deferred to [`GaussianMixture::sample`] because weights are typically
    /// recomputed from trainable logits between evaluations. Weight
    /// normalization itself (softmax of raw logits) belongs upstream — see
    /// [`crate::math::softmax`].
    pub fn new(components: Vec<Arc<dyn MixtureComponent>>, weights: Vec<f64>) -> Result<Self> {
        if components.is_empty() {
            return Err(Error::EmptyMixture);
        }
        if components.len() != weights.len() {
            return Err(Error::ComponentCountMismatch {
                components: components.len(),
                weights: weights.len(),
            });
        }
        let dim = components[0].dim();
        for c in &components[1..] {
            if c.dim() != dim {
                return Err(Error::DimensionMismatch { expected: dim, got: c.dim() });
            }
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::InvalidMixtureWeights(format!(
                "weights must be finite and non-negative, got {w}"
            )));
        }
        Ok(Self { components, weights, dim })
    }

    /// Number of components `K`.
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// Dimensionality `D` of the support.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The current mixing weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Total number of component parameters (excluding the weights),
    /// i.e. the length of the packed gradient written by
    /// [`GaussianMixture::log_density_grad`].
    pub fn n_params(&self) -> usize {
        self.components.iter().map(|c| c.n_params()).sum()
    }

    /// The mixture mean `Σ_k w_k · μ_k`.
    ///
    /// Exact for a mixture (the mean is linear in the components); no
    /// sampling involved.
    pub fn mean(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.dim];
        for (c, &w) in self.components.iter().zip(&self.weights) {
            for (o, &m) in out.iter_mut().zip(c.mean()) {
                *o += w * m;
            }
        }
        out
    }

    /// The mean of the highest-weighted component (lowest index wins ties).
    ///
    /// This approximates the mixture mode: when components overlap heavily
    /// the true mode can sit off every component center, so this is a
    /// documented approximation, not an exact optimum.
    pub fn mode(&self) -> &[f64] {
        let mut best = 0;
        for (k, &w) in self.weights.iter().enumerate().skip(1) {
            if w > self.weights[best] {
                best = k;
            }
        }
        self.components[best].mean()
    }

    /// Per-component log terms `ln w_k − nll_k(x)`; zero-weight components
    /// contribute `-inf` exactly as zero-yield processes do in an extended
    /// likelihood.
    fn log_terms(&self, x: &[f64], terms: &mut [f64]) -> Result<()> {
        for ((c, &w), t) in self.components.iter().zip(&self.weights).zip(terms.iter_mut()) {
            *t = if w > 0.0 { w.ln() - c.neg_log_density(x)? } else { f64::NEG_INFINITY };
        }
        Ok(())
    }

    /// Evaluate `log p(x) = log Σ_k w_k · p_k(x)` via stable log-sum-exp.
    ///
    /// Aggregation happens entirely in the log domain: each term is
    /// `ln w_k − nll_k(x)` and the reduction subtracts the running maximum
    /// before exponentiating. Naive weight-summing of exponentiated
    /// densities underflows or overflows once components get narrow or the
    /// dimension grows; this path stays finite.
    pub fn log_density(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, got: x.len() });
        }
        let mut terms = vec![0.0; self.components.len()];
        self.log_terms(x, &mut terms)?;
        Ok(logsumexp(&terms))
    }

    /// Evaluate `log p` for a row-major batch of points in parallel.
    ///
    /// `xs` must have length `out.len() * dim()`.
    pub fn log_density_batch(&self, xs: &[f64], out: &mut [f64]) -> Result<()> {
        if xs.len() != out.len() * self.dim {
            return Err(Error::DimensionMismatch {
                expected: out.len() * self.dim,
                got: xs.len(),
            });
        }
        out.par_iter_mut()
            .zip(xs.par_chunks_exact(self.dim))
            .try_for_each(|(o, row)| {
                *o = self.log_density(row)?;
                Ok(())
            })
    }

    /// Evaluate `log p(x)` and its gradient w.r.t. every component parameter
    /// and every mixing weight.
    ///
    /// - `out_param_grad` must have length [`GaussianMixture::n_params`];
    ///   per-component blocks are packed in component order, each laid out as
    ///   the component's own flat-parameter gradient.
    /// - `out_weight_grad` must have length `K`.
    ///
    /// Uses the responsibility weights `r_k = exp(term_k − log p)`:
    /// `∂ log p/∂θ_k = −r_k · ∂ nll_k/∂θ_k` and
    /// `∂ log p/∂w_k = p_k(x)/p(x)`.
    pub fn log_density_grad(
        &self,
        x: &[f64],
        out_param_grad: &mut [f64],
        out_weight_grad: &mut [f64],
    ) -> Result<f64> {
        if x.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, got: x.len() });
        }
        let n_comp = self.components.len();
        let total = self.n_params();
        if out_param_grad.len() != total {
            return Err(Error::DimensionMismatch { expected: total, got: out_param_grad.len() });
        }
        if out_weight_grad.len() != n_comp {
            return Err(Error::DimensionMismatch { expected: n_comp, got: out_weight_grad.len() });
        }

        let mut nlls = vec![0.0; n_comp];
        let mut offset = 0usize;
        for (k, c) in self.components.iter().enumerate() {
            let block = &mut out_param_grad[offset..offset + c.n_params()];
            nlls[k] = c.neg_log_density_grad(x, block)?;
            offset += c.n_params();
        }

        let terms: Vec<f64> = self
            .weights
            .iter()
            .zip(&nlls)
            .map(|(&w, &nll)| if w > 0.0 { w.ln() - nll } else { f64::NEG_INFINITY })
            .collect();
        let logp = logsumexp(&terms);

        offset = 0;
        for (k, c) in self.components.iter().enumerate() {
            // p_k(x)/p(x); well-defined (zero) even where w_k = 0.
            out_weight_grad[k] = (-nlls[k] - logp).exp();
            let r = (terms[k] - logp).exp();
            let block = &mut out_param_grad[offset..offset + c.n_params()];
            for g in block.iter_mut() {
                *g *= -r;
            }
            offset += c.n_params();
        }

        Ok(logp)
    }

    /// Draw one sample by ancestral sampling: pick a component from the
    /// categorical distribution over `weights` (inverse CDF over a uniform
    /// draw — a genuine stochastic choice, unlike [`GaussianMixture::mode`]),
    /// then sample from that component.
    ///
    /// Fails with [`Error::InvalidMixtureWeights`] if the weights do not sum
    /// to one within [`WEIGHT_TOLERANCE`]. Silent renormalization would mask
    /// an upstream training bug, so it is deliberately not performed.
    pub fn sample(&self, rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        let sum: f64 = self.weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::InvalidMixtureWeights(format!(
                "weights must sum to 1 within {WEIGHT_TOLERANCE}, got sum = {sum}"
            )));
        }
        let u: f64 = StandardUniform.sample(rng);
        let mut acc = 0.0;
        let mut chosen = self.components.len() - 1;
        for (k, &w) in self.weights.iter().enumerate() {
            acc += w;
            if u < acc {
                chosen = k;
                break;
            }
        }
        self.components[chosen].sample(rng)
    }
}

impl LogDensity for GaussianMixture {
    fn dim(&self) -> usize {
        self.dim
    }

    fn log_density(&self, x: &[f64]) -> Result<f64> {
        GaussianMixture::log_density(self, x)
    }

    fn log_density_batch(&self, xs: &[f64], out: &mut [f64]) -> Result<()> {
        GaussianMixture::log_density_batch(self, xs, out)
    }
}
