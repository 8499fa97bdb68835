//! # gmx-mixture
//!
//! Trainable diagonal-Gaussian mixture density.
//!
//! This crate provides:
//! - Numerically stable helpers ([`math::logsumexp`], [`math::softmax`]).
//! - [`DiagGaussian`]: a diagonal-covariance multivariate normal component
//!   parameterized by a flat `mean ‖ log_std` vector, with analytic
//!   gradients of its negative log-density.
//! - [`GaussianMixture`]: `K` components under learned mixing weights, with
//!   log-domain density aggregation, ancestral sampling, and analytic
//!   gradients w.r.t. every component parameter and weight, implementing
//!   [`gmx_core::traits::LogDensity`] so it can be driven by an external
//!   gradient-based optimizer.
//! - A versioned JSON model spec ([`spec`]) compiled into mixtures.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod math;
pub mod mixture;
pub mod pdf;
pub mod spec;

pub use mixture::{GaussianMixture, WEIGHT_TOLERANCE};
pub use pdf::{DiagGaussian, MixtureComponent};
