//! # gmx-core
//!
//! Shared building blocks for the gmx Gaussian-mixture crates:
//!
//! - [`Error`] / [`Result`]: the common error taxonomy (all failures are
//!   local, synchronous validation errors; nothing is retried).
//! - [`traits::LogDensity`]: the generic scalar log-density surface that
//!   downstream optimizers are written against.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;

pub use error::{Error, Result};
