//! Mixture spec v0 parsing + compilation into a [`GaussianMixture`].
//!
//! This is the static-configuration boundary: an external parameter store
//! that persists component parameters and raw mixing logits as JSON can be
//! compiled straight into an evaluable model. Logits go through the
//! softmax boundary transform here — the mixture itself only ever sees a
//! materialized probability vector.

#![allow(missing_docs)]

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::math::softmax;
use crate::mixture::GaussianMixture;
use crate::pdf::{DiagGaussian, MixtureComponent};

pub const MIXTURE_SPEC_V0: &str = "gmx_mixture_spec_v0";

#[derive(Debug, Clone, Deserialize)]
pub struct MixtureSpecV0 {
    #[serde(rename = "$schema")]
    #[allow(dead_code)]
    pub schema_uri: Option<String>,
    pub schema_version: String,
    pub components: Vec<ComponentSpec>,
    pub weights: WeightsSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentSpec {
    pub mean: Vec<f64>,
    pub log_std: Vec<f64>,
}

/// Mixing weights, either already normalized or as raw trainable logits.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WeightsSpec {
    Probabilities { values: Vec<f64> },
    Logits { values: Vec<f64> },
}

impl WeightsSpec {
    fn materialize(&self) -> Vec<f64> {
        match self {
            WeightsSpec::Probabilities { values } => values.clone(),
            WeightsSpec::Logits { values } => softmax(values),
        }
    }
}

/// Parse a v0 mixture spec from a JSON string.
pub fn parse_mixture_spec(json: &str) -> Result<MixtureSpecV0> {
    let spec: MixtureSpecV0 = serde_json::from_str(json).context("parsing mixture spec JSON")?;
    if spec.schema_version != MIXTURE_SPEC_V0 {
        bail!(
            "unsupported schema_version '{}' (expected '{}')",
            spec.schema_version,
            MIXTURE_SPEC_V0
        );
    }
    Ok(spec)
}

/// Compile a parsed spec into a [`GaussianMixture`].
pub fn compile_mixture_spec(spec: &MixtureSpecV0) -> Result<GaussianMixture> {
    let mut components: Vec<Arc<dyn MixtureComponent>> = Vec::with_capacity(spec.components.len());
    for (i, c) in spec.components.iter().enumerate() {
        if c.mean.len() != c.log_std.len() {
            bail!(
                "component {i}: mean has {} entries but log_std has {}",
                c.mean.len(),
                c.log_std.len()
            );
        }
        let mut flat = c.mean.clone();
        flat.extend_from_slice(&c.log_std);
        let g = DiagGaussian::new(flat).with_context(|| format!("building component {i}"))?;
        components.push(Arc::new(g));
    }
    let weights = spec.weights.materialize();
    GaussianMixture::new(components, weights).context("assembling mixture")
}

/// Load and compile a mixture spec from a JSON file.
pub fn load_mixture_spec(path: &Path) -> Result<GaussianMixture> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading mixture spec {}", path.display()))?;
    let spec = parse_mixture_spec(&json)?;
    compile_mixture_spec(&spec)
}
