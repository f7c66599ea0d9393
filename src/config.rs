// SPDX-License-Identifier: AGPL-3.0-only

//! Run configuration: defaults, JSON file overlay, `TESA_` environment
//! overrides, and a clamping validation pass.
//!
//! Precedence, lowest to highest: built-in defaults, JSON config file,
//! environment variables. Every field has a default, so a config file
//! may name only the keys it changes. Validation never rejects a config;
//! out-of-range values are clamped back to their defaults so a bad knob
//! cannot take down a batch run.
//!
//! Documented environment keys:
//!
//!   TESA_SPECTRAL_K / _TOL / _SEED / _CLIP_EPS
//!   TESA_FENCHEL_TOL / _MAX_ITER
//!   TESA_ARCHIMEDEAN_C_EPSILON / _MEAN_ATOL
//!   TESA_ORCHESTRATOR_FAIL_FAST / _MAX_WORKERS
//!
//! Unparseable values are ignored and the previous value stands.

use std::error::Error;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::archimedean::EpsilonParams;
use crate::spectral::SpectralConfig;
use crate::tolerances::{CG_MAX_ITER, CG_TOLERANCE, DELTA_CLIP_EPS, MEAN_ZERO_ATOL};

const DEFAULT_SPECTRAL_K: usize = 3;
const DEFAULT_SEED: u64 = 42;

/// Spectral stage knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpectralSection {
    pub k: usize,
    pub tol: f64,
    pub seed: u64,
    pub clip_eps: f64,
}

impl Default for SpectralSection {
    fn default() -> Self {
        Self {
            k: DEFAULT_SPECTRAL_K,
            tol: CG_TOLERANCE,
            seed: DEFAULT_SEED,
            clip_eps: DELTA_CLIP_EPS,
        }
    }
}

/// Fenchel stage knobs (first-rung CG only; the fallback rungs keep
/// their fixed caps).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FenchelSection {
    pub tol: f64,
    pub max_iter: usize,
}

impl Default for FenchelSection {
    fn default() -> Self {
        Self {
            tol: CG_TOLERANCE,
            max_iter: CG_MAX_ITER,
        }
    }
}

/// Archimedean layer knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchimedeanSection {
    #[serde(rename = "C_epsilon")]
    pub c_epsilon: f64,
    pub sup_norm_bound: Option<f64>,
    pub override_with_sup: bool,
    pub mean_atol: f64,
}

impl Default for ArchimedeanSection {
    fn default() -> Self {
        Self {
            c_epsilon: 1.0,
            sup_norm_bound: None,
            override_with_sup: false,
            mean_atol: MEAN_ZERO_ATOL,
        }
    }
}

/// Batch orchestration knobs. `max_workers = 1` keeps runs sequential
/// and bitwise deterministic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorSection {
    pub fail_fast: bool,
    pub max_workers: usize,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_workers: 1,
        }
    }
}

/// Full run configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TesaConfig {
    pub spectral: SpectralSection,
    pub fenchel: FenchelSection,
    pub archimedean: ArchimedeanSection,
    pub orchestrator: OrchestratorSection,
}

fn parse_assign<T: FromStr>(slot: &mut T, raw: &str) {
    if let Ok(v) = raw.trim().parse::<T>() {
        *slot = v;
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl TesaConfig {
    /// Defaults, then the JSON file (if any), then environment
    /// overrides, then validation.
    ///
    /// # Errors
    ///
    /// I/O or JSON parse failure for the config file. Environment and
    /// validation never fail.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let mut config = match path {
            Some(p) => Self::from_json_str(&std::fs::read_to_string(p)?)?,
            None => Self::default(),
        };
        config.apply_overrides(std::env::vars());
        config.validate();
        Ok(config)
    }

    /// Parse a (possibly partial) JSON config document.
    ///
    /// # Errors
    ///
    /// Malformed JSON or unknown keys.
    pub fn from_json_str(text: &str) -> Result<Self, Box<dyn Error>> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply `TESA_`-prefixed key/value overrides. Unknown keys and
    /// unparseable values are ignored.
    pub fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            match key.as_str() {
                "TESA_SPECTRAL_K" => parse_assign(&mut self.spectral.k, &value),
                "TESA_SPECTRAL_TOL" => parse_assign(&mut self.spectral.tol, &value),
                "TESA_SPECTRAL_SEED" => parse_assign(&mut self.spectral.seed, &value),
                "TESA_SPECTRAL_CLIP_EPS" => parse_assign(&mut self.spectral.clip_eps, &value),
                "TESA_FENCHEL_TOL" => parse_assign(&mut self.fenchel.tol, &value),
                "TESA_FENCHEL_MAX_ITER" => parse_assign(&mut self.fenchel.max_iter, &value),
                "TESA_ARCHIMEDEAN_C_EPSILON" => {
                    parse_assign(&mut self.archimedean.c_epsilon, &value);
                }
                "TESA_ARCHIMEDEAN_MEAN_ATOL" => {
                    parse_assign(&mut self.archimedean.mean_atol, &value);
                }
                "TESA_ORCHESTRATOR_FAIL_FAST" => {
                    if let Some(b) = parse_bool(&value) {
                        self.orchestrator.fail_fast = b;
                    }
                }
                "TESA_ORCHESTRATOR_MAX_WORKERS" => {
                    parse_assign(&mut self.orchestrator.max_workers, &value);
                }
                _ => {}
            }
        }
    }

    /// Clamp out-of-range knobs back to their defaults.
    pub fn validate(&mut self) {
        if self.spectral.k == 0 {
            self.spectral.k = DEFAULT_SPECTRAL_K;
        }
        if !(self.spectral.tol.is_finite() && self.spectral.tol > 0.0) {
            self.spectral.tol = CG_TOLERANCE;
        }
        if !(self.spectral.clip_eps > 0.0 && self.spectral.clip_eps < 0.1) {
            self.spectral.clip_eps = DELTA_CLIP_EPS;
        }
        if !(self.fenchel.tol.is_finite() && self.fenchel.tol > 0.0) {
            self.fenchel.tol = CG_TOLERANCE;
        }
        if self.fenchel.max_iter == 0 {
            self.fenchel.max_iter = CG_MAX_ITER;
        }
        if !self.archimedean.c_epsilon.is_finite() {
            self.archimedean.c_epsilon = 1.0;
        } else if self.archimedean.c_epsilon < 0.0 {
            self.archimedean.c_epsilon = 0.0;
        }
        if !(self.archimedean.mean_atol.is_finite() && self.archimedean.mean_atol > 0.0) {
            self.archimedean.mean_atol = MEAN_ZERO_ATOL;
        }
        if self.orchestrator.max_workers == 0 {
            self.orchestrator.max_workers = 1;
        }
    }

    /// Spectral-stage view of this config.
    #[must_use]
    pub fn spectral_config(&self) -> SpectralConfig {
        SpectralConfig {
            k: self.spectral.k,
            tol: self.spectral.tol,
            seed: self.spectral.seed,
            max_iter: None,
        }
    }

    /// Archimedean-layer view of this config.
    #[must_use]
    pub fn epsilon_params(&self) -> EpsilonParams {
        EpsilonParams {
            c_epsilon: self.archimedean.c_epsilon,
            sup_norm_bound: self.archimedean.sup_norm_bound,
            override_with_sup: self.archimedean.override_with_sup,
            mean_atol: Some(self.archimedean.mean_atol),
        }
    }
}
