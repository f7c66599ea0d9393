// SPDX-License-Identifier: AGPL-3.0-only

//! Archimedean layer: the C_∞ constant and its audit report.
//!
//! C_∞ is an ε-controlled stand-in for the sup norm of a continuous Green
//! potential under an admissible mean-zero metric. The layer checks the
//! mean-zero normalization on whatever potential samples are available,
//! estimates the empirical sup norm, and picks the constant by one of
//! three branches recorded in the report's method string:
//!
//!   `override-with-sup-estimate`   samples present and trusted,
//!   `sup_norm_bound-tightened`     external bound beats C_epsilon,
//!   `placeholder-epsilon-control`  bare C_epsilon.

use serde::{Deserialize, Serialize};

use crate::tolerances::MEAN_ZERO_ATOL;

/// Mean-zero diagnostic over potential samples. With no samples the
/// check passes vacuously and the moments are absent.
#[derive(Debug, Clone, Serialize)]
pub struct MeanZeroReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    pub n: usize,
    pub mean_zero_ok: bool,
    pub atol: f64,
}

/// |mean| ≤ atol over the samples; population std for the record.
#[must_use]
pub fn check_mean_zero(samples: &[f64], atol: f64) -> MeanZeroReport {
    if samples.is_empty() {
        return MeanZeroReport {
            mean: None,
            std: None,
            n: 0,
            mean_zero_ok: true,
            atol,
        };
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    MeanZeroReport {
        mean: Some(mean),
        std: Some(var.sqrt()),
        n: samples.len(),
        mean_zero_ok: mean.abs() <= atol,
        atol,
    }
}

/// Empirical sup norm max |x|, `None` without samples.
#[must_use]
pub fn estimate_sup_norm(samples: &[f64]) -> Option<f64> {
    samples
        .iter()
        .map(|x| x.abs())
        .fold(None, |acc, x| match acc {
            Some(a) if a >= x => Some(a),
            _ => Some(x),
        })
}

/// Metric metadata: an optional externally-imposed mean-zero flag plus
/// discrete samples of the potential.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricData {
    #[serde(default)]
    pub mean_zero: Option<bool>,
    #[serde(default)]
    pub potential_samples: Option<Vec<f64>>,
    #[serde(default)]
    pub mean_atol: Option<f64>,
}

fn default_c_epsilon() -> f64 {
    1.0
}

/// ε-control parameters for the archimedean constant.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EpsilonParams {
    #[serde(rename = "C_epsilon", default = "default_c_epsilon")]
    pub c_epsilon: f64,
    #[serde(default)]
    pub sup_norm_bound: Option<f64>,
    #[serde(default)]
    pub override_with_sup: bool,
    /// Fallback mean-zero tolerance when the metric carries none.
    #[serde(default)]
    pub mean_atol: Option<f64>,
}

impl Default for EpsilonParams {
    fn default() -> Self {
        Self {
            c_epsilon: default_c_epsilon(),
            sup_norm_bound: None,
            override_with_sup: false,
            mean_atol: None,
        }
    }
}

/// Audit report attached to every C_∞.
#[derive(Debug, Clone, Serialize)]
pub struct ArchimedeanReport {
    pub mean_zero_ok: bool,
    pub mean_zero_stats: MeanZeroReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sup_norm_bound: Option<f64>,
    pub method: String,
    pub notes: String,
    #[serde(rename = "C_epsilon_used")]
    pub c_epsilon_used: f64,
}

/// C_∞ plus its report.
#[derive(Debug, Clone, Serialize)]
pub struct ArchimedeanResult {
    #[serde(rename = "C_infty")]
    pub c_infty: f64,
    pub report: ArchimedeanReport,
}

/// Pick C_∞ from metric samples and ε-parameters. Infallible: degenerate
/// inputs degrade to the ε-control branch with the mismatch recorded in
/// the report.
#[must_use]
pub fn compute_c_infty(metric: &MetricData, params: &EpsilonParams) -> ArchimedeanResult {
    let samples = metric.potential_samples.as_deref().unwrap_or(&[]);
    // Metric's own tolerance wins over the configured fallback.
    let atol = metric
        .mean_atol
        .or(params.mean_atol)
        .unwrap_or(MEAN_ZERO_ATOL);
    let mean_zero_stats = check_mean_zero(samples, atol);
    let sup_estimate = estimate_sup_norm(samples);
    let bound = params.sup_norm_bound.filter(|b| b.is_finite());

    let (c_infty, method) = match sup_estimate {
        Some(sup) if params.override_with_sup => match bound {
            // External bound caps the empirical estimate conservatively.
            Some(b) => (
                sup.min(b),
                "override-with-sup-estimate (min-with-sup_norm_bound)".to_string(),
            ),
            None => (sup, "override-with-sup-estimate".to_string()),
        },
        _ => match bound {
            Some(b) if b < params.c_epsilon => (b, "sup_norm_bound-tightened".to_string()),
            _ => (params.c_epsilon, "placeholder-epsilon-control".to_string()),
        },
    };

    let mut mean_zero_ok = mean_zero_stats.mean_zero_ok;
    let mut notes = String::from(
        "C_infty under epsilon control; replace with a continuous Green potential \
         computation once the admissible normalization is available",
    );
    if metric.mean_zero == Some(false) {
        mean_zero_ok = false;
        notes.push_str(" | warning: metric declares mean_zero = false");
    }

    ArchimedeanResult {
        c_infty,
        report: ArchimedeanReport {
            mean_zero_ok,
            mean_zero_stats,
            sup_norm_bound: bound,
            method,
            notes,
            c_epsilon_used: params.c_epsilon,
        },
    }
}
