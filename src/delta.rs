// SPDX-License-Identifier: AGPL-3.0-only

//! Discrepancy layer: an auditable δ ∈ [0, 1) for the height inequality.
//!
//! δ is a heuristic stand-in for a rigorous spectral bound. Every value
//! ships with a certificate recording which strategy produced it and from
//! what raw inputs, so a later rigorous computation can be diffed against
//! the heuristic one. Strategy precedence:
//!
//!   1. explicit `delta_lower_bound` supplied by the family data,
//!   2. dense Laplacian + positive `lambda_scale`: raw = min(1, λ₂/scale),
//!   3. positive spectral samples: raw = min(1, min/max),
//!   4. zero.
//!
//! An optional `force_cap` caps the raw value before normalization.

use serde::{Deserialize, Serialize};

use crate::tolerances::DELTA_CLIP_EPS;

const CERTIFICATE_NOTES: &str = "delta normalized to [0,1); replace with a rigorous \
     spectral bound (lambda2 ratio, isoperimetric, or analytic) when one is available";

/// Which strategy produced δ. Serializes as the audit label
/// (`explicit-lower-bound`, `discrete-laplacian-ratio`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeltaMethod {
    ExplicitLowerBound,
    DiscreteLaplacianRatio,
    SpectralSamplesHeuristic,
    FallbackZero,
}

impl DeltaMethod {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ExplicitLowerBound => "explicit-lower-bound",
            Self::DiscreteLaplacianRatio => "discrete-laplacian-ratio",
            Self::SpectralSamplesHeuristic => "spectral-samples-heuristic",
            Self::FallbackZero => "fallback-zero",
        }
    }
}

/// Per-method provenance carried inside the certificate. Absent fields
/// are omitted from the serialized form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeltaContext {
    pub genus: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lambda_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lambda2_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<usize>,
}

/// Audit record for one δ computation.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaCertificate {
    pub method: DeltaMethod,
    pub raw_value: f64,
    pub normalized: f64,
    pub context: DeltaContext,
    pub notes: &'static str,
}

/// Normalized δ plus its certificate.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaResult {
    pub delta: f64,
    pub certificate: DeltaCertificate,
}

/// Spectral inputs a family may carry. All optional; strategy precedence
/// decides which ones are consulted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilySpectralData {
    #[serde(default)]
    pub delta_lower_bound: Option<f64>,
    #[serde(default)]
    pub laplacian: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub lambda_scale: Option<f64>,
    #[serde(default)]
    pub spectral_samples: Option<Vec<f64>>,
    #[serde(default)]
    pub force_cap: Option<f64>,
    #[serde(default)]
    pub clip_eps: Option<f64>,
}

/// Clamp δ to [0, 1 − eps]. NaN and ±inf collapse to 0.
#[must_use]
pub fn normalize_delta(value: f64, eps: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        return 0.0;
    }
    let upper = 1.0 - eps;
    if value >= upper {
        upper
    } else {
        value
    }
}

/// λ₂ estimate for a dense symmetric Laplacian: the minimum Rayleigh
/// quotient over the canonical basis projected orthogonal to the constant
/// vector. Negative quotients (rounding) clamp to 0. `None` on empty or
/// ragged input, and for n = 1 where the orthogonal complement is trivial.
#[must_use]
pub fn estimate_spectral_gap(laplacian: &[Vec<f64>]) -> Option<f64> {
    let n = laplacian.len();
    if n == 0 || laplacian.iter().any(|row| row.len() != n) {
        return None;
    }

    let inv_sqrt_n = 1.0 / (n as f64).sqrt();
    let mut best: Option<f64> = None;
    for k in 0..n {
        // e_k projected orthogonal to the constant direction.
        let mut v: Vec<f64> = vec![-inv_sqrt_n * inv_sqrt_n; n];
        v[k] += 1.0;
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm <= 0.0 {
            continue;
        }
        for x in &mut v {
            *x /= norm;
        }

        let mut quotient = 0.0;
        for (i, row) in laplacian.iter().enumerate() {
            let lv: f64 = row.iter().zip(&v).map(|(a, x)| a * x).sum();
            quotient += v[i] * lv;
        }
        let quotient = quotient.max(0.0);
        best = Some(match best {
            Some(b) if b <= quotient => b,
            _ => quotient,
        });
    }
    best
}

fn certify(
    method: DeltaMethod,
    raw: f64,
    clip_eps: f64,
    context: DeltaContext,
) -> DeltaResult {
    let normalized = normalize_delta(raw, clip_eps);
    DeltaResult {
        delta: normalized,
        certificate: DeltaCertificate {
            method,
            raw_value: raw,
            normalized,
            context,
            notes: CERTIFICATE_NOTES,
        },
    }
}

/// Compute δ for a family by strategy precedence, returning the value and
/// its certificate. Never fails: exhausted strategies produce the zero
/// fallback with its own certificate.
#[must_use]
pub fn compute_delta(genus: u32, data: &FamilySpectralData) -> DeltaResult {
    let clip_eps = data.clip_eps.unwrap_or(DELTA_CLIP_EPS);
    let cap = |raw: f64| match data.force_cap {
        Some(c) => raw.min(c),
        None => raw,
    };

    if let Some(bound) = data.delta_lower_bound {
        let raw = cap(if bound.is_finite() { bound } else { 0.0 });
        return certify(
            DeltaMethod::ExplicitLowerBound,
            raw,
            clip_eps,
            DeltaContext {
                genus,
                source: Some("family.delta_lower_bound"),
                ..DeltaContext::default()
            },
        );
    }

    if let (Some(lap), Some(scale)) = (&data.laplacian, data.lambda_scale) {
        let lambda2 = if scale > 0.0 && scale.is_finite() {
            estimate_spectral_gap(lap)
        } else {
            None
        };
        let raw = cap(match lambda2 {
            Some(l2) => (l2 / scale).min(1.0),
            None => 0.0,
        });
        return certify(
            DeltaMethod::DiscreteLaplacianRatio,
            raw,
            clip_eps,
            DeltaContext {
                genus,
                lambda_scale: Some(scale),
                lambda2_estimate: lambda2,
                matrix_size: Some(lap.len()),
                ..DeltaContext::default()
            },
        );
    }

    if let Some(samples) = &data.spectral_samples {
        let positive: Vec<f64> = samples
            .iter()
            .copied()
            .filter(|x| x.is_finite() && *x > 0.0)
            .collect();
        let raw = cap(match positive.len() {
            0 => 0.0,
            // One sample says nothing about a ratio; stay conservative.
            1 => 0.5,
            _ => {
                let smin = positive.iter().copied().fold(f64::INFINITY, f64::min);
                let smax = positive.iter().copied().fold(0.0f64, f64::max);
                if smax == 0.0 { 0.0 } else { (smin / smax).min(1.0) }
            }
        });
        return certify(
            DeltaMethod::SpectralSamplesHeuristic,
            raw,
            clip_eps,
            DeltaContext {
                genus,
                sample_count: Some(positive.len()),
                ..DeltaContext::default()
            },
        );
    }

    certify(
        DeltaMethod::FallbackZero,
        0.0,
        clip_eps,
        DeltaContext {
            genus,
            ..DeltaContext::default()
        },
    )
}
