// SPDX-License-Identifier: AGPL-3.0-only

//! Global assembly: C_Global and the height inequality.
//!
//! The machine's output is one inequality per height sample,
//!
//!   h_L(P) ≤ (1 − δ)·m_D(P) + C_Global,
//!
//! with C_Global = C_∞ + Σ_v C_Type,v + err_locals. δ tilts the slope of
//! the bound and never enters the constant. `run_global` stitches the
//! discrepancy, local and archimedean layers into one auditable report.

use serde::{Deserialize, Serialize};

use crate::archimedean::{compute_c_infty, ArchimedeanReport, EpsilonParams, MetricData};
use crate::delta::{compute_delta, DeltaCertificate, FamilySpectralData};
use crate::local::LocalInvariant;

/// A local invariant tagged with its place label.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceInvariant {
    pub place: String,
    #[serde(flatten)]
    pub invariant: LocalInvariant,
}

/// One height sample to test against the bound.
#[derive(Debug, Clone, Deserialize)]
pub struct HeightSample {
    #[serde(default)]
    pub label: Option<String>,
    pub h_l: f64,
    pub m_d: f64,
}

/// A sample with the bound's right-hand side attached.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedSample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub h_l: f64,
    pub m_d: f64,
    pub rhs: f64,
    pub ok: bool,
}

/// Σ_v C_Type,v over the tagged places.
#[must_use]
pub fn sum_c_type(places: &[PlaceInvariant]) -> f64 {
    places.iter().map(|p| p.invariant.c_type).sum()
}

/// C_Global = C_∞ + ΣC_Type + err_locals.
#[must_use]
pub fn assemble_global_constant(c_infty: f64, c_types_sum: f64, err_locals_sum: f64) -> f64 {
    c_infty + c_types_sum + err_locals_sum
}

/// Right-hand side (1 − δ)·m_D + C_Global.
#[must_use]
pub fn global_bound(m_d: f64, delta: f64, c_global: f64) -> f64 {
    (1.0 - delta) * m_d + c_global
}

/// Attach RHS and the pass flag to every sample. Equality passes.
#[must_use]
pub fn evaluate_samples(
    samples: &[HeightSample],
    delta: f64,
    c_global: f64,
) -> Vec<EvaluatedSample> {
    samples
        .iter()
        .map(|s| {
            let rhs = global_bound(s.m_d, delta, c_global);
            EvaluatedSample {
                label: s.label.clone(),
                h_l: s.h_l,
                m_d: s.m_d,
                rhs,
                ok: s.h_l <= rhs,
            }
        })
        .collect()
}

/// Scalar inputs echoed into the report for audit.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalInputs {
    pub genus: u32,
    pub err_locals_sum: f64,
}

/// Consolidated global result: the constants plus every layer's audit
/// trail.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalReport {
    pub delta: f64,
    #[serde(rename = "C_types_sum")]
    pub c_types_sum: f64,
    #[serde(rename = "C_infty")]
    pub c_infty: f64,
    #[serde(rename = "C_global")]
    pub c_global: f64,
    pub delta_certificate: DeltaCertificate,
    #[serde(rename = "C_infty_report")]
    pub c_infty_report: ArchimedeanReport,
    pub inputs: GlobalInputs,
}

/// Run the three layers and assemble C_Global. Infallible by the same
/// contract as the layers themselves: every degradation lands in the
/// certificates, not in an error.
#[must_use]
pub fn run_global(
    genus: u32,
    family: &FamilySpectralData,
    places: &[PlaceInvariant],
    metric: &MetricData,
    epsilon_params: &EpsilonParams,
    err_locals_sum: f64,
) -> GlobalReport {
    let delta_result = compute_delta(genus, family);
    let c_types_sum = sum_c_type(places);
    let arch = compute_c_infty(metric, epsilon_params);
    let c_global = assemble_global_constant(arch.c_infty, c_types_sum, err_locals_sum);

    GlobalReport {
        delta: delta_result.delta,
        c_types_sum,
        c_infty: arch.c_infty,
        c_global,
        delta_certificate: delta_result.certificate,
        c_infty_report: arch.report,
        inputs: GlobalInputs {
            genus,
            err_locals_sum,
        },
    }
}

/// Plain-text rendering of a global report with the per-place table.
#[must_use]
pub fn summarize_global(report: &GlobalReport, places: &[PlaceInvariant]) -> String {
    let mut lines = Vec::new();
    lines.push("=== TESA global report ===".to_string());
    lines.push(format!("g: {}", report.inputs.genus));
    lines.push(format!("delta: {}", report.delta));
    lines.push(format!("sum C_Type: {}", report.c_types_sum));
    lines.push(format!("C_infty: {}", report.c_infty));
    lines.push(format!("C_Global: {}", report.c_global));

    lines.push("-- certificates --".to_string());
    let cert = &report.delta_certificate;
    lines.push(format!(
        "delta: method={} raw={} normalized={}",
        cert.method.label(),
        cert.raw_value,
        cert.normalized
    ));
    let arch = &report.c_infty_report;
    lines.push(format!(
        "C_infty: method={} mean_zero_ok={}",
        arch.method, arch.mean_zero_ok
    ));

    lines.push("-- places --".to_string());
    if places.is_empty() {
        lines.push("(no local results)".to_string());
    } else {
        lines.push(
            "place | name | i0 | c | K_v | f_v^tame | f_v | E_fenchel | C_Type | n".to_string(),
        );
        for p in places {
            let inv = &p.invariant;
            lines.push(format!(
                "{} | {} | {} | {} | {} | {} | {} | {} | {} | {}",
                p.place,
                inv.name,
                inv.i0,
                inv.conductance,
                inv.k_v,
                inv.f_v_tame,
                inv.f_v,
                inv.e_fenchel,
                inv.c_type,
                inv.n
            ));
        }
    }

    lines.push("-- parameters --".to_string());
    lines.push(format!("C_epsilon: {}", arch.c_epsilon_used));
    lines.push(format!("err_locals_sum: {}", report.inputs.err_locals_sum));
    lines.push("=== end of report ===".to_string());
    lines.join("\n")
}
