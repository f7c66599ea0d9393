// SPDX-License-Identifier: AGPL-3.0-only

//! TESA g = 1 reference family: end-to-end pipeline validation.
//!
//! Builds the three-place reference catalog (D4 at p = 2, E6 at p = 2,
//! D5 at p = 5), runs the local C_Type computations, the δ and C_∞
//! layers, and the C_Global assembly, then evaluates synthetic height
//! samples against the bound h_L ≤ (1−δ)·m_D + C_Global. Every constant
//! is checked against the pinned Python control values.
//!
//! Writes `g1_locals.json`, `g1_global.json`, `g1_samples.json` and the
//! plain-text report under the output directory (first CLI argument,
//! default `outputs/`).
//!
//! Exit code 0 = all checks pass, 1 = any failure.

use std::path::PathBuf;
use std::time::Instant;

use tesa_machine::archimedean::{EpsilonParams, MetricData};
use tesa_machine::bound::{evaluate_samples, run_global, summarize_global, HeightSample, PlaceInvariant};
use tesa_machine::data::write_json_pretty;
use tesa_machine::delta::{DeltaMethod, FamilySpectralData};
use tesa_machine::local::{compute_c_type, kv_lookup, LocalGraphType};
use tesa_machine::provenance::{D4_C_TYPE, D5_C_TYPE, E6_C_TYPE, G1_C_GLOBAL, G1_DELTA};
use tesa_machine::tolerances::EXACT_F64;
use tesa_machine::validation::ValidationHarness;

/// The g = 1 reference catalog: (place, template, residue prime, i0,
/// conductance). Mirrors the family config of the control run.
const PLACES: [(&str, LocalGraphType, u64, i64, f64); 3] = [
    ("v2", LocalGraphType::D4, 2, 3, 1.0),
    ("v3", LocalGraphType::E6, 2, 3, 1.0),
    ("v5", LocalGraphType::D5, 5, 2, 1.0),
];

fn main() {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  TESA g = 1 Reference Family                                 ║");
    println!("║  local C_Type → δ → C_∞ → C_Global → height samples          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let out_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "outputs".into()));
    let t0 = Instant::now();

    // ── Local invariants per place ─────────────────────────────────
    let mut places = Vec::new();
    for (place, template, p, i0, conductance) in PLACES {
        let k_v = kv_lookup(p, template);
        let invariant = compute_c_type(template, i0, k_v, conductance)
            .expect("reference template must be computable");
        println!(
            "  {place}: {} (p = {p})  K_v = {k_v:.2}  f_v = {:.4}  C_Type = {:.7}",
            invariant.name, invariant.f_v, invariant.c_type
        );
        places.push(PlaceInvariant {
            place: place.to_string(),
            invariant,
        });
    }
    println!();

    // ── Global assembly ────────────────────────────────────────────
    let family = FamilySpectralData {
        delta_lower_bound: Some(G1_DELTA.value),
        ..FamilySpectralData::default()
    };
    let metric = MetricData {
        mean_zero: Some(true),
        ..MetricData::default()
    };
    let report = run_global(1, &family, &places, &metric, &EpsilonParams::default(), 0.0);

    let summary = summarize_global(&report, &places);
    println!("{summary}");

    // ── Synthetic height samples, one per place ────────────────────
    let samples: Vec<HeightSample> = places
        .iter()
        .enumerate()
        .map(|(k, p)| HeightSample {
            label: Some(p.place.clone()),
            h_l: 3.0 + k as f64,
            m_d: 4.0 + 0.5 * k as f64,
        })
        .collect();
    let evaluated = evaluate_samples(&samples, report.delta, report.c_global);
    for s in &evaluated {
        let label = s.label.as_deref().unwrap_or("-");
        let verdict = if s.ok { "ok" } else { "VIOLATED" };
        println!(
            "  sample {label}: h_L = {:.3} vs RHS = {:.3}  [{verdict}]",
            s.h_l, s.rhs
        );
    }
    println!();

    // ── Artifacts ──────────────────────────────────────────────────
    std::fs::create_dir_all(&out_dir).expect("create output directory");
    write_json_pretty(&out_dir.join("g1_locals.json"), &places).expect("write g1_locals.json");
    write_json_pretty(&out_dir.join("g1_global.json"), &report).expect("write g1_global.json");
    write_json_pretty(&out_dir.join("g1_samples.json"), &evaluated).expect("write g1_samples.json");
    std::fs::write(out_dir.join("g1_report.txt"), &summary).expect("write g1_report.txt");
    println!("  Artifacts under {}", out_dir.display());
    println!("  Wall time: {:.3}s", t0.elapsed().as_secs_f64());

    // ── Checks against the pinned control values ───────────────────
    let mut harness = ValidationHarness::new("tesa_g1_ref");
    harness.print_provenance(&[&D4_C_TYPE, &E6_C_TYPE, &D5_C_TYPE, &G1_DELTA, &G1_C_GLOBAL]);

    harness.check_abs(
        "D4 C_Type",
        places[0].invariant.c_type,
        D4_C_TYPE.value,
        EXACT_F64,
    );
    harness.check_abs(
        "E6 C_Type",
        places[1].invariant.c_type,
        E6_C_TYPE.value,
        EXACT_F64,
    );
    harness.check_abs(
        "D5 C_Type",
        places[2].invariant.c_type,
        D5_C_TYPE.value,
        EXACT_F64,
    );
    harness.check_abs("delta", report.delta, G1_DELTA.value, EXACT_F64);
    harness.check_abs("C_Global", report.c_global, G1_C_GLOBAL.value, EXACT_F64);
    harness.check_upper("delta below 1", report.delta, 1.0);
    harness.check_bool(
        "delta certified by explicit lower bound",
        report.delta_certificate.method == DeltaMethod::ExplicitLowerBound,
    );
    harness.check_bool("mean-zero diagnostics ok", report.c_infty_report.mean_zero_ok);
    harness.check_bool(
        "every height sample satisfies the bound",
        evaluated.iter().all(|s| s.ok),
    );

    harness.finish();
}
