// SPDX-License-Identifier: AGPL-3.0-only

//! Spectrum batch: catalog sweep with convergence audit.
//!
//! Loads every graph JSON under the catalog directory, runs the
//! spectral / resistance / Fenchel pipeline per graph, persists one
//! record per stage, then audits the spectral records for convergence
//! problems. When the catalog directory does not exist the built-in
//! reference catalog (star8, cycle4, path3) runs instead and the
//! closed-form baselines are checked.
//!
//! Usage: `spectrum_batch [graphs_dir] [out_dir] [scenarios.json] [config.json]`
//!
//! Exit code 0 = all checks pass, 1 = any failure.

use std::path::PathBuf;

use tesa_machine::config::TesaConfig;
use tesa_machine::data::{load_graph_dir, load_scenario_file, write_json_pretty, SpectralRecord};
use tesa_machine::graph::WeightedGraph;
use tesa_machine::physics::pseudoinverse;
use tesa_machine::pipeline::run_batch;
use tesa_machine::provenance::{
    CYCLE4_ADJACENT_RESISTANCE, CYCLE4_OPPOSITE_RESISTANCE, PATH3_FENCHEL_ENERGY, STAR8_LAMBDA1,
};
use tesa_machine::tolerances::ITERATIVE_F64;
use tesa_machine::validation::{validate_convergence, ValidationHarness};

fn builtin_catalog() -> Vec<WeightedGraph> {
    let spokes: Vec<(usize, usize)> = (1..8).map(|k| (0, k)).collect();
    vec![
        WeightedGraph::unit("star8", 8, &spokes).expect("star8 template"),
        WeightedGraph::unit("cycle4", 4, &[(0, 1), (1, 2), (2, 3), (3, 0)])
            .expect("cycle4 template"),
        WeightedGraph::unit("path3", 3, &[(0, 1), (1, 2)]).expect("path3 template"),
    ]
}

fn main() {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  TESA Spectrum Batch                                         ║");
    println!("║  eigensolve → effective resistance → Fenchel energy          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();
    let graphs_dir = PathBuf::from(args.get(1).cloned().unwrap_or_else(|| "data/graphs".into()));
    let out_dir = PathBuf::from(
        args.get(2)
            .cloned()
            .unwrap_or_else(|| "outputs/spectrum".into()),
    );
    let scenarios_path = args.get(3).map(PathBuf::from);
    let config_path = args.get(4).map(PathBuf::from);

    let config = TesaConfig::load(config_path.as_deref()).expect("load configuration");
    println!(
        "  Config: k = {}, tol = {:.1e}, seed = {}, workers = {}",
        config.spectral.k, config.spectral.tol, config.spectral.seed, config.orchestrator.max_workers
    );

    // ── Catalog ────────────────────────────────────────────────────
    let (graphs, builtin) = if graphs_dir.is_dir() {
        let load = load_graph_dir(&graphs_dir).expect("read catalog directory");
        for f in &load.failures {
            println!("  skipped {}: {}", f.file, f.message);
        }
        if !load.failures.is_empty() {
            write_json_pretty(&out_dir.join("load_failures.json"), &load.failures)
                .expect("write load_failures.json");
        }
        (load.graphs, false)
    } else {
        println!(
            "  {} not found; running the built-in reference catalog",
            graphs_dir.display()
        );
        (builtin_catalog(), true)
    };
    println!("  Catalog: {} graphs", graphs.len());

    let scenarios = match &scenarios_path {
        Some(p) => load_scenario_file(p).expect("load scenario file"),
        None => Vec::new(),
    };
    if !scenarios.is_empty() {
        println!("  Scenarios: {} configured", scenarios.len());
    }
    println!();

    // ── Pipeline ───────────────────────────────────────────────────
    let batch = run_batch(&graphs, &scenarios, &config);
    for failure in &batch.failures {
        println!(
            "    stage failure: {} / {}: {}",
            failure.graph_id, failure.stage, failure.message
        );
    }

    for outcome in &batch.outcomes {
        let id = &outcome.spectral.graph_id;
        write_json_pretty(
            &out_dir.join("spectral").join(format!("{id}.json")),
            &outcome.spectral,
        )
        .expect("write spectral record");
        if let Some(r) = &outcome.resistance {
            write_json_pretty(&out_dir.join("resistance").join(format!("{id}.json")), r)
                .expect("write resistance record");
        }
        if let Some(f) = &outcome.fenchel {
            write_json_pretty(&out_dir.join("fenchel").join(format!("{id}.json")), f)
                .expect("write fenchel record");
        }
    }
    if !batch.failures.is_empty() {
        write_json_pretty(&out_dir.join("stage_failures.json"), &batch.failures)
            .expect("write stage_failures.json");
    }

    // ── Convergence audit ──────────────────────────────────────────
    let records: Vec<SpectralRecord> = batch.outcomes.iter().map(|o| o.spectral.clone()).collect();
    let audit = validate_convergence(&records);
    println!();
    println!(
        "  Convergence audit: {} total, {} ok, {} fail",
        audit.total, audit.ok, audit.fail
    );
    for issue in &audit.issues {
        println!("    {}: {}", issue.graph_id, issue.reasons.join("; "));
    }
    write_json_pretty(&out_dir.join("convergence.json"), &audit).expect("write convergence.json");
    println!("  Records under {}", out_dir.display());

    // ── Checks ─────────────────────────────────────────────────────
    let mut harness = ValidationHarness::new("spectrum_batch");
    harness.check_bool("catalog non-empty", !batch.outcomes.is_empty());
    harness.check_bool("no stage failures", batch.failures.is_empty());
    harness.check_bool("convergence audit clean", audit.fail == 0);

    if builtin {
        harness.print_provenance(&[
            &STAR8_LAMBDA1,
            &CYCLE4_ADJACENT_RESISTANCE,
            &CYCLE4_OPPOSITE_RESISTANCE,
            &PATH3_FENCHEL_ENERGY,
        ]);

        let lambda1_of = |id: &str| {
            batch
                .outcomes
                .iter()
                .find(|o| o.spectral.graph_id == id)
                .and_then(|o| o.spectral.lambda1)
                .unwrap_or(f64::NAN)
        };
        harness.check_abs(
            "star8 lambda1",
            lambda1_of("star8"),
            STAR8_LAMBDA1.value,
            ITERATIVE_F64,
        );

        let cycle4 = batch
            .outcomes
            .iter()
            .find(|o| o.spectral.graph_id == "cycle4")
            .and_then(|o| o.resistance.as_ref());
        let (r_min, r_max) = cycle4.map_or((f64::NAN, f64::NAN), |r| (r.stats.min, r.stats.max));
        harness.check_abs(
            "cycle4 adjacent resistance (min over edges)",
            r_min,
            CYCLE4_ADJACENT_RESISTANCE.value,
            ITERATIVE_F64,
        );
        harness.check_abs(
            "cycle4 adjacent resistance (max over edges)",
            r_max,
            CYCLE4_ADJACENT_RESISTANCE.value,
            ITERATIVE_F64,
        );

        if let Some(g) = graphs.iter().find(|g| g.id == "cycle4") {
            let pinv = pseudoinverse(g, config.spectral.seed);
            harness.check_abs(
                "cycle4 opposite resistance",
                pinv.effective_resistance(0, 2),
                CYCLE4_OPPOSITE_RESISTANCE.value,
                ITERATIVE_F64,
            );
        }

        let path3_energy = batch
            .outcomes
            .iter()
            .find(|o| o.spectral.graph_id == "path3")
            .and_then(|o| o.fenchel.as_ref())
            .map_or(f64::NAN, |f| f.energy);
        harness.check_abs(
            "path3 two-terminal Fenchel energy",
            path3_energy,
            PATH3_FENCHEL_ENERGY.value,
            ITERATIVE_F64,
        );
    }

    harness.finish();
}
