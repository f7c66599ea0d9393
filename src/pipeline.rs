// SPDX-License-Identifier: AGPL-3.0-only

//! Batch pipeline over graph catalogs.
//!
//! Shared logic for the spectrum batch binary: each graph runs the
//! spectral stage, the effective-resistance stage, and the Fenchel
//! scenario stage, producing one persisted record per stage. A stage
//! failure is captured as a `StageFailure` and never aborts the other
//! stages of the same graph or the rest of the batch, except under
//! `fail_fast`.

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::TesaConfig;
use crate::data::{sources_for, FenchelRecord, ResistanceRecord, ScenarioSpec, SpectralRecord};
use crate::graph::WeightedGraph;
use crate::physics::{default_sources, edge_resistances, fenchel_energy_with};
use crate::spectral::smallest_positive_eigenvalues;

/// One stage of one graph that did not produce a record.
#[derive(Debug, Clone, Serialize)]
pub struct StageFailure {
    pub graph_id: String,
    pub stage: &'static str,
    pub message: String,
}

/// Records produced for one graph. The spectral stage always yields a
/// record (degradation lives in its note); the other stages are absent
/// when their stage failed.
#[derive(Debug, Clone)]
pub struct GraphOutcome {
    pub spectral: SpectralRecord,
    pub resistance: Option<ResistanceRecord>,
    pub fenchel: Option<FenchelRecord>,
}

/// Everything a batch run produced, in catalog order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub outcomes: Vec<GraphOutcome>,
    pub failures: Vec<StageFailure>,
}

impl BatchOutcome {
    /// Graphs whose every stage produced a record.
    #[must_use]
    pub fn clean_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.resistance.is_some() && o.fenchel.is_some())
            .count()
    }
}

/// Run all three stages on one graph.
///
/// `sources` overrides the two-terminal default scenario for the
/// Fenchel stage.
#[must_use]
pub fn process_graph(
    graph: &WeightedGraph,
    sources: Option<&[(usize, f64)]>,
    config: &TesaConfig,
) -> (GraphOutcome, Vec<StageFailure>) {
    let mut failures = Vec::new();

    let spectral_result = smallest_positive_eigenvalues(graph, &config.spectral_config());
    let spectral = SpectralRecord::new(graph, &spectral_result);

    let resistance = match edge_resistances(graph, config.spectral.seed) {
        Ok((edges, stats)) => Some(ResistanceRecord {
            graph_id: graph.id.clone(),
            n: graph.n(),
            rho: graph.rho,
            edges,
            stats,
        }),
        Err(e) => {
            failures.push(StageFailure {
                graph_id: graph.id.clone(),
                stage: "resistance",
                message: e.to_string(),
            });
            None
        }
    };

    let scenario;
    let sources = match sources {
        Some(s) => s,
        None => {
            scenario = default_sources(graph);
            &scenario
        }
    };
    let fenchel = match fenchel_energy_with(graph, sources, config.fenchel.tol, config.fenchel.max_iter)
    {
        Ok(outcome) => Some(FenchelRecord::new(graph, sources, &outcome)),
        Err(e) => {
            failures.push(StageFailure {
                graph_id: graph.id.clone(),
                stage: "fenchel",
                message: e.to_string(),
            });
            None
        }
    };

    (
        GraphOutcome {
            spectral,
            resistance,
            fenchel,
        },
        failures,
    )
}

/// Run the pipeline over a catalog.
///
/// Scenario sources are looked up per graph id; graphs without one get
/// the two-terminal default. `max_workers > 1` processes graphs on the
/// rayon pool; `fail_fast` implies sequential processing so the batch
/// can stop at the first graph with a failing stage.
#[must_use]
pub fn run_batch(
    graphs: &[WeightedGraph],
    scenarios: &[ScenarioSpec],
    config: &TesaConfig,
) -> BatchOutcome {
    let t0 = Instant::now();
    let mut batch = BatchOutcome::default();

    if config.orchestrator.fail_fast || config.orchestrator.max_workers <= 1 {
        for graph in graphs {
            let sources = sources_for(scenarios, &graph.id);
            let (outcome, failures) = process_graph(graph, sources.as_deref(), config);
            let stop = config.orchestrator.fail_fast && !failures.is_empty();
            batch.outcomes.push(outcome);
            batch.failures.extend(failures);
            if stop {
                break;
            }
        }
    } else {
        let results: Vec<(GraphOutcome, Vec<StageFailure>)> = graphs
            .par_iter()
            .map(|graph| {
                let sources = sources_for(scenarios, &graph.id);
                process_graph(graph, sources.as_deref(), config)
            })
            .collect();
        for (outcome, failures) in results {
            batch.outcomes.push(outcome);
            batch.failures.extend(failures);
        }
    }

    println!(
        "  Processed {}/{} graphs in {:.2}s ({} stage failures)",
        batch.outcomes.len(),
        graphs.len(),
        t0.elapsed().as_secs_f64(),
        batch.failures.len()
    );

    batch
}
