// SPDX-License-Identifier: AGPL-3.0-only

//! Graph, scenario and record I/O at the pipeline boundary.
//!
//! The numerical core consumes in-memory structures only; this module is
//! the glue that reads graph and scenario JSON and persists per-graph
//! result records. Graph files carry
//!
//! ```json
//! {
//!   "graph": {"id": "cycle-8", "class": "Cn", "n": 8, "rho": 1.0},
//!   "nodes": [{"id": 0, "weight": 1.0}, ...],
//!   "edges": [{"u": 0, "v": 1, "conductance": 1.0}, ...]
//! }
//! ```
//!
//! with `weight`, `conductance` and `rho` defaulting when absent. Node
//! ids may be sparse; file order fixes the node ordering the solvers
//! see. Scenario files list {graph_id, sources} injections for the
//! Fenchel stage.

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TesaError;
use crate::graph::{Edge, WeightedGraph};
use crate::physics::{EdgeResistance, FenchelOutcome, ResistanceStats, SolveStrategy};
use crate::spectral::SpectralResult;

fn default_unit() -> f64 {
    1.0
}

/// Graph file header block.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphHeader {
    pub id: String,
    /// Family tag of the graph (cycle, grid, expander, ...). The file
    /// key is `class`.
    #[serde(rename = "class", default)]
    pub family: Option<String>,
    pub n: usize,
    #[serde(default = "default_unit")]
    pub rho: f64,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// One node entry; `weight` defaults to 1.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub id: usize,
    #[serde(default = "default_unit")]
    pub weight: f64,
}

/// One edge entry; `conductance` defaults to 1.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeSpec {
    pub u: usize,
    pub v: usize,
    #[serde(default = "default_unit")]
    pub conductance: f64,
}

/// A full graph file.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphFile {
    pub graph: GraphHeader,
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
}

impl GraphFile {
    /// Validate and convert into a [`WeightedGraph`].
    ///
    /// # Errors
    ///
    /// `Structure` when the declared `n` disagrees with the node list,
    /// a node id repeats, or an edge references an unknown id. Edge and
    /// weight validation then follows [`WeightedGraph::new`].
    pub fn into_graph(self) -> Result<WeightedGraph, TesaError> {
        let header = self.graph;
        if header.n != self.nodes.len() {
            return Err(TesaError::Structure(format!(
                "graph {:?} declares n = {} but lists {} nodes",
                header.id,
                header.n,
                self.nodes.len()
            )));
        }

        // File order fixes the node ordering; ids only have to be unique.
        let mut index: HashMap<usize, usize> = HashMap::with_capacity(self.nodes.len());
        let mut weights = Vec::with_capacity(self.nodes.len());
        for (pos, node) in self.nodes.iter().enumerate() {
            if index.insert(node.id, pos).is_some() {
                return Err(TesaError::Structure(format!(
                    "graph {:?} repeats node id {}",
                    header.id, node.id
                )));
            }
            weights.push(node.weight);
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        for e in &self.edges {
            let (Some(&u), Some(&v)) = (index.get(&e.u), index.get(&e.v)) else {
                return Err(TesaError::Structure(format!(
                    "graph {:?} edge ({}, {}) references an unknown node id",
                    header.id, e.u, e.v
                )));
            };
            edges.push(Edge {
                u,
                v,
                conductance: e.conductance,
            });
        }

        Ok(WeightedGraph::new(header.id, weights, edges)?
            .with_rho(header.rho)
            .with_family(header.family.unwrap_or_default()))
    }
}

/// Load one graph JSON file.
///
/// # Errors
///
/// I/O, JSON parse, or structural validation failure.
pub fn load_graph_file(path: &Path) -> Result<WeightedGraph, Box<dyn Error>> {
    let reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let file: GraphFile = serde_json::from_reader(reader)?;
    Ok(file.into_graph()?)
}

/// One file that failed to load; the rest of the directory proceeds.
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub file: String,
    pub message: String,
}

/// Result of loading a graph directory: parsed graphs in file-name
/// order plus per-file failures.
#[derive(Debug, Default)]
pub struct DirLoad {
    pub graphs: Vec<WeightedGraph>,
    pub failures: Vec<LoadFailure>,
}

/// Load every `*.json` graph in `dir`, sorted by file name. Files named
/// `index.json` or starting with `_` are catalog metadata and skipped.
/// A malformed file is recorded as a failure, not an abort.
///
/// # Errors
///
/// Only when the directory itself cannot be read.
pub fn load_graph_dir(dir: &Path) -> Result<DirLoad, Box<dyn Error>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == "json")
                && p.file_stem().and_then(|s| s.to_str()).is_some_and(|stem| {
                    stem != "index" && !stem.starts_with('_')
                })
        })
        .collect();
    paths.sort();

    let mut load = DirLoad::default();
    for path in paths {
        match load_graph_file(&path) {
            Ok(graph) => load.graphs.push(graph),
            Err(e) => load.failures.push(LoadFailure {
                file: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }
    Ok(load)
}

/// One signed injection at a node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceSpec {
    pub node: usize,
    pub injection: f64,
}

/// Fenchel scenario: which graph, which injections.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSpec {
    pub graph_id: String,
    pub sources: Vec<SourceSpec>,
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    scenarios: Vec<ScenarioSpec>,
}

/// Load a scenario JSON file.
///
/// # Errors
///
/// I/O or JSON parse failure.
pub fn load_scenario_file(path: &Path) -> Result<Vec<ScenarioSpec>, Box<dyn Error>> {
    let reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let file: ScenarioFile = serde_json::from_reader(reader)?;
    Ok(file.scenarios)
}

/// Configured sources for `graph_id`, as the solver's (node, injection)
/// pairs. `None` means the caller synthesizes the default scenario.
#[must_use]
pub fn sources_for(scenarios: &[ScenarioSpec], graph_id: &str) -> Option<Vec<(usize, f64)>> {
    scenarios
        .iter()
        .find(|s| s.graph_id == graph_id)
        .map(|s| s.sources.iter().map(|src| (src.node, src.injection)).collect())
}

/// Persisted spectral summary for one graph.
#[derive(Debug, Clone, Serialize)]
pub struct SpectralRecord {
    pub graph_id: String,
    pub n: usize,
    pub rho: f64,
    pub lambda1: Option<f64>,
    pub lambdas: Vec<f64>,
    pub k_used: usize,
    pub tol: f64,
    pub note: String,
}

impl SpectralRecord {
    #[must_use]
    pub fn new(graph: &WeightedGraph, result: &SpectralResult) -> Self {
        Self {
            graph_id: graph.id.clone(),
            n: graph.n(),
            rho: graph.rho,
            lambda1: result.lambda1,
            lambdas: result.lambdas.clone(),
            k_used: result.k_used,
            tol: result.tol,
            note: result.note.clone(),
        }
    }
}

/// Persisted effective-resistance payload for one graph.
#[derive(Debug, Clone, Serialize)]
pub struct ResistanceRecord {
    pub graph_id: String,
    pub n: usize,
    pub rho: f64,
    pub edges: Vec<EdgeResistance>,
    pub stats: ResistanceStats,
}

/// Persisted Fenchel scenario outcome for one graph.
#[derive(Debug, Clone, Serialize)]
pub struct FenchelRecord {
    pub graph_id: String,
    pub n: usize,
    pub rho: f64,
    pub sources: Vec<SourceSpec>,
    pub energy: f64,
    pub strategy: SolveStrategy,
    pub iterations: usize,
    pub balance_corrected: bool,
}

impl FenchelRecord {
    #[must_use]
    pub fn new(graph: &WeightedGraph, sources: &[(usize, f64)], outcome: &FenchelOutcome) -> Self {
        Self {
            graph_id: graph.id.clone(),
            n: graph.n(),
            rho: graph.rho,
            sources: sources
                .iter()
                .map(|&(node, injection)| SourceSpec { node, injection })
                .collect(),
            energy: outcome.energy,
            strategy: outcome.strategy,
            iterations: outcome.iterations,
            balance_corrected: outcome.balance_corrected,
        }
    }
}

/// Write `value` as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Directory creation, serialization, or write failure.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
