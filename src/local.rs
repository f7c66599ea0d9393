// SPDX-License-Identifier: AGPL-3.0-only

//! Per-place local invariants C_Type on the fixed template catalog.
//!
//! Each place carries one small template graph (D4..E8), a table-driven
//! penalty K_v by residue characteristic, and a tame base weight. The
//! invariant is the discrete Dirichlet energy of a hop-distance potential
//! profile plus the penalty:
//!
//!   f_v   = tame·(1 + K_v) / max(c, floor)
//!   φ(k)  = (i0 − dist(k, ref)) · max(f_v, floor)   (unreachable → 0)
//!   E     = Σ_edges ½·c·(φ_u − φ_v)²
//!   C_Type = E + K_v
//!
//! Tables and template edge lists are frozen data, never computed; the
//! caller looks K_v up and passes it in explicitly.

use std::collections::VecDeque;

use serde::Serialize;

use crate::error::TesaError;
use crate::graph::WeightedGraph;
use crate::tolerances::CONDUCTANCE_FLOOR;

/// The closed template catalog. Edge lists are data; exhaustiveness of
/// every lookup is compiler-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LocalGraphType {
    D4,
    D5,
    D6,
    E6,
    E7,
    E8,
}

impl LocalGraphType {
    pub const ALL: [Self; 6] = [Self::D4, Self::D5, Self::D6, Self::E6, Self::E7, Self::E8];

    /// Case-insensitive parse, surrounding whitespace ignored.
    ///
    /// # Errors
    ///
    /// `Invariant` for a code outside the catalog.
    pub fn parse(code: &str) -> Result<Self, TesaError> {
        match code.trim().to_uppercase().as_str() {
            "D4" => Ok(Self::D4),
            "D5" => Ok(Self::D5),
            "D6" => Ok(Self::D6),
            "E6" => Ok(Self::E6),
            "E7" => Ok(Self::E7),
            "E8" => Ok(Self::E8),
            other => Err(TesaError::Invariant(format!(
                "unknown template type {other:?} (catalog: D4 D5 D6 E6 E7 E8)"
            ))),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::D4 => "D4",
            Self::D5 => "D5",
            Self::D6 => "D6",
            Self::E6 => "E6",
            Self::E7 => "E7",
            Self::E8 => "E8",
        }
    }

    #[must_use]
    pub const fn node_count(self) -> usize {
        match self {
            Self::D4 => 5,
            Self::D5 | Self::E6 => 6,
            Self::D6 | Self::E7 => 7,
            Self::E8 => 8,
        }
    }

    /// Fixed edge list: D-types are a 4-star with a growing tail, E-types
    /// a chain with one branch.
    #[must_use]
    pub const fn edge_pairs(self) -> &'static [(usize, usize)] {
        match self {
            Self::D4 => &[(0, 1), (0, 2), (0, 3), (0, 4)],
            Self::D5 => &[(0, 1), (0, 2), (0, 3), (0, 4), (4, 5)],
            Self::D6 => &[(0, 1), (0, 2), (0, 3), (0, 4), (4, 5), (5, 6)],
            Self::E6 => &[(0, 1), (1, 2), (2, 3), (3, 4), (2, 5)],
            Self::E7 => &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (3, 6)],
            Self::E8 => &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (2, 7)],
        }
    }

    /// Tame base weight f_v^tame.
    #[must_use]
    pub const fn tame_weight(self) -> f64 {
        match self {
            Self::D4 => 0.80,
            Self::D5 => 0.85,
            Self::D6 => 0.90,
            Self::E6 => 0.95,
            Self::E7 => 1.00,
            Self::E8 => 1.05,
        }
    }

    /// Template graph with unit node weights and uniform conductance.
    ///
    /// # Errors
    ///
    /// `Structure` when the conductance is not finite and positive.
    pub fn graph(self, conductance: f64) -> Result<WeightedGraph, TesaError> {
        let edges = self
            .edge_pairs()
            .iter()
            .map(|&(u, v)| crate::graph::Edge { u, v, conductance })
            .collect();
        WeightedGraph::new(self.name(), vec![1.0; self.node_count()], edges)
    }
}

/// Residue characteristics that carry a non-trivial penalty row.
pub const KV_PRIMES: [u64; 4] = [2, 3, 5, 7];

/// Table-driven penalty K_v by residue characteristic and template.
/// Unlisted primes carry no penalty.
#[must_use]
pub fn kv_lookup(prime: u64, template: LocalGraphType) -> f64 {
    use LocalGraphType::{D4, D5, D6, E6, E7, E8};
    match (prime, template) {
        (2, D4) => 0.15,
        (2, D5) => 0.18,
        (2, D6) => 0.20,
        (2, E6) => 0.22,
        (2, E7) => 0.25,
        (2, E8) => 0.28,
        (3, D4) => 0.10,
        (3, D5) => 0.12,
        (3, D6) => 0.14,
        (3, E6) => 0.16,
        (3, E7) => 0.18,
        (3, E8) => 0.20,
        _ => 0.0,
    }
}

/// Amplitude f_v = tame·(1 + K_v)/max(c, floor).
#[must_use]
pub fn amplitude(template: LocalGraphType, k_v: f64, conductance: f64) -> f64 {
    template.tame_weight() * (1.0 + k_v) / conductance.max(CONDUCTANCE_FLOOR)
}

/// Unweighted BFS hop distances from `reference`; `None` marks nodes in
/// other components.
#[must_use]
pub fn hop_distances(graph: &WeightedGraph, reference: usize) -> Vec<Option<usize>> {
    let n = graph.n();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for e in &graph.edges {
        adjacency[e.u].push(e.v);
        adjacency[e.v].push(e.u);
    }

    let mut dist = vec![None; n];
    if reference >= n {
        return dist;
    }
    dist[reference] = Some(0);
    let mut queue = VecDeque::from([reference]);
    while let Some(node) = queue.pop_front() {
        let d = dist[node].unwrap_or(0) + 1;
        for &next in &adjacency[node] {
            if dist[next].is_none() {
                dist[next] = Some(d);
                queue.push_back(next);
            }
        }
    }
    dist
}

/// Potential profile φ(k) = (i0 − dist)·max(amplitude, floor).
/// Unreachable nodes get exactly 0.
#[must_use]
pub fn potential_profile(
    graph: &WeightedGraph,
    i0: i64,
    amplitude: f64,
    reference: usize,
) -> Vec<f64> {
    let scale = amplitude.max(CONDUCTANCE_FLOOR);
    hop_distances(graph, reference)
        .into_iter()
        .map(|d| match d {
            Some(hops) => (i0 as f64 - hops as f64) * scale,
            None => 0.0,
        })
        .collect()
}

/// Discrete Dirichlet energy Σ ½·c·(φ_u − φ_v)².
#[must_use]
pub fn dirichlet_energy(graph: &WeightedGraph, phi: &[f64]) -> f64 {
    graph
        .edges
        .iter()
        .map(|e| 0.5 * e.conductance * (phi[e.u] - phi[e.v]).powi(2))
        .sum()
}

/// One place's computed invariant, in control-script column order.
#[derive(Debug, Clone, Serialize)]
pub struct LocalInvariant {
    pub name: &'static str,
    pub n: usize,
    pub i0: i64,
    pub k_v: f64,
    pub conductance: f64,
    pub f_v_tame: f64,
    pub f_v: f64,
    pub e_fenchel: f64,
    pub c_type: f64,
}

/// Assemble C_Type for one place. The reference node for the potential
/// profile is node 0 of the template.
///
/// # Errors
///
/// `Structure` for a bad conductance; `Invariant` when the template is
/// degenerate or the energy comes out non-finite.
pub fn compute_c_type(
    template: LocalGraphType,
    i0: i64,
    k_v: f64,
    conductance: f64,
) -> Result<LocalInvariant, TesaError> {
    let graph = template.graph(conductance)?;
    if graph.n() < 1 || graph.m() < 1 {
        return Err(TesaError::Invariant(format!(
            "template {} is degenerate: {} nodes / {} edges",
            template.name(),
            graph.n(),
            graph.m()
        )));
    }

    let f_v = amplitude(template, k_v, conductance);
    let phi = potential_profile(&graph, i0, f_v, 0);
    let e_fenchel = dirichlet_energy(&graph, &phi);
    let c_type = e_fenchel + k_v;

    if !(e_fenchel.is_finite() && c_type.is_finite()) {
        return Err(TesaError::Invariant(format!(
            "non-finite invariant for {}: E = {e_fenchel}, C_Type = {c_type}",
            template.name()
        )));
    }

    Ok(LocalInvariant {
        name: template.name(),
        n: graph.n(),
        i0,
        k_v,
        conductance,
        f_v_tame: template.tame_weight(),
        f_v,
        e_fenchel,
        c_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn d4_baseline_values() {
        // f_v = 0.80·1.15 = 0.92; all four edges drop one hop:
        // E = 4·½·0.92² = 1.6928; C_Type = E + 0.15.
        let inv = compute_c_type(LocalGraphType::D4, 3, 0.15, 1.0).unwrap();
        assert!((inv.f_v - 0.92).abs() < 1e-12);
        assert!((inv.e_fenchel - 1.6928).abs() < 1e-10);
        assert!((inv.c_type - 1.8428).abs() < 1e-10);
        assert_eq!(inv.n, 5);
    }

    #[test]
    fn e6_baseline_values() {
        // f_v = 0.95·1.22 = 1.159; five edges, each Δφ = f_v:
        // E = 5·½·1.159² = 3.3582025.
        let inv = compute_c_type(LocalGraphType::E6, 3, 0.22, 1.0).unwrap();
        assert!((inv.f_v - 1.159).abs() < 1e-12);
        assert!((inv.e_fenchel - 3.3582025).abs() < 1e-10);
        assert!((inv.c_type - 3.5782025).abs() < 1e-10);
    }

    #[test]
    fn i0_changes_nothing_on_uniform_drop_templates() {
        // Every catalog edge joins nodes one hop apart, so Δφ is i0-free;
        // shifting i0 shifts φ uniformly and the energy is unchanged.
        let a = compute_c_type(LocalGraphType::D4, 3, 0.15, 1.0).unwrap();
        let b = compute_c_type(LocalGraphType::D4, 7, 0.15, 1.0).unwrap();
        assert!((a.e_fenchel - b.e_fenchel).abs() < 1e-12);
    }

    #[test]
    fn deterministic_bit_identical() {
        let a = compute_c_type(LocalGraphType::E8, 3, 0.28, 1.0).unwrap();
        let b = compute_c_type(LocalGraphType::E8, 3, 0.28, 1.0).unwrap();
        assert_eq!(a.c_type.to_bits(), b.c_type.to_bits());
        assert_eq!(a.e_fenchel.to_bits(), b.e_fenchel.to_bits());
    }

    #[test]
    fn conductance_floor_guards_division() {
        // Tiny conductance inflates f_v but stays finite.
        let inv = compute_c_type(LocalGraphType::D4, 3, 0.15, 1e-12).unwrap();
        assert!(inv.f_v.is_finite());
        assert!(inv.c_type.is_finite());
        assert!(inv.f_v > 1e8);
    }

    #[test]
    fn bad_conductance_rejected() {
        assert!(compute_c_type(LocalGraphType::D4, 3, 0.15, 0.0).is_err());
        assert!(compute_c_type(LocalGraphType::D4, 3, 0.15, f64::NAN).is_err());
    }

    #[test]
    fn parse_is_forgiving_about_case_and_space() {
        assert_eq!(LocalGraphType::parse(" e8 ").unwrap(), LocalGraphType::E8);
        assert_eq!(LocalGraphType::parse("d4").unwrap(), LocalGraphType::D4);
        assert!(LocalGraphType::parse("Q9").is_err());
    }

    #[test]
    fn kv_table_rows() {
        assert!((kv_lookup(2, LocalGraphType::D4) - 0.15).abs() < 1e-12);
        assert!((kv_lookup(2, LocalGraphType::E8) - 0.28).abs() < 1e-12);
        assert!((kv_lookup(3, LocalGraphType::E6) - 0.16).abs() < 1e-12);
        assert_eq!(kv_lookup(5, LocalGraphType::D6), 0.0);
        assert_eq!(kv_lookup(7, LocalGraphType::E7), 0.0);
        assert_eq!(kv_lookup(11, LocalGraphType::D4), 0.0);
    }

    #[test]
    fn catalog_shapes() {
        for t in LocalGraphType::ALL {
            let g = t.graph(1.0).unwrap();
            assert_eq!(g.n(), t.node_count());
            assert_eq!(g.m(), t.edge_pairs().len());
            // Templates are trees: m = n − 1, all nodes reachable.
            assert_eq!(g.m(), g.n() - 1);
            let dist = hop_distances(&g, 0);
            assert!(dist.iter().all(Option::is_some), "{} disconnected", t.name());
        }
    }

    #[test]
    fn d5_tail_distances() {
        let g = LocalGraphType::D5.graph(1.0).unwrap();
        let d: Vec<usize> = hop_distances(&g, 0).into_iter().flatten().collect();
        assert_eq!(d, vec![0, 1, 1, 1, 1, 2]);
    }

    #[test]
    fn unreachable_nodes_get_exact_zero() {
        // A graph with an isolated node 3.
        let g = WeightedGraph::unit("iso", 4, &[(0, 1), (1, 2)]).unwrap();
        let phi = potential_profile(&g, 3, 1.0, 0);
        assert_eq!(phi[3].to_bits(), 0.0f64.to_bits());
        assert!((phi[0] - 3.0).abs() < 1e-12);
    }
}
