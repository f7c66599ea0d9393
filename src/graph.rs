// SPDX-License-Identifier: AGPL-3.0-only

//! Weighted undirected graphs and their derived operators.
//!
//! A [`WeightedGraph`] carries per-node weights and per-edge conductances
//! and derives the combinatorial Laplacian L (CSR or dense) and the signed
//! incidence system (B, C) with L = BᵀCB. Graphs are validated on
//! construction and immutable afterwards; every solver takes them
//! read-only.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::TesaError;
use crate::spectral::operator::CsrMatrix;

/// One undirected edge with a positive conductance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub conductance: f64,
}

impl Edge {
    #[must_use]
    pub const fn unit(u: usize, v: usize) -> Self {
        Self {
            u,
            v,
            conductance: 1.0,
        }
    }
}

/// Weighted undirected graph over nodes 0..n−1.
///
/// `rho` is the uniform Laplacian renormalization applied by the spectral
/// stage (exactly once); resistance and energy computations use the raw
/// Laplacian.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    pub id: String,
    pub family: String,
    pub rho: f64,
    pub weights: Vec<f64>,
    pub edges: Vec<Edge>,
}

impl WeightedGraph {
    /// Build and validate a graph. Node count is `weights.len()`.
    ///
    /// # Errors
    ///
    /// `Structure` if an edge endpoint is out of range, an edge is a
    /// self-loop, or a conductance is not finite and positive.
    /// `EmptyGraph` if there are no nodes.
    pub fn new(
        id: impl Into<String>,
        weights: Vec<f64>,
        edges: Vec<Edge>,
    ) -> Result<Self, TesaError> {
        let g = Self {
            id: id.into(),
            family: String::new(),
            rho: 1.0,
            weights,
            edges,
        };
        g.validate()?;
        Ok(g)
    }

    /// Unit-weight, unit-conductance graph from bare edge pairs.
    ///
    /// # Errors
    ///
    /// Same validation as [`WeightedGraph::new`].
    pub fn unit(
        id: impl Into<String>,
        n: usize,
        pairs: &[(usize, usize)],
    ) -> Result<Self, TesaError> {
        let edges = pairs.iter().map(|&(u, v)| Edge::unit(u, v)).collect();
        Self::new(id, vec![1.0; n], edges)
    }

    #[must_use]
    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    #[must_use]
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    fn validate(&self) -> Result<(), TesaError> {
        let n = self.weights.len();
        if n == 0 {
            return Err(TesaError::EmptyGraph {
                nodes: 0,
                edges: self.edges.len(),
            });
        }
        for e in &self.edges {
            if e.u >= n || e.v >= n {
                return Err(TesaError::Structure(format!(
                    "edge ({}, {}) references a node outside 0..{n}",
                    e.u, e.v
                )));
            }
            if e.u == e.v {
                return Err(TesaError::Structure(format!(
                    "self-loop at node {} is not allowed",
                    e.u
                )));
            }
            if !(e.conductance.is_finite() && e.conductance > 0.0) {
                return Err(TesaError::Structure(format!(
                    "edge ({}, {}) has non-positive conductance {}",
                    e.u, e.v, e.conductance
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn n(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn m(&self) -> usize {
        self.edges.len()
    }

    /// Combinatorial Laplacian in CSR form.
    ///
    /// Per edge (u, v, c): +c on both diagonal entries, −c on both
    /// off-diagonals. Symmetric, PSD, zero row sums by construction.
    #[must_use]
    pub fn laplacian(&self) -> CsrMatrix {
        let n = self.n();
        let mut rows: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        for e in &self.edges {
            let c = e.conductance;
            *rows[e.u].entry(e.u).or_insert(0.0) += c;
            *rows[e.v].entry(e.v).or_insert(0.0) += c;
            *rows[e.u].entry(e.v).or_insert(0.0) -= c;
            *rows[e.v].entry(e.u).or_insert(0.0) -= c;
        }
        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for row in &rows {
            for (&j, &v) in row {
                col_idx.push(j);
                values.push(v);
            }
            row_ptr.push(col_idx.len());
        }
        CsrMatrix {
            n,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Dense row-major Laplacian (used by the small-graph pinv path and
    /// the δ gap estimator).
    #[must_use]
    pub fn laplacian_dense(&self) -> Vec<f64> {
        let n = self.n();
        let mut l = vec![0.0; n * n];
        for e in &self.edges {
            let c = e.conductance;
            l[e.u * n + e.u] += c;
            l[e.v * n + e.v] += c;
            l[e.u * n + e.v] -= c;
            l[e.v * n + e.u] -= c;
        }
        l
    }

    /// Signed incidence system: row-major m×n matrix B (+1 at u, −1 at v
    /// per edge row) and the conductance diagonal, with L = BᵀCB.
    #[must_use]
    pub fn incidence(&self) -> (Vec<f64>, Vec<f64>) {
        let (n, m) = (self.n(), self.m());
        let mut b = vec![0.0; m * n];
        let mut c = vec![0.0; m];
        for (row, e) in self.edges.iter().enumerate() {
            b[row * n + e.u] = 1.0;
            b[row * n + e.v] = -1.0;
            c[row] = e.conductance;
        }
        (b, c)
    }

    #[must_use]
    pub fn degrees(&self) -> Vec<usize> {
        let mut deg = vec![0usize; self.n()];
        for e in &self.edges {
            deg[e.u] += 1;
            deg[e.v] += 1;
        }
        deg
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    #[must_use]
    pub fn total_conductance(&self) -> f64 {
        self.edges.iter().map(|e| e.conductance).sum()
    }

    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        let deg = self.degrees();
        let (dmin, dmax) = deg
            .iter()
            .fold((usize::MAX, 0), |(lo, hi), &d| (lo.min(d), hi.max(d)));
        let dmean = if deg.is_empty() {
            0.0
        } else {
            deg.iter().sum::<usize>() as f64 / deg.len() as f64
        };
        GraphSummary {
            id: self.id.clone(),
            family: self.family.clone(),
            n: self.n(),
            m: self.m(),
            rho: self.rho,
            degree_min: if deg.is_empty() { 0 } else { dmin },
            degree_max: dmax,
            degree_mean: dmean,
            total_weight: self.total_weight(),
            total_conductance: self.total_conductance(),
        }
    }
}

/// Structural digest of one graph, serialized alongside batch records.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    pub id: String,
    pub family: String,
    pub n: usize,
    pub m: usize,
    pub rho: f64,
    pub degree_min: usize,
    pub degree_max: usize,
    pub degree_mean: f64,
    pub total_weight: f64,
    pub total_conductance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tolerances::EXACT_F64;

    fn path3() -> WeightedGraph {
        WeightedGraph::unit("path3", 3, &[(0, 1), (1, 2)]).unwrap()
    }

    #[test]
    fn laplacian_rows_sum_to_zero() {
        let lap = path3().laplacian();
        let x = vec![1.0; 3];
        let mut y = vec![0.0; 3];
        lap.spmv(&x, &mut y);
        for yi in y {
            assert!(yi.abs() < EXACT_F64);
        }
    }

    #[test]
    fn laplacian_dense_matches_csr() {
        let g = WeightedGraph::new(
            "w",
            vec![1.0, 1.0, 1.0],
            vec![
                Edge {
                    u: 0,
                    v: 1,
                    conductance: 2.0,
                },
                Edge {
                    u: 1,
                    v: 2,
                    conductance: 0.5,
                },
            ],
        )
        .unwrap();
        let dense = g.laplacian_dense();
        let csr = g.laplacian().to_dense();
        for (a, b) in dense.iter().zip(csr.iter()) {
            assert!((a - b).abs() < EXACT_F64);
        }
        // spot-check the weighted entries
        assert!((dense[0] - 2.0).abs() < EXACT_F64);
        assert!((dense[4] - 2.5).abs() < EXACT_F64);
        assert!((dense[5] - -0.5).abs() < EXACT_F64);
    }

    #[test]
    fn incidence_factors_laplacian() {
        let g = WeightedGraph::new(
            "f",
            vec![1.0; 4],
            vec![
                Edge {
                    u: 0,
                    v: 1,
                    conductance: 1.5,
                },
                Edge {
                    u: 1,
                    v: 2,
                    conductance: 2.0,
                },
                Edge {
                    u: 2,
                    v: 3,
                    conductance: 0.75,
                },
                Edge {
                    u: 0,
                    v: 3,
                    conductance: 1.0,
                },
            ],
        )
        .unwrap();
        let (n, m) = (g.n(), g.m());
        let (b, c) = g.incidence();
        // Bᵀ C B, dense
        let mut btcb = vec![0.0; n * n];
        for row in 0..m {
            for i in 0..n {
                for j in 0..n {
                    btcb[i * n + j] += b[row * n + i] * c[row] * b[row * n + j];
                }
            }
        }
        let lap = g.laplacian_dense();
        for (a, bb) in lap.iter().zip(btcb.iter()) {
            assert!((a - bb).abs() < EXACT_F64);
        }
    }

    #[test]
    fn dangling_edge_rejected() {
        let err = WeightedGraph::unit("bad", 3, &[(0, 9)]).unwrap_err();
        assert!(matches!(err, TesaError::Structure(_)));
    }

    #[test]
    fn self_loop_rejected() {
        let err = WeightedGraph::unit("loop", 3, &[(1, 1)]).unwrap_err();
        assert!(matches!(err, TesaError::Structure(_)));
    }

    #[test]
    fn zero_conductance_rejected() {
        let err = WeightedGraph::new(
            "zc",
            vec![1.0, 1.0],
            vec![Edge {
                u: 0,
                v: 1,
                conductance: 0.0,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, TesaError::Structure(_)));
    }

    #[test]
    fn empty_graph_rejected() {
        let err = WeightedGraph::new("none", vec![], vec![]).unwrap_err();
        assert!(matches!(err, TesaError::EmptyGraph { nodes: 0, .. }));
    }

    #[test]
    fn summary_degrees() {
        let s = WeightedGraph::unit("star", 5, &[(0, 1), (0, 2), (0, 3), (0, 4)])
            .unwrap()
            .with_family("catalog")
            .summary();
        assert_eq!(s.n, 5);
        assert_eq!(s.m, 4);
        assert_eq!(s.degree_min, 1);
        assert_eq!(s.degree_max, 4);
        assert!((s.degree_mean - 1.6).abs() < EXACT_F64);
        assert!((s.total_conductance - 4.0).abs() < EXACT_F64);
    }
}
