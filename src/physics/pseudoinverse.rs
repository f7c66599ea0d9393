// SPDX-License-Identifier: AGPL-3.0-only

//! Moore-Penrose pseudoinverse of a graph Laplacian and the effective
//! resistances derived from it.
//!
//! L has rank n−1 with the constant vector spanning its kernel. Small
//! graphs get the exact dense route (Jacobi eigendecomposition, invert
//! the spectrum above the cutoff); larger graphs get a truncated Lanczos
//! route that reassembles L⁺ from the smallest Ritz pairs, falling back
//! to dense if the recurrence degenerates. Both paths use the raw
//! Laplacian; ρ renormalization belongs to the spectral stage only.

use serde::Serialize;

use crate::error::TesaError;
use crate::graph::WeightedGraph;
use crate::spectral::jacobi::jacobi_eigh;
use crate::spectral::lanczos::lanczos;
use crate::spectral::tridiag::eigen_tridiagonal;
use crate::tolerances::{PINV_DENSE_MAX_N, PINV_EIGENVALUE_CUTOFF, PINV_TRUNCATED_EIGENPAIRS};

/// Symmetric n×n pseudoinverse, row-major.
#[derive(Debug, Clone)]
pub struct Pseudoinverse {
    pub n: usize,
    pub data: Vec<f64>,
}

impl Pseudoinverse {
    #[must_use]
    pub fn entry(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// R(i,j) = L⁺ᵢᵢ + L⁺ⱼⱼ − 2·L⁺ᵢⱼ. Symmetric, zero on the diagonal;
    /// tiny rounding negatives are reported as-is.
    #[must_use]
    pub fn effective_resistance(&self, i: usize, j: usize) -> f64 {
        self.entry(i, i) + self.entry(j, j) - 2.0 * self.entry(i, j)
    }
}

/// L⁺ for a graph Laplacian. Dense route for n ≤ 200, truncated Lanczos
/// route above that. `seed` feeds the truncated route's start vector.
#[must_use]
pub fn pseudoinverse(graph: &WeightedGraph, seed: u64) -> Pseudoinverse {
    let n = graph.n();
    let data = if n <= PINV_DENSE_MAX_N {
        pinv_dense(&graph.laplacian_dense(), n)
    } else {
        pinv_truncated(graph, seed).unwrap_or_else(|| pinv_dense(&graph.laplacian_dense(), n))
    };
    Pseudoinverse { n, data }
}

/// Exact dense route: full eigendecomposition, invert eigenvalues above
/// the cutoff, zero the rest, reassemble VΛ⁺Vᵀ.
fn pinv_dense(lap: &[f64], n: usize) -> Vec<f64> {
    let (vals, vecs) = jacobi_eigh(lap, n);
    let inv: Vec<f64> = vals
        .iter()
        .map(|&v| if v > PINV_EIGENVALUE_CUTOFF { 1.0 / v } else { 0.0 })
        .collect();

    let mut out = vec![0.0; n * n];
    for k in 0..n {
        if inv[k] == 0.0 {
            continue;
        }
        for i in 0..n {
            let vik = vecs[i * n + k] * inv[k];
            if vik == 0.0 {
                continue;
            }
            for j in 0..n {
                out[i * n + j] += vik * vecs[j * n + k];
            }
        }
    }
    out
}

/// Truncated route: Lanczos on the raw Laplacian, Ritz pairs from the
/// tridiagonal QL decomposition, L⁺ ≈ Σ θ⁻¹·y·yᵀ over pairs above the
/// cutoff. `None` when the recurrence or the QL step degenerates (the
/// caller falls back to dense).
fn pinv_truncated(graph: &WeightedGraph, seed: u64) -> Option<Vec<f64>> {
    let n = graph.n();
    let k_eff = PINV_TRUNCATED_EIGENPAIRS.min(n - 1);
    let sweep = (4 * k_eff).min(n);

    let lap = graph.laplacian();
    let tri = lanczos(&lap, sweep, seed);
    if tri.iterations == 0 || !tri.is_finite() {
        return None;
    }

    let steps = tri.iterations;
    let off = &tri.beta[..steps.saturating_sub(1)];
    let (theta, z) = eigen_tridiagonal(&tri.alpha, off)?;

    let pairs = k_eff.min(steps);
    let mut out = vec![0.0; n * n];
    for j in 0..pairs {
        if !(theta[j].is_finite() && theta[j] > PINV_EIGENVALUE_CUTOFF) {
            continue;
        }
        // Ritz vector y = Σ_i basis_i · z[i, j]
        let mut y = vec![0.0; n];
        for (i, basis_vec) in tri.basis.iter().enumerate().take(steps) {
            let zij = z[i * steps + j];
            for (yi, bi) in y.iter_mut().zip(basis_vec.iter()) {
                *yi += zij * bi;
            }
        }
        let w = 1.0 / theta[j];
        for a in 0..n {
            let ya = y[a] * w;
            for b in 0..n {
                out[a * n + b] += ya * y[b];
            }
        }
    }
    Some(out)
}

/// Effective resistance of one edge, with its conductance carried along
/// for the record.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeResistance {
    pub u: usize,
    pub v: usize,
    pub effective_resistance: f64,
    pub conductance: f64,
}

/// Summary statistics over a batch of edge resistances. Median follows
/// the interpolated convention (mean of the two middle values for even
/// counts), matching the control scripts.
#[derive(Debug, Clone, Serialize)]
pub struct ResistanceStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Per-edge effective resistances plus summary statistics.
///
/// # Errors
///
/// `EmptyGraph` when the graph has no edges.
pub fn edge_resistances(
    graph: &WeightedGraph,
    seed: u64,
) -> Result<(Vec<EdgeResistance>, ResistanceStats), TesaError> {
    if graph.m() == 0 {
        return Err(TesaError::EmptyGraph {
            nodes: graph.n(),
            edges: 0,
        });
    }

    let pinv = pseudoinverse(graph, seed);
    let edges: Vec<EdgeResistance> = graph
        .edges
        .iter()
        .map(|e| EdgeResistance {
            u: e.u,
            v: e.v,
            effective_resistance: pinv.effective_resistance(e.u, e.v),
            conductance: e.conductance,
        })
        .collect();

    let mut values: Vec<f64> = edges.iter().map(|e| e.effective_resistance).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let len = values.len();
    let median = if len % 2 == 1 {
        values[len / 2]
    } else {
        0.5 * (values[len / 2 - 1] + values[len / 2])
    };
    let stats = ResistanceStats {
        min: values[0],
        max: values[len - 1],
        mean: values.iter().sum::<f64>() / len as f64,
        median,
    };

    Ok((edges, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path3() -> WeightedGraph {
        WeightedGraph::unit("p3", 3, &[(0, 1), (1, 2)]).unwrap()
    }

    #[test]
    fn satisfies_penrose_identity() {
        // L · L⁺ · L = L
        let g = path3();
        let n = g.n();
        let lap = g.laplacian_dense();
        let pinv = pseudoinverse(&g, 42);

        let mut llp = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                llp[i * n + j] = (0..n).map(|k| lap[i * n + k] * pinv.entry(k, j)).sum();
            }
        }
        for i in 0..n {
            for j in 0..n {
                let lplj: f64 = (0..n).map(|k| llp[i * n + k] * lap[k * n + j]).sum();
                assert!((lplj - lap[i * n + j]).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn kernel_maps_to_zero() {
        let g = path3();
        let pinv = pseudoinverse(&g, 42);
        for i in 0..3 {
            let row_sum: f64 = (0..3).map(|j| pinv.entry(i, j)).sum();
            assert!(row_sum.abs() < 1e-8, "L⁺·1 ≠ 0 at row {i}");
        }
    }

    #[test]
    fn path_resistance_is_hop_count() {
        // Unit path: R(0,1) = 1, R(0,2) = 2 (series resistors).
        let pinv = pseudoinverse(&path3(), 42);
        assert!((pinv.effective_resistance(0, 1) - 1.0).abs() < 1e-8);
        assert!((pinv.effective_resistance(1, 2) - 1.0).abs() < 1e-8);
        assert!((pinv.effective_resistance(0, 2) - 2.0).abs() < 1e-8);
    }

    #[test]
    fn resistance_symmetric_zero_diagonal() {
        let g = WeightedGraph::unit("sq", 4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let pinv = pseudoinverse(&g, 42);
        for i in 0..4 {
            assert!(pinv.effective_resistance(i, i).abs() < 1e-10);
            for j in 0..4 {
                let rij = pinv.effective_resistance(i, j);
                let rji = pinv.effective_resistance(j, i);
                assert!((rij - rji).abs() < 1e-10);
                assert!(rij > -1e-8);
            }
        }
    }

    #[test]
    fn cycle_resistance_parallel_paths() {
        // 4-cycle, unit conductance: R across one edge = (1·3)/(1+3) = 3/4.
        let g = WeightedGraph::unit("c4", 4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let pinv = pseudoinverse(&g, 42);
        assert!((pinv.effective_resistance(0, 1) - 0.75).abs() < 1e-8);
        // Across the diagonal: two 2-hop paths in parallel = 1.0.
        assert!((pinv.effective_resistance(0, 2) - 1.0).abs() < 1e-8);
    }

    #[test]
    fn conductance_scales_resistance_inversely() {
        let g = WeightedGraph::new(
            "w2",
            vec![1.0, 1.0],
            vec![crate::graph::Edge {
                u: 0,
                v: 1,
                conductance: 4.0,
            }],
        )
        .unwrap();
        let pinv = pseudoinverse(&g, 42);
        assert!((pinv.effective_resistance(0, 1) - 0.25).abs() < 1e-8);
    }

    #[test]
    fn batch_stats_median_even_count() {
        let (edges, stats) = edge_resistances(&path3(), 42).unwrap();
        assert_eq!(edges.len(), 2);
        // Both edges have R = 1, so all stats collapse to 1.
        assert!((stats.min - 1.0).abs() < 1e-8);
        assert!((stats.max - 1.0).abs() < 1e-8);
        assert!((stats.mean - 1.0).abs() < 1e-8);
        assert!((stats.median - 1.0).abs() < 1e-8);
    }

    #[test]
    fn batch_rejects_edgeless_graph() {
        let g = WeightedGraph::new("lonely", vec![1.0, 1.0], vec![]).unwrap();
        let err = edge_resistances(&g, 42).unwrap_err();
        assert!(matches!(err, TesaError::EmptyGraph { edges: 0, .. }));
    }

    #[test]
    fn dense_path_is_deterministic() {
        let a = pseudoinverse(&path3(), 42);
        let b = pseudoinverse(&path3(), 42);
        for (x, y) in a.data.iter().zip(b.data.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
}
