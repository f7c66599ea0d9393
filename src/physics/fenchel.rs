// SPDX-License-Identifier: AGPL-3.0-only

//! Fenchel (convex-dual) energy of a source injection.
//!
//! For injection b with Σb = 0, the dual of the Dirichlet energy ½xᵀLx
//! evaluates to ½·bᵀL⁺b = ½·bᵀx at the potential x solving Lx = b in the
//! mean-zero subspace. The solve runs a fixed fallback chain: CG on the
//! raw (singular) Laplacian, CG on the Tikhonov-shifted L + εI, then a
//! dense Cholesky on the shifted matrix. Exhausting the chain is the one
//! fatal error in the numerical core.

use serde::Serialize;

use super::cg::cg_solve;
use crate::error::TesaError;
use crate::graph::WeightedGraph;
use crate::spectral::operator::{LinearOperator, ShiftedOperator};
use crate::tolerances::{
    CG_MAX_ITER, CG_TOLERANCE, DAMPED_CG_MAX_ITER, FENCHEL_REGULARIZATION, SOURCE_BALANCE_ATOL,
};

/// One rung of the fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolveStrategy {
    Cg,
    DampedCg,
    DenseRegularized,
}

impl SolveStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cg => "cg",
            Self::DampedCg => "damped-cg",
            Self::DenseRegularized => "dense-regularized",
        }
    }
}

/// The chain, in the order it is tried. First success short-circuits.
pub const SOLVE_CHAIN: [SolveStrategy; 3] = [
    SolveStrategy::Cg,
    SolveStrategy::DampedCg,
    SolveStrategy::DenseRegularized,
];

/// A successful Fenchel solve: the energy plus which rung produced it.
#[derive(Debug, Clone)]
pub struct FenchelOutcome {
    pub energy: f64,
    pub strategy: SolveStrategy,
    pub iterations: usize,
    pub residual: f64,
    /// True when the raw injection did not sum to zero and was centered.
    pub balance_corrected: bool,
}

/// The two-terminal default scenario: +1 into the first node, −1 out of
/// the last.
#[must_use]
pub fn default_sources(graph: &WeightedGraph) -> Vec<(usize, f64)> {
    vec![(0, 1.0), (graph.n() - 1, -1.0)]
}

/// Fenchel energy of `sources` on `graph` (raw Laplacian) with the
/// default CG tolerance and iteration cap.
///
/// # Errors
///
/// - `EmptyGraph` when the graph has no edges.
/// - `Structure` when a source names a node outside the graph.
/// - `Solve` when every rung of [`SOLVE_CHAIN`] fails.
pub fn fenchel_energy(
    graph: &WeightedGraph,
    sources: &[(usize, f64)],
) -> Result<FenchelOutcome, TesaError> {
    fenchel_energy_with(graph, sources, CG_TOLERANCE, CG_MAX_ITER)
}

/// [`fenchel_energy`] with an explicit CG tolerance and first-rung
/// iteration cap. The damped rung keeps its own larger cap; the dense
/// rung has no iteration knob.
///
/// # Errors
///
/// Same as [`fenchel_energy`].
pub fn fenchel_energy_with(
    graph: &WeightedGraph,
    sources: &[(usize, f64)],
    tol: f64,
    max_iter: usize,
) -> Result<FenchelOutcome, TesaError> {
    let n = graph.n();
    if graph.m() == 0 {
        return Err(TesaError::EmptyGraph { nodes: n, edges: 0 });
    }

    let mut b = vec![0.0; n];
    for &(node, injection) in sources {
        if node >= n {
            return Err(TesaError::Structure(format!(
                "source references unknown node {node} (graph has {n} nodes)"
            )));
        }
        b[node] += injection;
    }

    let total: f64 = b.iter().sum();
    let balance_corrected = total.abs() > SOURCE_BALANCE_ATOL;
    if balance_corrected {
        let shift = total / n as f64;
        for bi in &mut b {
            *bi -= shift;
        }
    }

    // Unconditional mean-zero projection; idempotent after the balance
    // correction, and what makes the energy shift-invariant.
    let mean = b.iter().sum::<f64>() / n as f64;
    let b_proj: Vec<f64> = b.iter().map(|v| v - mean).collect();

    let lap = graph.laplacian();
    let mut last_failure = String::new();

    for &strategy in &SOLVE_CHAIN {
        match strategy {
            SolveStrategy::Cg => {
                let mut x = vec![0.0; n];
                let res = cg_solve(&lap, &mut x, &b_proj, tol, max_iter);
                if res.converged {
                    return Ok(outcome(
                        &b_proj,
                        &x,
                        strategy,
                        res.iterations,
                        res.final_residual,
                        balance_corrected,
                    ));
                }
                last_failure = format!(
                    "cg stalled at residual {:.3e} after {} iterations",
                    res.final_residual, res.iterations
                );
            }
            SolveStrategy::DampedCg => {
                let damped = ShiftedOperator::new(&lap, FENCHEL_REGULARIZATION);
                let mut x = vec![0.0; n];
                let res = cg_solve(&damped, &mut x, &b_proj, tol, DAMPED_CG_MAX_ITER);
                if res.converged {
                    return Ok(outcome(
                        &b_proj,
                        &x,
                        strategy,
                        res.iterations,
                        res.final_residual,
                        balance_corrected,
                    ));
                }
                last_failure = format!(
                    "damped cg stalled at residual {:.3e} after {} iterations",
                    res.final_residual, res.iterations
                );
            }
            SolveStrategy::DenseRegularized => {
                let mut dense = graph.laplacian_dense();
                for i in 0..n {
                    dense[i * n + i] += FENCHEL_REGULARIZATION;
                }
                match cholesky_solve(&dense, n, &b_proj) {
                    Ok(x) => {
                        let mut ax = vec![0.0; n];
                        lap.apply(&x, &mut ax);
                        let rnum: f64 = ax
                            .iter()
                            .zip(b_proj.iter())
                            .map(|(a, b)| (a - b) * (a - b))
                            .sum();
                        let rden: f64 = b_proj.iter().map(|v| v * v).sum();
                        let residual = if rden > 0.0 { (rnum / rden).sqrt() } else { 0.0 };
                        return Ok(outcome(
                            &b_proj,
                            &x,
                            strategy,
                            0,
                            residual,
                            balance_corrected,
                        ));
                    }
                    Err(reason) => last_failure = reason,
                }
            }
        }
    }

    Err(TesaError::Solve(last_failure))
}

fn outcome(
    b_proj: &[f64],
    x: &[f64],
    strategy: SolveStrategy,
    iterations: usize,
    residual: f64,
    balance_corrected: bool,
) -> FenchelOutcome {
    let energy = 0.5 * b_proj.iter().zip(x.iter()).map(|(b, xi)| b * xi).sum::<f64>();
    FenchelOutcome {
        energy,
        strategy,
        iterations,
        residual,
        balance_corrected,
    }
}

/// Dense SPD solve via Cholesky A = GGᵀ; the shifted Laplacian is SPD
/// for any ε > 0, so a non-positive pivot means broken input.
fn cholesky_solve(a: &[f64], n: usize, b: &[f64]) -> Result<Vec<f64>, String> {
    let mut g = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= g[i * n + k] * g[j * n + k];
            }
            if i == j {
                if !(sum.is_finite() && sum > 0.0) {
                    return Err(format!("cholesky pivot {sum:.3e} at column {j}"));
                }
                g[i * n + j] = sum.sqrt();
            } else {
                g[i * n + j] = sum / g[j * n + j];
            }
        }
    }

    // G y = b (forward), Gᵀ x = y (backward)
    let mut y = b.to_vec();
    for i in 0..n {
        for k in 0..i {
            let t = g[i * n + k] * y[k];
            y[i] -= t;
        }
        y[i] /= g[i * n + i];
    }
    let mut x = y;
    for i in (0..n).rev() {
        for k in (i + 1)..n {
            let t = g[k * n + i] * x[k];
            x[i] -= t;
        }
        x[i] /= g[i * n + i];
    }
    Ok(x)
}
