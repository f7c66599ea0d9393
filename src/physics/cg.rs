// SPDX-License-Identifier: AGPL-3.0-only

//! Conjugate Gradient for Laplacian systems.
//!
//! Standard CG with the relative residual convergence criterion
//! ||r||² / ||b||² < tol². The Fenchel stage runs it twice: on the raw
//! Laplacian (singular, but convergent for mean-zero b started from
//! zero) and, as a fallback, on the Tikhonov-shifted L + εI.
//!
//! # References
//!
//! - Hestenes & Stiefel (1952), original CG

use crate::spectral::operator::LinearOperator;

/// CG solver result.
#[derive(Clone, Debug)]
pub struct CgResult {
    pub converged: bool,
    pub iterations: usize,
    pub final_residual: f64,
    pub initial_residual: f64,
}

/// Solve A x = b by Conjugate Gradient; `x` is updated in place.
///
/// The operator must be symmetric positive semi-definite with b in its
/// range (or strictly positive definite, as the shifted fallback is).
pub fn cg_solve<A: LinearOperator>(
    op: &A,
    x: &mut [f64],
    b: &[f64],
    tol: f64,
    max_iter: usize,
) -> CgResult {
    let n = op.dim();

    // r = b - A x
    let mut ax = vec![0.0; n];
    op.apply(x, &mut ax);
    let mut r: Vec<f64> = b.iter().zip(ax.iter()).map(|(bi, ai)| bi - ai).collect();

    let b_norm_sq = dot(b, b);
    if b_norm_sq < 1e-30 {
        return CgResult {
            converged: true,
            iterations: 0,
            final_residual: 0.0,
            initial_residual: 0.0,
        };
    }

    let mut r_norm_sq = dot(&r, &r);
    let initial_residual = (r_norm_sq / b_norm_sq).sqrt();
    let tol_sq = tol * tol * b_norm_sq;

    if r_norm_sq < tol_sq {
        return CgResult {
            converged: true,
            iterations: 0,
            final_residual: initial_residual,
            initial_residual,
        };
    }

    // p = r
    let mut p = r.clone();
    let mut ap = vec![0.0; n];
    let mut iterations = 0;

    for iter in 0..max_iter {
        iterations = iter + 1;

        op.apply(&p, &mut ap);

        // alpha = <r|r> / <p|Ap>
        let p_ap = dot(&p, &ap);
        if p_ap.abs() < 1e-30 {
            break;
        }
        let alpha = r_norm_sq / p_ap;

        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * ap[i];
        }

        let r_norm_sq_new = dot(&r, &r);

        if r_norm_sq_new < tol_sq {
            r_norm_sq = r_norm_sq_new;
            break;
        }

        // beta = <r_new|r_new> / <r_old|r_old>
        let beta = r_norm_sq_new / r_norm_sq;
        r_norm_sq = r_norm_sq_new;

        for i in 0..n {
            p[i] = r[i] + beta * p[i];
        }
    }

    let final_residual = (r_norm_sq / b_norm_sq).sqrt();

    CgResult {
        converged: final_residual < tol,
        iterations,
        final_residual,
        initial_residual,
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::WeightedGraph;
    use crate::spectral::operator::ShiftedOperator;

    fn path3_lap() -> crate::spectral::operator::CsrMatrix {
        WeightedGraph::unit("p", 3, &[(0, 1), (1, 2)])
            .unwrap()
            .laplacian()
    }

    #[test]
    fn solves_singular_laplacian_for_mean_zero_rhs() {
        // L x = b with b ⊥ 1: CG from x₀ = 0 stays in the range space.
        let lap = path3_lap();
        let b = vec![1.0, 0.0, -1.0];
        let mut x = vec![0.0; 3];
        let res = cg_solve(&lap, &mut x, &b, 1e-10, 100);
        assert!(res.converged);

        let mut ax = vec![0.0; 3];
        lap.spmv(&x, &mut ax);
        for (ai, bi) in ax.iter().zip(b.iter()) {
            assert!((ai - bi).abs() < 1e-8);
        }
    }

    #[test]
    fn solves_shifted_system() {
        let lap = path3_lap();
        let op = ShiftedOperator::new(&lap, 1.0);
        // (L + I) x = b is SPD for any b
        let b = vec![2.0, -1.0, 4.0];
        let mut x = vec![0.0; 3];
        let res = cg_solve(&op, &mut x, &b, 1e-12, 100);
        assert!(res.converged);

        let mut ax = vec![0.0; 3];
        op.apply(&x, &mut ax);
        for (ai, bi) in ax.iter().zip(b.iter()) {
            assert!((ai - bi).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_rhs_returns_immediately() {
        let lap = path3_lap();
        let b = vec![0.0; 3];
        let mut x = vec![0.0; 3];
        let res = cg_solve(&lap, &mut x, &b, 1e-10, 100);
        assert!(res.converged);
        assert_eq!(res.iterations, 0);
    }

    #[test]
    fn reports_non_convergence() {
        let lap = path3_lap();
        // Mixes both nonzero eigenspaces, so one CG step cannot finish.
        let b = vec![2.0, -2.0, 0.0];
        let mut x = vec![0.0; 3];
        let res = cg_solve(&lap, &mut x, &b, 1e-14, 1);
        assert!(!res.converged);
        assert_eq!(res.iterations, 1);
        assert!(res.final_residual > 0.0);
    }
}
