// SPDX-License-Identifier: AGPL-3.0-only

//! Lanczos tridiagonalization for matrix-free symmetric eigensolve.
//!
//! Krylov subspace method with full reorthogonalization; eigenvalues via
//! Sturm bisection on the resulting tridiagonal matrix, eigenvectors (when
//! needed) via Ritz recombination of the stored basis.

use super::operator::LinearOperator;
use super::tridiag::find_all_eigenvalues;
use crate::tolerances::LANCZOS_BREAKDOWN_THRESHOLD;

/// Minimal LCG for reproducible start vectors (Knuth MMIX constants).
pub(crate) struct LcgRng(u64);

impl LcgRng {
    pub(crate) const fn new(seed: u64) -> Self {
        Self(seed.wrapping_add(1))
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0
    }

    /// Uniform in [0, 1) with 53-bit resolution.
    pub(crate) fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Result of the Lanczos algorithm: a tridiagonal representation of the
/// operator restricted to the Krylov subspace, plus the orthonormal basis
/// that built it.
pub struct LanczosTridiag {
    /// Diagonal elements α_j = ⟨v_j, A v_j⟩
    pub alpha: Vec<f64>,
    /// Off-diagonal elements β_j = ‖w_j‖
    pub beta: Vec<f64>,
    /// Lanczos vectors v_0..v_{k-1} (full reorthogonalization keeps them
    /// usable for Ritz vector recovery).
    pub basis: Vec<Vec<f64>>,
    /// Number of Lanczos iterations performed.
    pub iterations: usize,
}

impl LanczosTridiag {
    /// True when every recurrence coefficient is finite. A non-finite
    /// entry means the operator fed the recurrence inf/NaN; callers fall
    /// back or report the failure.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.alpha.iter().all(|a| a.is_finite()) && self.beta.iter().all(|b| b.is_finite())
    }
}

/// Lanczos tridiagonalization with full reorthogonalization.
///
/// Builds an m-step Krylov subspace for the symmetric operator A (applied
/// matrix-free). The eigenvalues of the resulting tridiagonal matrix
/// approximate the eigenvalues of A, extremal ones converging first; with
/// full reorthogonalization and m = dim(A) they are exact to machine
/// precision.
///
/// # Arguments
/// - `op`: symmetric operator (CSR Laplacian, projected Laplacian, …)
/// - `max_iter`: maximum Lanczos iterations (capped at the dimension)
/// - `seed`: PRNG seed for the initial random vector
///
/// # Provenance
/// Lanczos (1950), J. Res. Nat. Bur. Standards 45, 255
pub fn lanczos<A: LinearOperator>(op: &A, max_iter: usize, seed: u64) -> LanczosTridiag {
    let n = op.dim();
    let m = max_iter.min(n);

    let mut rng = LcgRng::new(seed);

    // Random starting vector, normalized
    let mut v: Vec<f64> = (0..n).map(|_| rng.uniform() - 0.5).collect();
    let norm = dot(&v, &v).sqrt();
    for x in &mut v {
        *x /= norm;
    }

    let mut alpha = Vec::with_capacity(m);
    let mut beta = Vec::with_capacity(m);

    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(m + 1);
    basis.push(v.clone());

    let mut v_prev = vec![0.0; n];
    let mut beta_prev = 0.0;
    let mut w = vec![0.0; n];

    for j in 0..m {
        // w = A * v_j
        op.apply(&v, &mut w);

        // w = w - β_j * v_{j-1}
        if j > 0 {
            for i in 0..n {
                w[i] -= beta_prev * v_prev[i];
            }
        }

        // α_j = ⟨w, v_j⟩
        let a_j = dot(&w, &v);
        alpha.push(a_j);

        // w = w - α_j * v_j
        for i in 0..n {
            w[i] -= a_j * v[i];
        }

        // Full reorthogonalization (Gram-Schmidt against all previous vectors)
        for prev in &basis {
            let proj = dot(&w, prev);
            for i in 0..n {
                w[i] -= proj * prev[i];
            }
        }

        // β_{j+1} = ‖w‖
        let b_next = dot(&w, &w).sqrt();

        if b_next < LANCZOS_BREAKDOWN_THRESHOLD {
            // Invariant subspace found; Lanczos has converged
            beta.push(0.0);
            break;
        }

        beta.push(b_next);

        // v_{j+1} = w / β_{j+1}
        v_prev.copy_from_slice(&v);
        beta_prev = b_next;
        for i in 0..n {
            v[i] = w[i] / b_next;
        }
        basis.push(v.clone());
    }

    LanczosTridiag {
        iterations: alpha.len(),
        alpha,
        beta,
        basis,
    }
}

/// Extract eigenvalues from a Lanczos tridiagonal via Sturm bisection.
#[must_use]
pub fn lanczos_eigenvalues(result: &LanczosTridiag) -> Vec<f64> {
    let m = result.iterations;
    if m == 0 {
        return Vec::new();
    }

    let off_diag: Vec<f64> = result.beta[..m.saturating_sub(1)].to_vec();
    find_all_eigenvalues(&result.alpha, &off_diag)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
