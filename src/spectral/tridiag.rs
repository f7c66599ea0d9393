// SPDX-License-Identifier: AGPL-3.0-only

//! Symmetric tridiagonal eigensolvers.
//!
//! Sturm bisection (LDLT sign counts) for eigenvalues, and implicit-shift
//! QL for full eigendecomposition when Ritz vectors are needed by the
//! truncated pseudoinverse path.

use crate::tolerances::TRIDIAG_STURM_PIVOT_GUARD;

/// Count eigenvalues of a symmetric tridiagonal matrix strictly less than λ.
///
/// Uses the LDLT factorization (Sturm sequence): the number of negative
/// pivots equals the number of eigenvalues below λ.
///
/// - `diagonal`: main diagonal d[0..n]
/// - `off_diag`: sub/super-diagonal e[0..n-1]
#[must_use]
pub fn sturm_count(diagonal: &[f64], off_diag: &[f64], lambda: f64) -> usize {
    let n = diagonal.len();
    if n == 0 {
        return 0;
    }

    let mut count = 0;
    let mut q = diagonal[0] - lambda;
    if q < 0.0 {
        count += 1;
    }

    for i in 1..n {
        let q_safe = if q.abs() < TRIDIAG_STURM_PIVOT_GUARD {
            if q >= 0.0 {
                TRIDIAG_STURM_PIVOT_GUARD
            } else {
                -TRIDIAG_STURM_PIVOT_GUARD
            }
        } else {
            q
        };
        q = (diagonal[i] - lambda) - off_diag[i - 1] * off_diag[i - 1] / q_safe;
        if q < 0.0 {
            count += 1;
        }
    }
    count
}

/// The k smallest eigenvalues (ascending) via Sturm bisection.
///
/// Bisection bounds come from Gershgorin discs widened by 1. Each
/// eigenvalue costs O(n log(1/ε)); the spectral stage only ever asks for
/// small k, so this is cheaper than a full decomposition.
#[must_use]
pub fn find_smallest_eigenvalues(diagonal: &[f64], off_diag: &[f64], k: usize) -> Vec<f64> {
    let n = diagonal.len();
    let k = k.min(n);
    if n == 0 || k == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![diagonal[0]];
    }

    // Gershgorin bounds
    let mut lo = f64::MAX;
    let mut hi = f64::MIN;
    for i in 0..n {
        let e_left = if i > 0 { off_diag[i - 1].abs() } else { 0.0 };
        let e_right = if i < n - 1 { off_diag[i].abs() } else { 0.0 };
        lo = lo.min(diagonal[i] - e_left - e_right);
        hi = hi.max(diagonal[i] + e_left + e_right);
    }
    lo -= 1.0;
    hi += 1.0;

    let mut eigenvalues = Vec::with_capacity(k);
    for idx in 0..k {
        let mut a = lo;
        let mut b = hi;
        for _ in 0..200 {
            let mid = 0.5 * (a + b);
            if (b - a) < 2.0 * f64::EPSILON * mid.abs().max(1.0) {
                break;
            }
            if sturm_count(diagonal, off_diag, mid) <= idx {
                a = mid;
            } else {
                b = mid;
            }
        }
        eigenvalues.push(0.5 * (a + b));
    }
    eigenvalues
}

/// All eigenvalues of a symmetric tridiagonal matrix, ascending.
#[must_use]
pub fn find_all_eigenvalues(diagonal: &[f64], off_diag: &[f64]) -> Vec<f64> {
    find_smallest_eigenvalues(diagonal, off_diag, diagonal.len())
}

/// Full eigendecomposition of a symmetric tridiagonal matrix via QL with
/// implicit Wilkinson shifts.
///
/// Returns eigenvalues ascending and the row-major eigenvector matrix Z
/// (column j, i.e. `z[i*n + j]` over i, is the unit eigenvector of
/// eigenvalue j). `None` if an eigenvalue fails to deflate within the
/// iteration cap; callers fall back to a dense path.
///
/// # Provenance
/// EISPACK `tql2` (Bowdler, Martin, Reinsch, Wilkinson 1968).
#[must_use]
pub fn eigen_tridiagonal(diagonal: &[f64], off_diag: &[f64]) -> Option<(Vec<f64>, Vec<f64>)> {
    let n = diagonal.len();
    if n == 0 {
        return Some((Vec::new(), Vec::new()));
    }

    let mut d = diagonal.to_vec();
    let mut e = vec![0.0; n];
    e[..n - 1].copy_from_slice(&off_diag[..n - 1]);
    let mut z = vec![0.0; n * n];
    for i in 0..n {
        z[i * n + i] = 1.0;
    }

    for l in 0..n {
        let mut iter = 0;
        loop {
            // Locate the first negligible off-diagonal at or after l.
            let mut m = l;
            while m + 1 < n {
                let dd = d[m].abs() + d[m + 1].abs();
                if e[m].abs() <= f64::EPSILON * dd {
                    break;
                }
                m += 1;
            }
            if m == l {
                break;
            }
            iter += 1;
            if iter > 50 {
                return None;
            }

            // Wilkinson shift from the leading 2×2 of the active block.
            let mut g = (d[l + 1] - d[l]) / (2.0 * e[l]);
            let mut r = g.hypot(1.0);
            g = d[m] - d[l] + e[l] / (g + r.copysign(g));
            let mut s = 1.0_f64;
            let mut c = 1.0_f64;
            let mut p = 0.0;
            let mut underflow = false;

            for i in (l..m).rev() {
                let mut f = s * e[i];
                let b = c * e[i];
                r = f.hypot(g);
                e[i + 1] = r;
                if r == 0.0 {
                    // Rotation annihilated; deflate and restart this l.
                    d[i + 1] -= p;
                    e[m] = 0.0;
                    underflow = true;
                    break;
                }
                s = f / r;
                c = g / r;
                g = d[i + 1] - p;
                r = (d[i] - g) * s + 2.0 * c * b;
                p = s * r;
                d[i + 1] = g + p;
                g = c * r - b;

                for row in 0..n {
                    f = z[row * n + i + 1];
                    z[row * n + i + 1] = s * z[row * n + i] + c * f;
                    z[row * n + i] = c * z[row * n + i] - s * f;
                }
            }
            if underflow {
                continue;
            }
            d[l] -= p;
            e[l] = g;
            e[m] = 0.0;
        }
    }

    // Sort ascending, carrying eigenvector columns along.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| d[a].partial_cmp(&d[b]).unwrap_or(std::cmp::Ordering::Equal));
    let values: Vec<f64> = order.iter().map(|&j| d[j]).collect();
    let mut vectors = vec![0.0; n * n];
    for (new_j, &old_j) in order.iter().enumerate() {
        for i in 0..n {
            vectors[i * n + new_j] = z[i * n + old_j];
        }
    }
    Some((values, vectors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sturm_count_2x2() {
        // Matrix: [[1, -1], [-1, 3]] → eigenvalues ≈ 0.382, 3.618
        let d = [1.0, 3.0];
        let e = [-1.0];
        assert_eq!(sturm_count(&d, &e, 0.0), 0);
        assert_eq!(sturm_count(&d, &e, 1.0), 1);
        assert_eq!(sturm_count(&d, &e, 4.0), 2);
    }

    #[test]
    fn path_laplacian_spectrum() {
        // Path 0-1-2 Laplacian is tridiagonal [1,2,1] / [-1,-1]; spectrum {0,1,3}.
        let d = [1.0, 2.0, 1.0];
        let e = [-1.0, -1.0];
        let evals = find_all_eigenvalues(&d, &e);
        assert!(evals[0].abs() < 1e-10);
        assert!((evals[1] - 1.0).abs() < 1e-10);
        assert!((evals[2] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn smallest_k_prefix_of_all() {
        let d = vec![0.5, 1.5, 2.5, 3.5, 4.5];
        let e = vec![-0.3; 4];
        let all = find_all_eigenvalues(&d, &e);
        let two = find_smallest_eigenvalues(&d, &e, 2);
        assert_eq!(two.len(), 2);
        assert!((two[0] - all[0]).abs() < 1e-12);
        assert!((two[1] - all[1]).abs() < 1e-12);
    }

    #[test]
    fn eigenvalues_sorted_clean_chain() {
        // Clean tight-binding chain: d_i = 0, e_i = -1
        // Eigenvalues: 2 cos(kπ/(N+1)) for k = 1..N
        let n = 40;
        let d = vec![0.0; n];
        let e = vec![-1.0; n - 1];
        let evals = find_all_eigenvalues(&d, &e);
        assert_eq!(evals.len(), n);
        for i in 1..n {
            assert!(evals[i] >= evals[i - 1] - 1e-12);
        }
        for k in 1..=n {
            let exact = 2.0 * (k as f64 * std::f64::consts::PI / (n as f64 + 1.0)).cos();
            let closest = evals
                .iter()
                .map(|&ev| (ev - exact).abs())
                .fold(f64::MAX, f64::min);
            assert!(closest < 1e-10, "k={k}, exact={exact:.6}");
        }
    }

    #[test]
    fn ql_matches_sturm_values() {
        let d = [1.0, 2.0, 1.0];
        let e = [-1.0, -1.0];
        let (vals, _) = eigen_tridiagonal(&d, &e).unwrap();
        let sturm = find_all_eigenvalues(&d, &e);
        for (a, b) in vals.iter().zip(sturm.iter()) {
            assert!((a - b).abs() < 1e-9, "QL {a} vs Sturm {b}");
        }
    }

    #[test]
    fn ql_eigenvectors_satisfy_residual() {
        let d = [2.0, 3.0, 4.0, 3.0, 2.0];
        let e = [-1.0, 0.5, -0.5, 1.0];
        let n = d.len();
        let (vals, vecs) = eigen_tridiagonal(&d, &e).unwrap();
        for j in 0..n {
            // r = T·z_j − λ_j·z_j
            let mut norm2 = 0.0;
            for i in 0..n {
                let mut t = d[i] * vecs[i * n + j];
                if i > 0 {
                    t += e[i - 1] * vecs[(i - 1) * n + j];
                }
                if i + 1 < n {
                    t += e[i] * vecs[(i + 1) * n + j];
                }
                let r = t - vals[j] * vecs[i * n + j];
                norm2 += r * r;
            }
            assert!(norm2.sqrt() < 1e-9, "residual for eigenpair {j}");
        }
    }

    #[test]
    fn ql_eigenvectors_orthonormal() {
        let d = [1.0, 5.0, 2.0, 4.0];
        let e = [0.7, -0.2, 0.9];
        let n = d.len();
        let (_, vecs) = eigen_tridiagonal(&d, &e).unwrap();
        for a in 0..n {
            for b in 0..n {
                let dot: f64 = (0..n).map(|i| vecs[i * n + a] * vecs[i * n + b]).sum();
                let expect = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expect).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn count_consistency() {
        let d = vec![0.5, 1.5, 2.5, 3.5];
        let e = vec![-0.4, 0.8, -0.1];
        let evals = find_all_eigenvalues(&d, &e);
        for (k, &ev) in evals.iter().enumerate() {
            let below = sturm_count(&d, &e, ev + 1e-8);
            assert!(below > k);
        }
    }
}
