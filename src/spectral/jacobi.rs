// SPDX-License-Identifier: AGPL-3.0-only

//! Dense cyclic Jacobi eigendecomposition.
//!
//! The small-graph pseudoinverse path and the dense fallback both need a
//! full symmetric eigendecomposition. Cyclic Jacobi with the threshold
//! strategy is exact to machine precision at the sizes involved
//! (n ≤ 200) and has no convergence failure mode worth handling.

/// Full eigendecomposition of a dense symmetric row-major matrix.
///
/// Returns eigenvalues ascending and the row-major eigenvector matrix
/// (`vectors[i*n + j]` over i is the unit eigenvector of `values[j]`).
/// The input is copied; O(n³) per sweep, ≤ 50 sweeps.
#[must_use]
pub fn jacobi_eigh(matrix: &[f64], n: usize) -> (Vec<f64>, Vec<f64>) {
    const MAX_SWEEPS: usize = 50;
    const OFF_DIAGONAL_TOL: f64 = 1e-14;

    let mut a = matrix.to_vec();
    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    for sweep in 0..MAX_SWEEPS {
        let mut max_off = 0.0_f64;
        for p in 0..n {
            for q in (p + 1)..n {
                max_off = max_off.max(a[p * n + q].abs());
            }
        }
        if max_off < OFF_DIAGONAL_TOL {
            break;
        }

        // Threshold strategy: skip tiny rotations in early sweeps.
        let threshold = if sweep < 4 {
            0.2 * max_off / (n * n) as f64
        } else {
            0.0
        };

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq.abs() < threshold {
                    continue;
                }

                let app = a[p * n + p];
                let aqq = a[q * n + q];
                let diff = aqq - app;

                let t = if diff.abs() < 1e-300 {
                    // Equal diagonal entries: rotate by π/4
                    if apq > 0.0 {
                        1.0
                    } else {
                        -1.0
                    }
                } else {
                    let theta = diff / (2.0 * apq);
                    // Smaller root for stability
                    if theta >= 0.0 {
                        1.0 / (theta + (1.0 + theta * theta).sqrt())
                    } else {
                        -1.0 / (-theta + (1.0 + theta * theta).sqrt())
                    }
                };

                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;
                let tau = s / (1.0 + c); // Rutishauser form

                a[p * n + p] = app - t * apq;
                a[q * n + q] = aqq + t * apq;
                a[p * n + q] = 0.0;
                a[q * n + p] = 0.0;

                for r in 0..n {
                    if r == p || r == q {
                        continue;
                    }
                    let arp = a[r * n + p];
                    let arq = a[r * n + q];
                    a[r * n + p] = arp - s * (arq + tau * arp);
                    a[p * n + r] = a[r * n + p];
                    a[r * n + q] = arq + s * (arp - tau * arq);
                    a[q * n + r] = a[r * n + q];
                }

                for r in 0..n {
                    let vrp = v[r * n + p];
                    let vrq = v[r * n + q];
                    v[r * n + p] = vrp - s * (vrq + tau * vrp);
                    v[r * n + q] = vrq + s * (vrp - tau * vrq);
                }
            }
        }
    }

    // Sort ascending, permuting eigenvector columns alongside.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&x, &y| {
        a[x * n + x]
            .partial_cmp(&a[y * n + y])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let values: Vec<f64> = order.iter().map(|&j| a[j * n + j]).collect();
    let mut vectors = vec![0.0; n * n];
    for (new_j, &old_j) in order.iter().enumerate() {
        for i in 0..n {
            vectors[i * n + new_j] = v[i * n + old_j];
        }
    }
    (values, vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_matrix_is_its_own_spectrum() {
        let m = vec![3.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0];
        let (vals, _) = jacobi_eigh(&m, 3);
        assert!((vals[0] - 1.0).abs() < 1e-12);
        assert!((vals[1] - 2.0).abs() < 1e-12);
        assert!((vals[2] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn known_2x2() {
        // [[1, -1], [-1, 3]] → eigenvalues 2 ± √2
        let m = vec![1.0, -1.0, -1.0, 3.0];
        let (vals, _) = jacobi_eigh(&m, 2);
        let r2 = std::f64::consts::SQRT_2;
        assert!((vals[0] - (2.0 - r2)).abs() < 1e-12);
        assert!((vals[1] - (2.0 + r2)).abs() < 1e-12);
    }

    #[test]
    fn path_laplacian_spectrum_and_residuals() {
        // Path 0-1-2 Laplacian: spectrum {0, 1, 3}
        let n = 3;
        let m = vec![1.0, -1.0, 0.0, -1.0, 2.0, -1.0, 0.0, -1.0, 1.0];
        let (vals, vecs) = jacobi_eigh(&m, n);
        assert!(vals[0].abs() < 1e-12);
        assert!((vals[1] - 1.0).abs() < 1e-12);
        assert!((vals[2] - 3.0).abs() < 1e-12);

        for j in 0..n {
            let mut norm2 = 0.0;
            for i in 0..n {
                let av: f64 = (0..n).map(|k| m[i * n + k] * vecs[k * n + j]).sum();
                let r = av - vals[j] * vecs[i * n + j];
                norm2 += r * r;
            }
            assert!(norm2.sqrt() < 1e-10, "eigenpair {j} residual");
        }
    }

    #[test]
    fn eigenvectors_orthonormal() {
        let n = 4;
        #[rustfmt::skip]
        let m = vec![
            2.0, -1.0,  0.0, -0.5,
           -1.0,  3.0, -1.0,  0.0,
            0.0, -1.0,  2.5, -1.0,
           -0.5,  0.0, -1.0,  1.5,
        ];
        let (_, vecs) = jacobi_eigh(&m, n);
        for a in 0..n {
            for b in 0..n {
                let dot: f64 = (0..n).map(|i| vecs[i * n + a] * vecs[i * n + b]).sum();
                let expect = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expect).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn reconstructs_input() {
        let n = 3;
        let m = vec![4.0, 1.0, -2.0, 1.0, 2.0, 0.0, -2.0, 0.0, 3.0];
        let (vals, vecs) = jacobi_eigh(&m, n);
        // A = V Λ Vᵀ
        for i in 0..n {
            for j in 0..n {
                let aij: f64 = (0..n)
                    .map(|k| vecs[i * n + k] * vals[k] * vecs[j * n + k])
                    .sum();
                assert!((aij - m[i * n + j]).abs() < 1e-10);
            }
        }
    }
}
