// SPDX-License-Identifier: AGPL-3.0-only

//! Matrix-free linear operators and the CSR carrier.
//!
//! The eigensolver and CG never see a materialized matrix: they work
//! through [`LinearOperator::apply`]. Concrete operators here are the CSR
//! Laplacian itself, the weighted mean-zero projection of it (the spectral
//! stage's subject), and a diagonal shift (the damped fallback's subject).

/// Anything that can compute y = A·x for a fixed square A.
pub trait LinearOperator {
    fn dim(&self) -> usize;
    fn apply(&self, x: &[f64], y: &mut [f64]);
}

/// Sparse symmetric matrix in Compressed Sparse Row format.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    pub n: usize,
    pub row_ptr: Vec<usize>,
    pub col_idx: Vec<usize>,
    pub values: Vec<f64>,
}

impl CsrMatrix {
    /// Sparse matrix-vector product: y = A·x. The inner loop of Lanczos
    /// and CG.
    pub fn spmv(&self, x: &[f64], y: &mut [f64]) {
        for (i, yi) in y.iter_mut().enumerate().take(self.n) {
            let mut sum = 0.0;
            for j in self.row_ptr[i]..self.row_ptr[i + 1] {
                sum += self.values[j] * x[self.col_idx[j]];
            }
            *yi = sum;
        }
    }

    /// Number of non-zero entries.
    #[must_use]
    pub const fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Dense row-major expansion (small-graph paths only).
    #[must_use]
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.n * self.n];
        for i in 0..self.n {
            for j in self.row_ptr[i]..self.row_ptr[i + 1] {
                dense[i * self.n + self.col_idx[j]] = self.values[j];
            }
        }
        dense
    }

    /// Uniformly scaled copy (the ρ renormalization; applied once).
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = self.clone();
        for v in &mut out.values {
            *v *= factor;
        }
        out
    }
}

impl LinearOperator for CsrMatrix {
    fn dim(&self) -> usize {
        self.n
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        self.spmv(x, y);
    }
}

/// Laplacian restricted to the weighted mean-zero subspace, applied
/// implicitly: A·x = Pᵀ·L·(P·x) with P = I − 1·wnᵀ.
///
/// wn is the weight vector normalized to unit sum (uniform fallback when
/// the sum is non-positive). P annihilates the constant direction, so the
/// kernel of L maps to (numerical) zero eigenvalues of A and the physical
/// spectrum is untouched.
pub struct ProjectedLaplacian<'a> {
    lap: &'a CsrMatrix,
    wn: Vec<f64>,
}

impl<'a> ProjectedLaplacian<'a> {
    #[must_use]
    pub fn new(lap: &'a CsrMatrix, weights: &[f64]) -> Self {
        let n = lap.n;
        let total: f64 = weights.iter().sum();
        let wn = if total > 0.0 && n == weights.len() {
            weights.iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / n as f64; n]
        };
        Self { lap, wn }
    }

    /// P·x = x − 1·(wnᵀx), in place.
    fn project(&self, x: &mut [f64]) {
        let wx: f64 = self.wn.iter().zip(x.iter()).map(|(w, xi)| w * xi).sum();
        for xi in x.iter_mut() {
            *xi -= wx;
        }
    }
}

impl LinearOperator for ProjectedLaplacian<'_> {
    fn dim(&self) -> usize {
        self.lap.n
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        let mut px = x.to_vec();
        self.project(&mut px);
        self.lap.spmv(&px, y);
        // Pᵀ·z = z − wn·(Σz); Σz is already ~0 because L has zero column
        // sums, so this only sweeps up rounding.
        let s: f64 = y.iter().sum();
        for (yi, w) in y.iter_mut().zip(self.wn.iter()) {
            *yi -= w * s;
        }
    }
}

/// A + shift·I, applied implicitly. The damped Fenchel fallback solves
/// (L + εI)x = b through this.
pub struct ShiftedOperator<'a, A: LinearOperator> {
    inner: &'a A,
    shift: f64,
}

impl<'a, A: LinearOperator> ShiftedOperator<'a, A> {
    #[must_use]
    pub const fn new(inner: &'a A, shift: f64) -> Self {
        Self { inner, shift }
    }
}

impl<A: LinearOperator> LinearOperator for ShiftedOperator<'_, A> {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        self.inner.apply(x, y);
        for (yi, xi) in y.iter_mut().zip(x.iter()) {
            *yi += self.shift * xi;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csr_spmv_identity() {
        // 3×3 identity in CSR
        let mat = CsrMatrix {
            n: 3,
            row_ptr: vec![0, 1, 2, 3],
            col_idx: vec![0, 1, 2],
            values: vec![1.0, 1.0, 1.0],
        };
        let x = vec![3.0, 5.0, 7.0];
        let mut y = vec![0.0; 3];
        mat.spmv(&x, &mut y);
        assert!((y[0] - 3.0).abs() < 1e-14);
        assert!((y[1] - 5.0).abs() < 1e-14);
        assert!((y[2] - 7.0).abs() < 1e-14);
    }

    #[test]
    fn csr_spmv_path_laplacian() {
        // Path 0-1-2 Laplacian: rows [1,-1,0 / -1,2,-1 / 0,-1,1]
        let mat = CsrMatrix {
            n: 3,
            row_ptr: vec![0, 2, 5, 7],
            col_idx: vec![0, 1, 0, 1, 2, 1, 2],
            values: vec![1.0, -1.0, -1.0, 2.0, -1.0, -1.0, 1.0],
        };
        let x = vec![1.0, 0.0, 0.0];
        let mut y = vec![0.0; 3];
        mat.spmv(&x, &mut y);
        assert!((y[0] - 1.0).abs() < 1e-14);
        assert!((y[1] + 1.0).abs() < 1e-14);
        assert!(y[2].abs() < 1e-14);
    }

    #[test]
    fn to_dense_round_trips_entries() {
        let mat = CsrMatrix {
            n: 2,
            row_ptr: vec![0, 2, 4],
            col_idx: vec![0, 1, 0, 1],
            values: vec![1.0, -1.0, -1.0, 1.0],
        };
        let d = mat.to_dense();
        assert_eq!(d, vec![1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn scaled_multiplies_every_entry() {
        let mat = CsrMatrix {
            n: 2,
            row_ptr: vec![0, 2, 4],
            col_idx: vec![0, 1, 0, 1],
            values: vec![1.0, -1.0, -1.0, 1.0],
        };
        let s = mat.scaled(2.5);
        assert_eq!(s.values, vec![2.5, -2.5, -2.5, 2.5]);
        assert_eq!(s.nnz(), 4);
    }

    #[test]
    fn projected_operator_annihilates_constants() {
        // Path Laplacian; constant input must map to (numerical) zero.
        let lap = CsrMatrix {
            n: 3,
            row_ptr: vec![0, 2, 5, 7],
            col_idx: vec![0, 1, 0, 1, 2, 1, 2],
            values: vec![1.0, -1.0, -1.0, 2.0, -1.0, -1.0, 1.0],
        };
        let op = ProjectedLaplacian::new(&lap, &[1.0, 1.0, 1.0]);
        let x = vec![4.0, 4.0, 4.0];
        let mut y = vec![0.0; 3];
        op.apply(&x, &mut y);
        for yi in y {
            assert!(yi.abs() < 1e-12);
        }
    }

    #[test]
    fn projected_operator_matches_laplacian_on_mean_zero_input() {
        let lap = CsrMatrix {
            n: 3,
            row_ptr: vec![0, 2, 5, 7],
            col_idx: vec![0, 1, 0, 1, 2, 1, 2],
            values: vec![1.0, -1.0, -1.0, 2.0, -1.0, -1.0, 1.0],
        };
        let op = ProjectedLaplacian::new(&lap, &[1.0, 1.0, 1.0]);
        let x = vec![1.0, 0.0, -1.0]; // already mean-zero
        let (mut ya, mut yb) = (vec![0.0; 3], vec![0.0; 3]);
        op.apply(&x, &mut ya);
        lap.spmv(&x, &mut yb);
        for (a, b) in ya.iter().zip(yb.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn degenerate_weights_fall_back_to_uniform() {
        let lap = CsrMatrix {
            n: 2,
            row_ptr: vec![0, 2, 4],
            col_idx: vec![0, 1, 0, 1],
            values: vec![1.0, -1.0, -1.0, 1.0],
        };
        let op = ProjectedLaplacian::new(&lap, &[0.0, 0.0]);
        let x = vec![7.0, 7.0];
        let mut y = vec![0.0; 2];
        op.apply(&x, &mut y);
        assert!(y[0].abs() < 1e-12 && y[1].abs() < 1e-12);
    }

    #[test]
    fn shifted_operator_adds_diagonal() {
        let lap = CsrMatrix {
            n: 2,
            row_ptr: vec![0, 2, 4],
            col_idx: vec![0, 1, 0, 1],
            values: vec![1.0, -1.0, -1.0, 1.0],
        };
        let op = ShiftedOperator::new(&lap, 0.5);
        let x = vec![2.0, 0.0];
        let mut y = vec![0.0; 2];
        op.apply(&x, &mut y);
        assert!((y[0] - 3.0).abs() < 1e-14); // 2 + 0.5·2
        assert!((y[1] + 2.0).abs() < 1e-14);
    }
}
