// SPDX-License-Identifier: AGPL-3.0-only

//! Spectral stage: Laplacian eigenanalysis on the mean-zero subspace.
//!
//! A weighted-graph Laplacian has the constant vector in its kernel; the
//! quantities of interest live in the orthogonal complement. The stage
//! renormalizes L by the graph's ρ, wraps it in an implicit mean-zero
//! projection, and extracts the k smallest strictly positive eigenvalues
//! with Lanczos (full reorthogonalization) + Sturm bisection. The dense
//! Jacobi and tridiagonal-QL kernels here also serve the pseudoinverse
//! engine in `physics`.
//!
//! # Provenance
//!
//! - Lanczos (1950), J. Res. Nat. Bur. Standards 45, 255
//! - EISPACK `tql2` (Bowdler, Martin, Reinsch, Wilkinson 1968)
//! - Rutishauser (1966) "The Jacobi method for real symmetric matrices"

pub mod jacobi;
pub mod lanczos;
pub mod operator;
pub mod solver;
pub mod tridiag;

pub use jacobi::jacobi_eigh;
pub use lanczos::{lanczos, lanczos_eigenvalues, LanczosTridiag};
pub use operator::{CsrMatrix, LinearOperator, ProjectedLaplacian, ShiftedOperator};
pub use solver::{smallest_positive_eigenvalues, SpectralConfig, SpectralResult};
pub use tridiag::{
    eigen_tridiagonal, find_all_eigenvalues, find_smallest_eigenvalues, sturm_count,
};
