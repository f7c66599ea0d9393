// SPDX-License-Identifier: AGPL-3.0-only

//! Physics stage: pseudoinverse, effective resistance, Fenchel energy.
//!
//! Electrical-network quantities of the raw Laplacian (no ρ
//! renormalization here):
//!
//! - L⁺ via dense Jacobi (small graphs) or truncated Lanczos Ritz pairs
//!   (large graphs, dense fallback)
//! - R(i,j) = L⁺ᵢᵢ + L⁺ⱼⱼ − 2L⁺ᵢⱼ per edge, with batch statistics
//! - Fenchel dual energy ½·bᵀL⁺b through the CG → damped CG → dense
//!   Cholesky fallback chain

pub mod cg;
pub mod fenchel;
pub mod pseudoinverse;

pub use cg::{cg_solve, CgResult};
pub use fenchel::{
    default_sources, fenchel_energy, fenchel_energy_with, FenchelOutcome, SolveStrategy,
    SOLVE_CHAIN,
};
pub use pseudoinverse::{
    edge_resistances, pseudoinverse, EdgeResistance, Pseudoinverse, ResistanceStats,
};
