//! TESA height-bound machine — spectral/Fenchel validation environment
//!
//! Computes the heuristic TESA global height bound against Python controls:
//! weighted graph Laplacians, their mean-zero spectra and Moore–Penrose
//! resistances, Fenchel dual energies, per-place local C_Type invariants,
//! and the δ / C_∞ / C_Global assembly behind the height inequality
//! h_L ≤ (1−δ)·m_D + C_Global.
//!
//! ## Active modules
//!   - `graph` — weighted undirected graphs, Laplacian and incidence forms
//!   - `spectral` — k smallest positive eigenvalues on the mean-zero subspace
//!   - `physics` — pseudoinverse, effective resistances, Fenchel energies
//!   - `local` — template graphs (D4–E8), K_v table, per-place C_Type
//!   - `delta` — discrepancy δ with strategy certificates
//!   - `archimedean` — placeholder C_∞ with mean-zero diagnostics
//!   - `bound` — C_Global assembly, height-inequality evaluation, reports
//!   - `pipeline` — batch spectral/resistance/Fenchel runs over catalogs
//!   - `config` — layered JSON + environment configuration
//!   - `data` — graph/scenario JSON loading, persisted run records
//!
//! ## Validation binaries
//!   - `tesa_g1_ref` — g = 1 reference family end to end, checked against
//!     the pinned control values
//!   - `spectrum_batch` — catalog sweep producing per-graph records plus a
//!     convergence audit

pub mod archimedean;
pub mod bound;
pub mod config;
pub mod data;
pub mod delta;
pub mod error;
pub mod graph;
pub mod local;
pub mod physics;
pub mod pipeline;
pub mod provenance;
pub mod spectral;
pub mod tolerances;
pub mod validation;
