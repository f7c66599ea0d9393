// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for graph construction and the solver stack.
//!
//! Replaces `Result<_, String>` in public APIs with a proper enum so callers
//! can pattern-match on failure modes (malformed graph, exhausted solver
//! chain, broken invariant) rather than parsing opaque strings.

use std::fmt;

/// Errors arising from graph validation, solving, or invariant assembly.
///
/// Failures are isolated per graph or scenario: the batch layer records
/// them and keeps processing the rest. `Solve` is raised only after every
/// fallback strategy for a scenario is exhausted.
#[derive(Debug)]
pub enum TesaError {
    /// Malformed graph: dangling edge endpoint, declared node count not
    /// matching the node list, or a scenario naming an unknown node.
    Structure(String),

    /// Zero nodes, or zero edges where the operation needs at least one.
    EmptyGraph { nodes: usize, edges: usize },

    /// An iterative stage stopped without reaching its residual target
    /// (recoverable; the caller tries the next fallback).
    Convergence {
        stage: &'static str,
        iterations: usize,
        residual: f64,
    },

    /// Every solve strategy failed for this scenario (wraps the last
    /// failure reason).
    Solve(String),

    /// A computed local invariant is non-finite, or the template graph
    /// fails its minimal-size check.
    Invariant(String),
}

impl fmt::Display for TesaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure(msg) => write!(f, "Graph structure error: {msg}"),
            Self::EmptyGraph { nodes, edges } => {
                write!(
                    f,
                    "Empty graph: {nodes} nodes / {edges} edges (need at least one of each)"
                )
            }
            Self::Convergence {
                stage,
                iterations,
                residual,
            } => {
                write!(
                    f,
                    "{stage} did not converge after {iterations} iterations (residual {residual:.3e})"
                )
            }
            Self::Solve(msg) => write!(f, "Solve failed after all fallbacks: {msg}"),
            Self::Invariant(msg) => write!(f, "Local invariant check failed: {msg}"),
        }
    }
}

impl std::error::Error for TesaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_structure() {
        let err = TesaError::Structure("edge (0, 9) references missing node 9".into());
        assert_eq!(
            err.to_string(),
            "Graph structure error: edge (0, 9) references missing node 9"
        );
    }

    #[test]
    fn display_empty_graph() {
        let err = TesaError::EmptyGraph { nodes: 3, edges: 0 };
        assert!(err.to_string().contains("3 nodes / 0 edges"));
    }

    #[test]
    fn display_convergence() {
        let err = TesaError::Convergence {
            stage: "cg",
            iterations: 5000,
            residual: 2.5e-3,
        };
        let msg = err.to_string();
        assert!(msg.contains("cg"));
        assert!(msg.contains("5000"));
        assert!(msg.contains("2.500e-3"));
    }

    #[test]
    fn display_solve() {
        let err = TesaError::Solve("dense fallback hit a non-positive pivot".into());
        assert!(err.to_string().starts_with("Solve failed after all fallbacks"));
    }

    #[test]
    fn error_trait_works() {
        let err = TesaError::Invariant("C_Type is not finite".into());
        let dyn_err: &dyn std::error::Error = &err;
        assert_eq!(
            dyn_err.to_string(),
            "Local invariant check failed: C_Type is not finite"
        );
    }
}
