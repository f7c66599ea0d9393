// SPDX-License-Identifier: AGPL-3.0-only

//! Smallest positive Laplacian eigenvalues on the mean-zero subspace.
//!
//! Mirrors the pinned control pipeline: renormalize L by ρ once, project
//! out the weighted constant direction implicitly, run Lanczos + Sturm on
//! the projected operator, filter kernel modes, and report λ₁ with a
//! diagnostic note instead of ever hard-failing.

use super::lanczos::lanczos;
use super::operator::ProjectedLaplacian;
use super::tridiag::find_smallest_eigenvalues;
use crate::graph::WeightedGraph;
use crate::tolerances::{CG_TOLERANCE, SPECTRAL_KERNEL_FLOOR};

/// Knobs for the spectral stage. `max_iter = None` runs a full Krylov
/// sweep (exact with full reorthogonalization).
#[derive(Debug, Clone)]
pub struct SpectralConfig {
    /// Requested number of smallest positive eigenvalues.
    pub k: usize,
    /// Convergence tolerance recorded with the result.
    pub tol: f64,
    /// Seed for the Lanczos start vector.
    pub seed: u64,
    /// Optional Lanczos iteration cap.
    pub max_iter: Option<usize>,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            k: 3,
            tol: CG_TOLERANCE,
            seed: 42,
            max_iter: None,
        }
    }
}

/// Outcome of one spectral analysis. Failure is expressed as an empty
/// eigenvalue list plus a note, never as an error.
#[derive(Debug, Clone)]
pub struct SpectralResult {
    /// Smallest strictly positive eigenvalue, when one was found.
    pub lambda1: Option<f64>,
    /// All surviving positive eigenvalues, ascending, at most k_used.
    pub lambdas: Vec<f64>,
    /// Effective eigenvalue count requested from the solver.
    pub k_used: usize,
    /// Tolerance the solve ran with.
    pub tol: f64,
    /// Empty on a clean run; otherwise what degraded and why.
    pub note: String,
}

/// k smallest strictly positive eigenvalues of ρ·L restricted to the
/// weighted mean-zero subspace.
///
/// Degradations, in order of appearance:
/// - n ≤ 1: trivial graph, no spectrum, note set.
/// - non-finite Lanczos recurrence: empty result, note set.
/// - no eigenvalue above the kernel floor: the largest computed value is
///   reported as λ₁ with a note (degenerate but defined).
#[must_use]
pub fn smallest_positive_eigenvalues(
    graph: &WeightedGraph,
    config: &SpectralConfig,
) -> SpectralResult {
    let n = graph.n();
    if n <= 1 {
        return SpectralResult {
            lambda1: None,
            lambdas: Vec::new(),
            k_used: 0,
            tol: config.tol,
            note: "trivial graph (n <= 1): no positive spectrum".into(),
        };
    }

    // ρ renormalization happens here, exactly once; resistance and energy
    // stages see the raw Laplacian.
    let lap = graph.laplacian().scaled(graph.rho);
    let op = ProjectedLaplacian::new(&lap, &graph.weights);

    let k_eff = config.k.max(1).min(n - 1);
    let sweep = config.max_iter.unwrap_or(n).min(n);
    let tri = lanczos(&op, sweep, config.seed);

    if tri.iterations == 0 || !tri.is_finite() {
        return SpectralResult {
            lambda1: None,
            lambdas: Vec::new(),
            k_used: 0,
            tol: config.tol,
            note: "lanczos failed: non-finite recurrence".into(),
        };
    }

    let steps = tri.iterations;
    let off = &tri.beta[..steps.saturating_sub(1)];
    let computed = find_smallest_eigenvalues(&tri.alpha, off, k_eff);

    let positives: Vec<f64> = computed
        .iter()
        .copied()
        .filter(|&v| v > SPECTRAL_KERNEL_FLOOR)
        .collect();

    if positives.is_empty() {
        // Kernel-only spectrum survived filtering. Keep the record usable:
        // report the largest computed value and flag it.
        SpectralResult {
            lambda1: computed.last().copied(),
            lambdas: Vec::new(),
            k_used: k_eff,
            tol: config.tol,
            note: "no eigenvalue above the kernel floor; reporting largest computed value".into(),
        }
    } else {
        let lambdas: Vec<f64> = positives.into_iter().take(k_eff).collect();
        SpectralResult {
            lambda1: Some(lambdas[0]),
            lambdas,
            k_used: k_eff,
            tol: config.tol,
            note: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star5() -> WeightedGraph {
        WeightedGraph::unit("star5", 5, &[(0, 1), (0, 2), (0, 3), (0, 4)]).unwrap()
    }

    #[test]
    fn star_graph_lambda1_is_one() {
        // Star K_{1,4} Laplacian spectrum: {0, 1, 1, 1, 5}
        let res = smallest_positive_eigenvalues(&star5(), &SpectralConfig::default());
        let l1 = res.lambda1.unwrap();
        assert!((l1 - 1.0).abs() < 1e-8, "λ₁ = {l1}");
        assert!(res.note.is_empty());
        assert_eq!(res.k_used, 3);
    }

    #[test]
    fn all_reported_eigenvalues_positive() {
        let res = smallest_positive_eigenvalues(&star5(), &SpectralConfig::default());
        assert!(!res.lambdas.is_empty());
        for &l in &res.lambdas {
            assert!(l > 1e-12);
        }
    }

    #[test]
    fn path_k_clamped_to_n_minus_1() {
        let g = WeightedGraph::unit("path3", 3, &[(0, 1), (1, 2)]).unwrap();
        let cfg = SpectralConfig {
            k: 10,
            ..SpectralConfig::default()
        };
        let res = smallest_positive_eigenvalues(&g, &cfg);
        assert_eq!(res.k_used, 2);
        // Path 0-1-2 positive spectrum: {1, 3}; two smallest computed are
        // {0, 1}, so only λ = 1 survives the filter.
        assert!((res.lambda1.unwrap() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn rho_scales_spectrum_uniformly() {
        let g = star5().with_rho(2.0);
        let res = smallest_positive_eigenvalues(&g, &SpectralConfig::default());
        assert!((res.lambda1.unwrap() - 2.0).abs() < 1e-8);
    }

    #[test]
    fn trivial_graph_degrades_with_note() {
        let g = WeightedGraph::new("one", vec![1.0], vec![]).unwrap();
        let res = smallest_positive_eigenvalues(&g, &SpectralConfig::default());
        assert!(res.lambda1.is_none());
        assert!(res.lambdas.is_empty());
        assert_eq!(res.k_used, 0);
        assert!(res.note.contains("trivial"));
    }

    #[test]
    fn non_finite_rho_degrades_with_note() {
        let g = star5().with_rho(f64::NAN);
        let res = smallest_positive_eigenvalues(&g, &SpectralConfig::default());
        assert!(res.lambda1.is_none());
        assert!(res.note.contains("non-finite"));
    }

    #[test]
    fn degenerate_weights_use_uniform_projection() {
        let mut g = star5();
        g.weights = vec![0.0; 5];
        let res = smallest_positive_eigenvalues(&g, &SpectralConfig::default());
        assert!((res.lambda1.unwrap() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn identical_seeds_are_bit_identical() {
        let a = smallest_positive_eigenvalues(&star5(), &SpectralConfig::default());
        let b = smallest_positive_eigenvalues(&star5(), &SpectralConfig::default());
        assert_eq!(
            a.lambda1.unwrap().to_bits(),
            b.lambda1.unwrap().to_bits()
        );
    }
}
