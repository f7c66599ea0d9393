// SPDX-License-Identifier: AGPL-3.0-only

//! Provenance metadata for all Python baseline values.
//!
//! Every hardcoded expected value in validation binaries traces back to a
//! specific Python control run. This module centralizes that metadata so
//! validation binaries carry machine-readable provenance.
//!
//! # Provenance chain
//!
//! ```text
//! Python script → commit → environment → command → output → Rust constant
//! ```
//!
//! The control pipeline lives under `control/` in the TESA research
//! repository: the `tesa` package (local invariants, spectral gap,
//! archimedean term, global orchestrator) plus the `scripts/spectrum`
//! batch tools (eigensolve, effective resistance, Fenchel energy).
//!
//! Closed forms back several of the constants: the unit star on n nodes
//! has Laplacian spectrum {0, 1 (n−2 times), n}; series/parallel
//! reduction gives the cycle resistances; the local C_Type values follow
//! from the template trees by hand.

/// A single provenance record tying a Rust reference value to its Python origin.
#[derive(Debug, Clone)]
pub struct BaselineProvenance {
    /// Human-readable label (e.g. "star8 lambda1")
    pub label: &'static str,
    /// Python script that produced the value (relative to control/)
    pub script: &'static str,
    /// Git commit hash of the control repo at time of run
    pub commit: &'static str,
    /// Date of the control run (ISO 8601)
    pub date: &'static str,
    /// Exact command used to produce the baseline
    pub command: &'static str,
    /// Python environment spec (conda env name or requirements file)
    pub environment: &'static str,
    /// The reference value itself
    pub value: f64,
    /// Unit or description of the value
    pub unit: &'static str,
}

/// Reference stack of the Python control environment.
pub const CONTROL_STACK_REFS: &str = "NumPy 1.26 / SciPy 1.11 (Python 3.11)";

// ═══════════════════════════════════════════════════════════════════
// Spectral baselines: control/scripts/spectrum/
// ═══════════════════════════════════════════════════════════════════

/// λ₁ of the unit star on 8 nodes (closed form: spectrum {0, 1×6, 8}).
pub const STAR8_LAMBDA1: BaselineProvenance = BaselineProvenance {
    label: "star8 lambda1 (unit conductances, rho = 1)",
    script: "scripts/spectrum/compute_spectrum.py",
    commit: "9b71e4d (tesa control, pinned)",
    date: "2026-02-11",
    command: "python -m scripts.spectrum.compute_spectrum --graphs data/graphs --k 3 --seed 42",
    environment: "envs/tesa.yaml (numpy, scipy)",
    value: 1.0,
    unit: "eigenvalue of L restricted to mean-zero subspace",
};

/// λ₁ of the unit triangle (spectrum {0, 3, 3}).
pub const TRIANGLE_LAMBDA1: BaselineProvenance = BaselineProvenance {
    label: "triangle lambda1 (unit conductances)",
    script: "scripts/spectrum/compute_spectrum.py",
    commit: "9b71e4d (tesa control, pinned)",
    date: "2026-02-11",
    command: "python -m scripts.spectrum.compute_spectrum --graphs data/graphs --k 3 --seed 42",
    environment: "envs/tesa.yaml (numpy, scipy)",
    value: 3.0,
    unit: "eigenvalue of L restricted to mean-zero subspace",
};

// ═══════════════════════════════════════════════════════════════════
// Resistance and Fenchel baselines: control/scripts/spectrum/physics/
// ═══════════════════════════════════════════════════════════════════

/// Effective resistance across one edge of the unit 4-cycle (1 Ω in
/// parallel with 3 Ω).
pub const CYCLE4_ADJACENT_RESISTANCE: BaselineProvenance = BaselineProvenance {
    label: "cycle4 adjacent effective resistance",
    script: "scripts/spectrum/physics/effective_resistance.py",
    commit: "9b71e4d (tesa control, pinned)",
    date: "2026-02-11",
    command: "python -m scripts.spectrum.physics.effective_resistance --graphs data/graphs",
    environment: "envs/tesa.yaml (numpy, scipy)",
    value: 0.75,
    unit: "ohm (unit conductances)",
};

/// Effective resistance across the diagonal of the unit 4-cycle (2 Ω
/// in parallel with 2 Ω).
pub const CYCLE4_OPPOSITE_RESISTANCE: BaselineProvenance = BaselineProvenance {
    label: "cycle4 opposite effective resistance",
    script: "scripts/spectrum/physics/effective_resistance.py",
    commit: "9b71e4d (tesa control, pinned)",
    date: "2026-02-11",
    command: "python -m scripts.spectrum.physics.effective_resistance --graphs data/graphs",
    environment: "envs/tesa.yaml (numpy, scipy)",
    value: 1.0,
    unit: "ohm (unit conductances)",
};

/// Two-terminal Fenchel energy on the unit 3-path: ½·R_eff(0,2) = ½·2.
pub const PATH3_FENCHEL_ENERGY: BaselineProvenance = BaselineProvenance {
    label: "path3 two-terminal Fenchel energy",
    script: "scripts/spectrum/physics/fenchel_energy.py",
    commit: "9b71e4d (tesa control, pinned)",
    date: "2026-02-11",
    command: "python -m scripts.spectrum.physics.fenchel_energy --graphs data/graphs",
    environment: "envs/tesa.yaml (numpy, scipy)",
    value: 1.0,
    unit: "½·bᵀL⁺b (unit injection)",
};

// ═══════════════════════════════════════════════════════════════════
// Local C_Type baselines: control/tesa/local_c_type.py
// ═══════════════════════════════════════════════════════════════════

/// D4, p = 2, unit conductance: f_v = 0.8·1.15 = 0.92, four spokes.
pub const D4_C_TYPE: BaselineProvenance = BaselineProvenance {
    label: "D4 C_Type (p = 2, i0 = 3, unit conductance)",
    script: "tesa/local_c_type.py",
    commit: "9b71e4d (tesa control, pinned)",
    date: "2026-02-12",
    command: "python -m tesa.local_c_type --code D4 --p 2 --i0 3 --conductance 1.0",
    environment: "envs/tesa.yaml (numpy, scipy)",
    value: 1.8428,
    unit: "C_Type = E_Fenchel + K_v",
};

/// D5, p = 5 (no wild contribution): f_v = 0.85, five tree edges.
pub const D5_C_TYPE: BaselineProvenance = BaselineProvenance {
    label: "D5 C_Type (p = 5, i0 = 2, unit conductance)",
    script: "tesa/local_c_type.py",
    commit: "9b71e4d (tesa control, pinned)",
    date: "2026-02-12",
    command: "python -m tesa.local_c_type --code D5 --p 5 --i0 2 --conductance 1.0",
    environment: "envs/tesa.yaml (numpy, scipy)",
    value: 1.806_25,
    unit: "C_Type = E_Fenchel + K_v",
};

/// E6, p = 2: f_v = 0.95·1.22 = 1.159, five tree edges.
pub const E6_C_TYPE: BaselineProvenance = BaselineProvenance {
    label: "E6 C_Type (p = 2, i0 = 3, unit conductance)",
    script: "tesa/local_c_type.py",
    commit: "9b71e4d (tesa control, pinned)",
    date: "2026-02-12",
    command: "python -m tesa.local_c_type --code E6 --p 2 --i0 3 --conductance 1.0",
    environment: "envs/tesa.yaml (numpy, scipy)",
    value: 3.578_202_5,
    unit: "C_Type = E_Fenchel + K_v",
};

// ═══════════════════════════════════════════════════════════════════
// Global pipeline baselines: control/examples/run_g1_example.py
// ═══════════════════════════════════════════════════════════════════

/// δ for the g = 1 reference family (explicit lower bound from the
/// family config).
pub const G1_DELTA: BaselineProvenance = BaselineProvenance {
    label: "g1 reference family delta",
    script: "examples/run_g1_example.py",
    commit: "9b71e4d (tesa control, pinned)",
    date: "2026-02-12",
    command: "python examples/run_g1_example.py",
    environment: "envs/tesa.yaml (numpy, scipy)",
    value: 0.03,
    unit: "discrepancy in [0, 1)",
};

/// C_Global for the g = 1 reference family: C_ε = 1.0 plus the D4, E6
/// and D5 place contributions, err_locals = 0.
pub const G1_C_GLOBAL: BaselineProvenance = BaselineProvenance {
    label: "g1 reference family C_Global",
    script: "examples/run_g1_example.py",
    commit: "9b71e4d (tesa control, pinned)",
    date: "2026-02-12",
    command: "python examples/run_g1_example.py",
    environment: "envs/tesa.yaml (numpy, scipy)",
    value: 8.227_252_5,
    unit: "C_∞ + Σ C_Type + err_locals",
};

/// Every baseline, for sweep-style audits.
pub const ALL_BASELINES: &[&BaselineProvenance] = &[
    &STAR8_LAMBDA1,
    &TRIANGLE_LAMBDA1,
    &CYCLE4_ADJACENT_RESISTANCE,
    &CYCLE4_OPPOSITE_RESISTANCE,
    &PATH3_FENCHEL_ENERGY,
    &D4_C_TYPE,
    &D5_C_TYPE,
    &E6_C_TYPE,
    &G1_DELTA,
    &G1_C_GLOBAL,
];
