//----------------------------------------
// Numeric settings
//----------------------------------------
use serde::{Deserialize, Serialize};

/// Tolerances and limits shared by the aligner, the events engine and the
/// cutoff search. Missing fields deserialize to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeSettings {
    /// Relative distance under which two breakpoints are treated as one
    pub breakpoint_tol: f64,
    /// Below this value of `(fail_rate + dropout_rate) * width` the
    /// within-interval integrals use their series expansion
    pub small_rate_threshold: f64,
    /// Absolute tolerance on expected events when searching for a cutoff
    pub root_tol: f64,
    /// Cap on both window doublings and bisection steps in a cutoff search
    pub max_iterations: usize,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        ComputeSettings {
            breakpoint_tol: 1e-12,
            small_rate_threshold: 1e-4,
            root_tol: 1e-8,
            max_iterations: 200,
        }
    }
}
