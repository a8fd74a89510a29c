//----------------------------------------
// Cutoff errors
//----------------------------------------
use crate::error::AhrComputeErr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CutoffError {
    #[error("target event count should be positive and finite; got {0}")]
    BadTarget(f64),
    #[error("minimum follow-up should be non-negative and finite; got {0}")]
    BadFollowup(f64),
    #[error("f(lower_bound) = {value} already reaches target {target}; use smaller lower bound")]
    BadLowerBound { value: f64, target: f64 },
    #[error(
        "target of {target} events is unreachable; only {max_events} expected by time {horizon}"
    )]
    UnreachableTarget {
        target: f64,
        max_events: f64,
        horizon: f64,
    },
    #[error("expected events decreased from {f_lower} at {lower} to {f_upper} at {upper}")]
    NonMonotonic {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },
    #[error(
        "failed to converge after {iterations} iterations (time {time}, events {events}, \
        target {target})"
    )]
    FailedToConverge {
        iterations: usize,
        time: f64,
        events: f64,
        target: f64,
    },
}

impl From<CutoffError> for AhrComputeErr {
    fn from(e: CutoffError) -> Self {
        AhrComputeErr::Cutoff(e)
    }
}
