//----------------------------------------
// events mod types
//----------------------------------------
use serde::{Deserialize, Serialize};

use crate::schedule::types::Arm;

/// Engine output for one interval `(start, end]` of the aligned grid, for a
/// single population (one stratum, one arm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalEvents {
    pub start: f64,
    pub end: f64,
    /// Index of the hazard segment the interval falls in
    pub segment: usize,
    pub fail_rate: f64,
    pub dropout_rate: f64,
    pub hr: f64,
    /// Enrollment rate in the matching calendar window
    pub enrollment_rate: f64,
    /// Patients enrolled early enough to be followed past `end`
    pub enrolled_before: f64,
    /// Probability of being event- and dropout-free at `start`
    pub survival: f64,
    pub events: f64,
    pub time_at_risk: f64,
}

/// Expected events within one failure-rate segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentEvents {
    pub t: f64,
    pub end: f64,
    pub segment: usize,
    pub fail_rate: f64,
    pub hr: f64,
    pub events: f64,
    pub time_at_risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedEventRow {
    pub stratum: String,
    pub arm: Arm,
    pub interval_start: f64,
    pub interval_end: f64,
    pub failure_rate: f64,
    pub hazard_ratio: f64,
    pub expected_events: f64,
    pub expected_time_at_risk: f64,
}
