//----------------------------------------
// strata mod types
//----------------------------------------
use serde::{Deserialize, Serialize};

use crate::events::types::ExpectedEventRow;

/// Expected events per arm within one hazard segment of one stratum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumSegmentEvents {
    pub stratum: String,
    pub segment: usize,
    pub t: f64,
    pub end: f64,
    pub hr: f64,
    pub control_events: f64,
    pub experimental_events: f64,
    /// Expected time at risk over both arms
    pub time_at_risk: f64,
}

impl StratumSegmentEvents {
    pub fn events(&self) -> f64 {
        self.control_events + self.experimental_events
    }
}

/// Events summed over strata and arms within one cell of the grid built
/// from every stratum's hazard breakpoints. `hr` is the event-weighted
/// geometric mean of the stratum hazard ratios in the cell, absent when
/// the cell has no expected events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentTotal {
    pub start: f64,
    pub end: f64,
    pub events: f64,
    pub hr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrataEvents {
    pub total_duration: f64,
    pub ratio: f64,
    /// One row per stratum, arm and aligned interval
    pub rows: Vec<ExpectedEventRow>,
    pub segments: Vec<StratumSegmentEvents>,
    pub totals: Vec<SegmentTotal>,
}

impl StrataEvents {
    pub fn total_events(&self) -> f64 {
        self.totals.iter().map(|cell| cell.events).sum()
    }

    pub fn stratum_events(&self, stratum: &str) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.stratum == stratum)
            .map(StratumSegmentEvents::events)
            .sum()
    }
}
