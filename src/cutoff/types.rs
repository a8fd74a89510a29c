//----------------------------------------
// cutoff mod types
//----------------------------------------
use serde::{Deserialize, Serialize};

/// Rule deciding when an analysis happens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CutoffSpec {
    /// Fixed calendar time since the start of enrollment
    Duration { duration: f64 },
    /// Fixed follow-up after the end of enrollment
    MinFollowup { followup: f64 },
    /// Time at which the target number of events is expected
    Events { events: f64 },
    /// Later of a fixed calendar time and the event-driven time
    MaxDurationEvents { duration: f64, events: f64 },
    /// Later of a fixed follow-up and the event-driven time
    MaxFollowupEvents { followup: f64, events: f64 },
}
