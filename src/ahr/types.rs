//----------------------------------------
// ahr mod types
//----------------------------------------
use serde::{Deserialize, Serialize};

/// Summary at one total duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AhrRow {
    pub time: f64,
    pub ahr: f64,
    pub events: f64,
    /// Information under the alternative hypothesis
    pub info: f64,
    /// Information under the null hypothesis
    pub info0: f64,
    /// Expected enrollment by `time`
    pub n: f64,
}

/// Detail for one hazard segment of one stratum at one total duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PwInfoRow {
    pub time: f64,
    pub stratum: String,
    /// Start of the hazard segment on the follow-up axis
    pub t: f64,
    pub hr: f64,
    pub events: f64,
    /// Expected patient-time at risk in the segment, both arms
    pub time_at_risk: f64,
    pub info: f64,
    pub info0: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AhrOptions {
    /// Experimental:control randomization ratio
    pub ratio: f64,
    /// One summary row per duration instead of per-segment detail
    pub simple: bool,
}

impl Default for AhrOptions {
    fn default() -> Self {
        AhrOptions {
            ratio: 1.,
            simple: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AhrReport {
    Summary(Vec<AhrRow>),
    Detail(Vec<PwInfoRow>),
}
