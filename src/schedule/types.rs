//----------------------------------------
// schedule mod types
//----------------------------------------
use std::fmt;

use serde::{Deserialize, Serialize};

/// One row of the enrollment table: `rate` patients per unit time for
/// `duration` units of calendar time. A duration of `f64::INFINITY` marks an
/// open-ended final segment; otherwise accrual stops after the last segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollRate {
    pub stratum: String,
    pub duration: f64,
    pub rate: f64,
}

impl EnrollRate {
    pub fn new(stratum: impl Into<String>, duration: f64, rate: f64) -> Self {
        EnrollRate {
            stratum: stratum.into(),
            duration,
            rate,
        }
    }
}

/// One row of the failure/dropout table, on the time-since-enrollment axis.
/// `fail_rate` is the control-arm hazard; the experimental arm's hazard is
/// `fail_rate * hr`. The final row of a stratum covers all remaining follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailRate {
    pub stratum: String,
    pub duration: f64,
    pub fail_rate: f64,
    pub hr: f64,
    pub dropout_rate: f64,
}

impl FailRate {
    pub fn new(
        stratum: impl Into<String>,
        duration: f64,
        fail_rate: f64,
        hr: f64,
        dropout_rate: f64,
    ) -> Self {
        FailRate {
            stratum: stratum.into(),
            duration,
            fail_rate,
            hr,
            dropout_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumWeight {
    pub stratum: String,
    pub prevalence: f64,
}

impl StratumWeight {
    pub fn new(stratum: impl Into<String>, prevalence: f64) -> Self {
        StratumWeight {
            stratum: stratum.into(),
            prevalence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    Control,
    Experimental,
}

impl Arm {
    pub const BOTH: [Arm; 2] = [Arm::Control, Arm::Experimental];

    /// Share of enrolled patients randomized to this arm under an
    /// experimental:control allocation `ratio`
    pub fn share(self, ratio: f64) -> f64 {
        match self {
            Arm::Control => 1. / (1. + ratio),
            Arm::Experimental => ratio / (1. + ratio),
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arm::Control => write!(f, "control"),
            Arm::Experimental => write!(f, "experimental"),
        }
    }
}
