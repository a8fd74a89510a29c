//----------------------------------------
// Schedule errors
//----------------------------------------
use crate::error::AhrComputeErr;
use thiserror::Error;

/// Problems with a single piecewise schedule, located by segment index
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("schedule has no segments")]
    Empty,
    #[error(
        "lengths of segment columns don't match (durations length {duration_length}, \
        rates length {rate_length})"
    )]
    LengthMismatch {
        duration_length: usize,
        rate_length: usize,
    },
    #[error("segment {segment} has non-positive duration {duration}")]
    NonPositiveDuration { segment: usize, duration: f64 },
    #[error("segment {segment} is open-ended but is not the final segment")]
    OpenSegmentNotLast { segment: usize },
    #[error("segment {segment} has {kind} {value}; rates must be finite and non-negative")]
    InvalidRate {
        segment: usize,
        kind: &'static str,
        value: f64,
    },
    #[error("segment {segment} has hazard ratio {hr}; hazard ratios must be finite and positive")]
    NonPositiveHazardRatio { segment: usize, hr: f64 },
    #[error("enrollment schedule has no positive rate")]
    NoPositiveRate,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("{0}")]
    Segment(SegmentError),
    #[error("stratum {stratum}: {source}")]
    InStratum {
        stratum: String,
        source: SegmentError,
    },
    #[error("no strata were supplied")]
    NoStrata,
    #[error("stratum {0} appears more than once")]
    DuplicateStratum(String),
    #[error("stratum {0} has failure rates but no enrollment rates")]
    MissingEnrollment(String),
    #[error("stratum {0} has enrollment rates but no failure rates")]
    MissingFailRate(String),
    #[error("stratum {0} has no prevalence weight")]
    MissingWeight(String),
    #[error("prevalence weight given for unknown stratum {0}")]
    UnknownWeightStratum(String),
    #[error("stratum {stratum} has prevalence {prevalence}; prevalence should be in (0, 1]")]
    PrevalenceOutOfRange { stratum: String, prevalence: f64 },
    #[error("stratum prevalences sum to {0}; they should sum to 1")]
    PrevalenceSum(f64),
}

impl From<ScheduleError> for AhrComputeErr {
    fn from(e: ScheduleError) -> Self {
        AhrComputeErr::Schedule(e)
    }
}
