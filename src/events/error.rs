//----------------------------------------
// Expected events errors
//----------------------------------------
use crate::error::AhrComputeErr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventsError {
    #[error("total duration should be positive and finite; got {0}")]
    NonPositiveDuration(f64),
    #[error("no total durations were supplied")]
    NoDurations,
    #[error(
        "total durations should be strictly increasing; duration {index} is {current} \
        after {previous}"
    )]
    NonIncreasingDurations {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("breakpoint should be finite; got {0}")]
    NonFiniteBreakpoint(f64),
    #[error("randomization ratio should be positive and finite; got {0}")]
    BadRatio(f64),
}

impl From<EventsError> for AhrComputeErr {
    fn from(e: EventsError) -> Self {
        AhrComputeErr::Events(e)
    }
}

/// Checks a single total duration
pub fn check_duration(total_duration: f64) -> Result<(), EventsError> {
    if !(total_duration > 0. && total_duration.is_finite()) {
        return Err(EventsError::NonPositiveDuration(total_duration));
    }
    Ok(())
}

/// Checks a sequence of total durations: non-empty, positive, strictly increasing
pub fn check_durations(durations: &[f64]) -> Result<(), EventsError> {
    if durations.is_empty() {
        return Err(EventsError::NoDurations);
    }
    for (index, &current) in durations.iter().enumerate() {
        check_duration(current)?;
        if index > 0 && current <= durations[index - 1] {
            return Err(EventsError::NonIncreasingDurations {
                index,
                previous: durations[index - 1],
                current,
            });
        }
    }
    Ok(())
}

pub fn check_ratio(ratio: f64) -> Result<(), EventsError> {
    if !(ratio > 0. && ratio.is_finite()) {
        return Err(EventsError::BadRatio(ratio));
    }
    Ok(())
}
