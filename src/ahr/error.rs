//----------------------------------------
// Average hazard ratio errors
//----------------------------------------
use crate::error::AhrComputeErr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AhrError {
    #[error("no expected events to weight hazard ratios by")]
    NoExpectedEvents,
    #[error("no expected events by time {0}; cannot weight hazard ratios")]
    NoExpectedEventsAt(f64),
}

impl From<AhrError> for AhrComputeErr {
    fn from(e: AhrError) -> Self {
        AhrComputeErr::Ahr(e)
    }
}
