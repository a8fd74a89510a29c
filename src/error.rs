//----------------------------------------
// Crate error type
//----------------------------------------
use crate::ahr::error::AhrError;
use crate::cutoff::error::CutoffError;
use crate::enrollment::error::EnrollmentError;
use crate::events::error::EventsError;
use crate::schedule::error::{ScheduleError, SegmentError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AhrComputeErr {
    #[error("while validating rate schedules: {0}")]
    Schedule(ScheduleError),
    #[error("while computing enrollment: {0}")]
    Enrollment(EnrollmentError),
    #[error("while computing expected events: {0}")]
    Events(EventsError),
    #[error("while computing average hazard ratio: {0}")]
    Ahr(AhrError),
    #[error("while resolving analysis cutoff: {0}")]
    Cutoff(CutoffError),
}

impl From<SegmentError> for AhrComputeErr {
    fn from(e: SegmentError) -> Self {
        AhrComputeErr::Schedule(ScheduleError::Segment(e))
    }
}
