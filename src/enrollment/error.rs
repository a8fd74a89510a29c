//----------------------------------------
// Enrollment errors
//----------------------------------------

use crate::error::AhrComputeErr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrollmentError {
    #[error("sample size should be positive and finite; got {0}")]
    BadSampleSize(f64),
    #[error("sample size {n} is never reached; accrual stops after {max_enrolled} patients")]
    UnreachableSampleSize { n: f64, max_enrolled: f64 },
    #[error("enrollment never ends, so minimum follow-up is undefined")]
    OpenEndedEnrollment,
}

impl From<EnrollmentError> for AhrComputeErr {
    fn from(e: EnrollmentError) -> Self {
        AhrComputeErr::Enrollment(e)
    }
}
