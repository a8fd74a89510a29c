//----------------------------------------
// enrollment mod
//----------------------------------------
pub mod error;
pub mod expected_enrollment;
