//----------------------------------------
// events mod
//----------------------------------------
pub mod error;
pub mod expected_events;
pub mod types;
