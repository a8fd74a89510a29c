//----------------------------------------
// ahr mod
//----------------------------------------
pub mod compute_ahr;
pub mod error;
pub mod types;
