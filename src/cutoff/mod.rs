//----------------------------------------
// cutoff mod
//----------------------------------------
pub mod error;
pub mod resolve;
pub mod root_find;
pub mod types;
