//----------------------------------------
// strata mod
//----------------------------------------
pub mod aggregate;
pub mod types;
