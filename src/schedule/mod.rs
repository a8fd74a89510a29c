//----------------------------------------
// schedule mod
//----------------------------------------
pub mod design;
pub mod error;
pub mod piecewise;
pub mod types;
