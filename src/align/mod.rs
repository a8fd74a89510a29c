//----------------------------------------
// align mod
//----------------------------------------
pub mod grid;
