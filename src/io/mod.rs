//! Input handling - delimited tables from upstream pipeline tools

pub mod coverage;
pub mod table;
