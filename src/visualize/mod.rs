//! Chart rendering - one module per figure family

pub mod benchmark;
pub mod curve;
pub mod heatmap;
pub mod histogram;
pub mod quality;
pub mod rank_pie;
pub mod sankey;
