//! Merge per-method LCIA characterization factors into one flow-indexed table.

pub mod catalog;
pub mod compress;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod merge;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod settings;
pub mod utils;
