//! Utility modules shared across the slicer.

pub mod exec;
pub mod path;
