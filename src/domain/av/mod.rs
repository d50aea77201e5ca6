//! The clip pipeline stages.

pub mod concat;
pub mod finalize;
pub mod planner;
pub mod probe;
pub mod segments;
pub mod workspace;
