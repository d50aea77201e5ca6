//! Domain layer - Pure pipeline logic.

pub mod av;
pub mod error;
pub mod jobs;
