//! Ports - Trait definitions for the external collaborators of the pipeline.

pub mod transcoder;

pub use transcoder::{TranscodeError, TranscodeExecutor};
