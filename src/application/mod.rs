//! Application layer - Services that drive the domain through ports.

pub mod batch;
pub mod orchestrator;
