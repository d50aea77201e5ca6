//! Reelmix - Random clip remix pipeline
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (planning, jobs, pipeline stages)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations (ffmpeg subprocesses, HTTP form)
//! - application/: Per-video orchestration and batches
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
