//! HTTP inbound adapter: the submission form and its JSON twin.

pub mod form;

use crate::application::batch::BatchRunner;
use crate::ports::TranscodeExecutor;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Values prefilled in the form and used when a field is left out.
#[derive(Clone, Copy, Debug)]
pub struct FormDefaults {
    pub segment_duration: f64,
    pub segment_count: usize,
}

pub struct AppState<T> {
    pub runner: Arc<BatchRunner<T>>,
    pub defaults: FormDefaults,
    /// Bounds how many batches run at the same time.
    pub jobs: Arc<Semaphore>,
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
            defaults: self.defaults,
            jobs: self.jobs.clone(),
        }
    }
}

pub fn router<T>(state: AppState<T>) -> Router
where
    T: TranscodeExecutor + 'static,
{
    Router::new()
        .route("/", get(form::index::<T>))
        .route("/success", get(form::success))
        .route("/process", post(form::process::<T>))
        .route("/api/process", post(form::process_json::<T>))
        .with_state(state)
}
