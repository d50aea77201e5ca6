use crate::application::orchestrator::PipelineOrchestrator;
use crate::domain::jobs::{JobState, PipelineJob};
use crate::ports::TranscodeExecutor;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A form submission: several videos, one set of segment parameters.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub video_names: Vec<String>,
    pub segment_duration: f64,
    pub segment_count: usize,
}

/// Per-video result shown back to whoever submitted the batch.
#[derive(Debug, Clone, Serialize)]
pub struct VideoOutcome {
    pub video: String,
    pub job_id: Option<String>,
    pub state: JobState,
    pub output: Option<PathBuf>,
    pub error_kind: Option<String>,
    pub error: Option<String>,
}

impl VideoOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == JobState::Done
    }

    fn rejected(video: &str, reason: String) -> Self {
        Self {
            video: video.to_string(),
            job_id: None,
            state: JobState::Failed,
            output: None,
            error_kind: Some("InvalidVideoName".to_string()),
            error: Some(reason),
        }
    }
}

/// Runs the videos of a batch one after another, pausing between them.
pub struct BatchRunner<T: ?Sized> {
    orchestrator: Arc<PipelineOrchestrator<T>>,
    source_root: PathBuf,
    delay: Duration,
}

impl<T> BatchRunner<T>
where
    T: TranscodeExecutor + ?Sized,
{
    pub fn new(
        orchestrator: Arc<PipelineOrchestrator<T>>,
        source_root: impl Into<PathBuf>,
        delay: Duration,
    ) -> Self {
        Self {
            orchestrator,
            source_root: source_root.into(),
            delay,
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// One video failing does not stop the others.
    pub async fn run(&self, request: &BatchRequest) -> Vec<VideoOutcome> {
        let mut outcomes = Vec::with_capacity(request.video_names.len());

        for (i, name) in request.video_names.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            if !path_is_valid(Path::new(name)) {
                warn!(video = %name, "rejecting video name");
                outcomes.push(VideoOutcome::rejected(
                    name,
                    format!("invalid video name {:?}", name),
                ));
                continue;
            }

            let job = PipelineJob::new(
                self.source_root.join(name),
                request.segment_duration,
                request.segment_count,
            );
            info!(video = %name, job_id = %job.id, "starting job");
            let report = self.orchestrator.run(&job).await;

            outcomes.push(VideoOutcome {
                video: name.clone(),
                job_id: Some(report.job_id.to_string()),
                state: report.state(),
                output: report.output_path().cloned(),
                error_kind: report.error().map(|e| e.kind().to_string()),
                error: report.error().map(|e| e.to_string()),
            });
        }

        let done = outcomes.iter().filter(|o| o.succeeded()).count();
        info!(done, total = outcomes.len(), "batch finished");
        outcomes
    }
}

/// Only plain relative names are accepted: no `..`, no root, no drive prefix.
pub fn path_is_valid(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
