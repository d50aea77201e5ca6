use crate::domain::av::concat::concatenate;
use crate::domain::av::finalize::finalize;
use crate::domain::av::planner::{max_segments, plan};
use crate::domain::av::probe::probe_source;
use crate::domain::av::segments::{extract_all, DEFAULT_EXTRACT_CONCURRENCY};
use crate::domain::av::workspace::{final_output_path, JobWorkspace};
use crate::domain::error::PipelineError;
use crate::domain::jobs::{JobReport, JobState, PipelineJob};
use crate::ports::TranscodeExecutor;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// Parent of every job's staging directory, manifest and draft.
    pub work_dir: PathBuf,
    /// Where finished videos are written.
    pub output_dir: PathBuf,
    pub extract_concurrency: usize,
    /// Fixed planner seed; fresh entropy per job when unset.
    pub seed: Option<u64>,
}

impl PipelineSettings {
    pub fn new(work_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            output_dir: output_dir.into(),
            extract_concurrency: DEFAULT_EXTRACT_CONCURRENCY,
            seed: None,
        }
    }
}

/// Drives one video through probe, plan, extract, concatenate and finalize.
pub struct PipelineOrchestrator<T: ?Sized> {
    transcoder: Arc<T>,
    settings: PipelineSettings,
}

impl<T> PipelineOrchestrator<T>
where
    T: TranscodeExecutor + ?Sized,
{
    pub fn new(transcoder: Arc<T>, settings: PipelineSettings) -> Self {
        Self {
            transcoder,
            settings,
        }
    }

    /// Run `job` to completion. Never retries: the first failing stage ends
    /// the job and is reported as is.
    pub async fn run(&self, job: &PipelineJob) -> JobReport {
        let span = info_span!("job", job_id = %job.id, source = %job.source_path.display());
        async {
            let mut history = Vec::new();
            let outcome = self.execute(job, &mut history).await;
            match &outcome {
                Ok(path) => {
                    history.push(JobState::Done);
                    info!(output = %path.display(), "job done");
                }
                Err(e) => {
                    history.push(JobState::Failed);
                    error!(stage = %e.stage(), kind = e.kind(), error = %e, "job failed");
                }
            }
            JobReport {
                job_id: job.id,
                source_path: job.source_path.clone(),
                history,
                outcome,
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        job: &PipelineJob,
        history: &mut Vec<JobState>,
    ) -> Result<PathBuf, PipelineError> {
        validate(job)?;
        let transcoder = self.transcoder.as_ref();

        enter(history, JobState::Probing);
        let source = probe_source(transcoder, &job.source_path).await?;

        enter(history, JobState::Planning);
        let limit = max_segments(source.duration_seconds);
        if job.segment_count > limit {
            return Err(PipelineError::Planning {
                reason: format!(
                    "{} segments do not fit in {}s of video (at most {})",
                    job.segment_count, source.duration_seconds, limit
                ),
            });
        }
        let segments = {
            let mut rng = match self.settings.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            plan(
                source.duration_seconds,
                job.segment_count,
                job.segment_duration,
                &mut rng,
            )
        };
        if segments.is_empty() {
            return Err(PipelineError::Planning {
                reason: "no segments planned".to_string(),
            });
        }

        enter(history, JobState::Extracting);
        let workspace = JobWorkspace::create(&self.settings.work_dir, job.id).await?;
        let clips = extract_all(
            transcoder,
            &source,
            &segments,
            &workspace.staging_dir(),
            self.settings.extract_concurrency,
        )
        .await?;

        enter(history, JobState::Concatenating);
        let draft = concatenate(
            transcoder,
            &clips,
            &workspace.staging_dir(),
            &workspace.manifest_path(),
            &workspace.draft_path(),
        )
        .await
        .map_err(|e| PipelineError::at_stage(JobState::Concatenating, e, None))?;

        enter(history, JobState::Finalizing);
        let final_path = match final_output_path(&self.settings.output_dir).await {
            Ok(path) => path,
            Err(e) => {
                let _ = tokio::fs::remove_file(&draft).await;
                return Err(e);
            }
        };
        finalize(transcoder, &draft, &final_path)
            .await
            .map_err(|e| PipelineError::at_stage(JobState::Finalizing, e, None))
    }
}

fn enter(history: &mut Vec<JobState>, state: JobState) {
    info!(state = %state, "entering stage");
    history.push(state);
}

/// Reject parameters no plan can satisfy before spending a subprocess on them.
fn validate(job: &PipelineJob) -> Result<(), PipelineError> {
    if job.segment_count == 0 {
        return Err(PipelineError::Planning {
            reason: "segment count must be at least 1".to_string(),
        });
    }
    if !job.segment_duration.is_finite() || job.segment_duration <= 0.0 {
        return Err(PipelineError::Planning {
            reason: format!(
                "segment duration must be a positive number of seconds, got {}",
                job.segment_duration
            ),
        });
    }
    Ok(())
}
