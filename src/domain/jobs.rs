use crate::domain::error::PipelineError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// A source video whose duration has been probed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceVideo {
    pub path: PathBuf,
    pub duration_seconds: f64,
}

/// One planned clip: where to seek and how long to cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpec {
    pub start_time: f64,
    pub duration: f64,
}

/// One video to turn into a remix.
#[derive(Debug, Clone)]
pub struct PipelineJob {
    pub id: Uuid,
    pub source_path: PathBuf,
    pub segment_duration: f64,
    pub segment_count: usize,
}

impl PipelineJob {
    pub fn new(source_path: PathBuf, segment_duration: f64, segment_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_path,
            segment_duration,
            segment_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    Probing,
    Planning,
    Extracting,
    Concatenating,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Probing => "Probing",
            JobState::Planning => "Planning",
            JobState::Extracting => "Extracting",
            JobState::Concatenating => "Concatenating",
            JobState::Finalizing => "Finalizing",
            JobState::Done => "Done",
            JobState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// What a job ended with, plus the states it went through to get there.
#[derive(Debug)]
pub struct JobReport {
    pub job_id: Uuid,
    pub source_path: PathBuf,
    pub history: Vec<JobState>,
    pub outcome: Result<PathBuf, PipelineError>,
}

impl JobReport {
    pub fn state(&self) -> JobState {
        match self.outcome {
            Ok(_) => JobState::Done,
            Err(_) => JobState::Failed,
        }
    }

    pub fn output_path(&self) -> Option<&PathBuf> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.outcome.as_ref().err()
    }
}
