//! Failure taxonomy of a pipeline job.

use crate::domain::jobs::JobState;
use crate::ports::TranscodeError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// One clip that could not be cut.
#[derive(Debug)]
pub struct SegmentFailure {
    pub index: usize,
    pub error: TranscodeError,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not probe {}: {source}", .path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: TranscodeError,
    },

    #[error("invalid segment plan: {reason}")]
    Planning { reason: String },

    #[error("{}", summarize_failures(.failures, .total))]
    Extraction {
        failures: Vec<SegmentFailure>,
        total: usize,
    },

    #[error("concatenation failed: {0}")]
    Concatenation(#[source] TranscodeError),

    #[error("finalization failed: {0}")]
    Finalization(#[source] TranscodeError),

    #[error("{stage} timed out after {timeout:?}{}", describe_segment(.segment))]
    Timeout {
        stage: JobState,
        timeout: Duration,
        /// Clip being cut when the deadline hit, for extraction timeouts.
        segment: Option<usize>,
        #[source]
        source: TranscodeError,
    },

    #[error("workspace error at {}: {source}", .path.display())]
    Workspace {
        stage: JobState,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Wraps a transcoder error raised while in `stage`, promoting deadline
    /// expiries to [`PipelineError::Timeout`].
    pub fn at_stage(stage: JobState, error: TranscodeError, probed: Option<PathBuf>) -> Self {
        if let TranscodeError::Timeout { timeout, .. } = &error {
            return PipelineError::Timeout {
                stage,
                timeout: *timeout,
                segment: None,
                source: error,
            };
        }
        match stage {
            JobState::Probing => PipelineError::Probe {
                path: probed.unwrap_or_default(),
                source: error,
            },
            JobState::Finalizing => PipelineError::Finalization(error),
            // concat is the only other single-invocation stage
            _ => PipelineError::Concatenation(error),
        }
    }

    /// The stage the job was in when it failed.
    pub fn stage(&self) -> JobState {
        match self {
            PipelineError::Probe { .. } => JobState::Probing,
            PipelineError::Planning { .. } => JobState::Planning,
            PipelineError::Extraction { .. } => JobState::Extracting,
            PipelineError::Concatenation(_) => JobState::Concatenating,
            PipelineError::Finalization(_) => JobState::Finalizing,
            PipelineError::Timeout { stage, .. } => *stage,
            PipelineError::Workspace { stage, .. } => *stage,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Probe { .. } => "ProbeFailure",
            PipelineError::Planning { .. } => "PlanningFailure",
            PipelineError::Extraction { .. } => "ExtractionFailure",
            PipelineError::Concatenation(_) => "ConcatenationFailure",
            PipelineError::Finalization(_) => "FinalizationFailure",
            PipelineError::Timeout { .. } => "TimeoutFailure",
            PipelineError::Workspace { .. } => "WorkspaceFailure",
        }
    }
}

fn describe_segment(segment: &Option<usize>) -> String {
    match segment {
        Some(index) => format!(" (segment {})", index),
        None => String::new(),
    }
}

fn summarize_failures(failures: &[SegmentFailure], total: &usize) -> String {
    match failures.first() {
        Some(first) => format!(
            "{} of {} segment extractions failed (first: segment {}: {})",
            failures.len(),
            total,
            first.index,
            first.error
        ),
        None => format!("segment extraction failed for {} segments", total),
    }
}
