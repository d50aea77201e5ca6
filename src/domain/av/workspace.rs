//! Per-job scratch paths.
//!
//! Every job gets its own staging directory, concat manifest and draft file,
//! all named after the job id, so two jobs running at once never touch each
//! other's intermediates.

use crate::domain::error::PipelineError;
use crate::domain::jobs::JobState;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JobWorkspace {
    root: PathBuf,
    job_id: Uuid,
}

impl JobWorkspace {
    /// Create the job's staging directory under `work_dir`.
    pub async fn create(work_dir: &Path, job_id: Uuid) -> Result<Self, PipelineError> {
        tokio::fs::create_dir_all(work_dir)
            .await
            .map_err(|source| PipelineError::Workspace {
                stage: JobState::Extracting,
                path: work_dir.to_path_buf(),
                source,
            })?;
        // The concat demuxer resolves relative entries against the manifest's
        // own directory, so keep everything absolute.
        let root = tokio::fs::canonicalize(work_dir)
            .await
            .map_err(|source| PipelineError::Workspace {
                stage: JobState::Extracting,
                path: work_dir.to_path_buf(),
                source,
            })?;

        let workspace = Self { root, job_id };
        let staging = workspace.staging_dir();
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|source| PipelineError::Workspace {
                stage: JobState::Extracting,
                path: staging.clone(),
                source,
            })?;
        Ok(workspace)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(format!("segments_{}", self.job_id))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(format!("concat_{}.txt", self.job_id))
    }

    pub fn draft_path(&self) -> PathBuf {
        self.root.join(format!("draft_video_{}.mp4", self.job_id))
    }
}

/// Reserve a free `combined_video_<epoch-ms>.mp4` name inside `output_dir`.
///
/// The name is claimed by creating an empty file, so two jobs finishing in
/// the same millisecond still get distinct outputs.
pub async fn final_output_path(output_dir: &Path) -> Result<PathBuf, PipelineError> {
    let workspace_err = |path: &Path, source: std::io::Error| PipelineError::Workspace {
        stage: JobState::Finalizing,
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| workspace_err(output_dir, e))?;

    let stamp = chrono::Utc::now().timestamp_millis();
    let mut candidate = output_dir.join(format!("combined_video_{}.mp4", stamp));
    let mut n = 1;
    loop {
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                candidate = output_dir.join(format!("combined_video_{}_{}.mp4", stamp, n));
                n += 1;
            }
            Err(e) => return Err(workspace_err(&candidate, e)),
        }
    }
}
