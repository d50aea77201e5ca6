use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("unexpected {program} output: {output:?}")]
    InvalidOutput { program: String, output: String },

    #[error("no clips to concatenate")]
    NoClips,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TranscodeError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        TranscodeError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TranscodeError::Timeout { .. })
    }
}

/// The external media tool the pipeline delegates every codec operation to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscodeExecutor: Send + Sync {
    /// Container duration of `source`, in seconds.
    async fn probe_duration(&self, source: &Path) -> Result<f64, TranscodeError>;

    /// Cut `duration` seconds starting at `start_time` out of `source`.
    async fn trim(
        &self,
        source: &Path,
        start_time: f64,
        duration: f64,
        output: &Path,
    ) -> Result<(), TranscodeError>;

    /// Join the inputs listed in a concat manifest, applying `video_filter`.
    async fn concat(
        &self,
        manifest: &Path,
        video_filter: &str,
        output: &Path,
    ) -> Result<(), TranscodeError>;

    /// Re-encode `input` through a single `video_filter` expression.
    async fn pad(&self, input: &Path, video_filter: &str, output: &Path)
        -> Result<(), TranscodeError>;
}
