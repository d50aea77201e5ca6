use crate::domain::error::PipelineError;
use crate::domain::jobs::{JobState, SourceVideo};
use crate::ports::{TranscodeError, TranscodeExecutor};
use std::path::Path;
use tracing::debug;

/// Ask the transcoder how long `path` is.
pub async fn probe_source<T>(transcoder: &T, path: &Path) -> Result<SourceVideo, PipelineError>
where
    T: TranscodeExecutor + ?Sized,
{
    let duration_seconds = transcoder
        .probe_duration(path)
        .await
        .map_err(|e| PipelineError::at_stage(JobState::Probing, e, Some(path.to_path_buf())))?;

    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(PipelineError::Probe {
            path: path.to_path_buf(),
            source: TranscodeError::InvalidOutput {
                program: "probe".to_string(),
                output: duration_seconds.to_string(),
            },
        });
    }

    debug!(path = %path.display(), duration_seconds, "probed source video");
    Ok(SourceVideo {
        path: path.to_path_buf(),
        duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::transcoder::MockTranscodeExecutor;
    use std::io;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_probe_returns_duration() {
        let mut mock = MockTranscodeExecutor::new();
        mock.expect_probe_duration()
            .withf(|p| p.ends_with("clips/a.mp4"))
            .times(1)
            .returning(|_| Ok(120.5));

        let video = probe_source(&mock, Path::new("clips/a.mp4")).await.unwrap();
        assert_eq!(video.path, PathBuf::from("clips/a.mp4"));
        assert_eq!(video.duration_seconds, 120.5);
    }

    #[tokio::test]
    async fn test_probe_rejects_zero_duration() {
        let mut mock = MockTranscodeExecutor::new();
        mock.expect_probe_duration().returning(|_| Ok(0.0));

        let err = probe_source(&mock, Path::new("empty.mp4")).await.unwrap_err();
        assert_eq!(err.kind(), "ProbeFailure");
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let mut mock = MockTranscodeExecutor::new();
        mock.expect_probe_duration().returning(|_| {
            Err(TranscodeError::Spawn {
                program: "ffprobe".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            })
        });

        let err = probe_source(&mock, Path::new("missing.mp4")).await.unwrap_err();
        assert_eq!(err.stage(), JobState::Probing);
        assert!(err.to_string().contains("missing.mp4"));
    }
}
