use crate::domain::error::{PipelineError, SegmentFailure};
use crate::domain::jobs::{JobState, SegmentSpec, SourceVideo};
use crate::ports::{TranscodeError, TranscodeExecutor};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

/// Number of clips cut at the same time for one job.
pub const DEFAULT_EXTRACT_CONCURRENCY: usize = 5;

/// Cut a single planned clip out of `source` into `output_path`.
pub async fn extract_segment<T>(
    transcoder: &T,
    source: &SourceVideo,
    spec: &SegmentSpec,
    output_path: &Path,
) -> Result<(), TranscodeError>
where
    T: TranscodeExecutor + ?Sized,
{
    transcoder
        .trim(&source.path, spec.start_time, spec.duration, output_path)
        .await
}

/// Cut every clip of `plan` into `staging_dir`, at most `concurrency` at a
/// time.
///
/// A failing clip does not stop its siblings, but the call only succeeds if
/// every clip was produced. Clip paths come back in plan order.
pub async fn extract_all<T>(
    transcoder: &T,
    source: &SourceVideo,
    plan: &[SegmentSpec],
    staging_dir: &Path,
    concurrency: usize,
) -> Result<Vec<PathBuf>, PipelineError>
where
    T: TranscodeExecutor + ?Sized,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let clip_paths: Vec<PathBuf> = (0..plan.len())
        .map(|i| staging_dir.join(format!("segment_{}.mp4", i)))
        .collect();

    let tasks = plan.iter().zip(&clip_paths).enumerate().map(|(i, (spec, out))| {
        let semaphore = semaphore.clone();
        async move {
            // The semaphore is never closed.
            let _permit = semaphore.acquire().await.ok();
            let result = extract_segment(transcoder, source, spec, out).await;
            match &result {
                Ok(()) => info!(segment = i, path = %out.display(), "segment created"),
                Err(e) => error!(segment = i, error = %e, "failed to process segment"),
            }
            (i, result)
        }
    });

    let mut failures: Vec<SegmentFailure> = join_all(tasks)
        .await
        .into_iter()
        .filter_map(|(index, result)| result.err().map(|error| SegmentFailure { index, error }))
        .collect();

    if failures.is_empty() {
        return Ok(clip_paths);
    }

    // A missed deadline outranks ordinary failures.
    if let Some(pos) = failures.iter().position(|f| f.error.is_timeout()) {
        let failure = failures.swap_remove(pos);
        if let TranscodeError::Timeout { timeout, .. } = &failure.error {
            return Err(PipelineError::Timeout {
                stage: JobState::Extracting,
                timeout: *timeout,
                segment: Some(failure.index),
                source: failure.error,
            });
        }
    }

    Err(PipelineError::Extraction {
        failures,
        total: plan.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::transcoder::MockTranscodeExecutor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn source() -> SourceVideo {
        SourceVideo {
            path: PathBuf::from("/videos/source.mp4"),
            duration_seconds: 120.0,
        }
    }

    fn specs(n: usize) -> Vec<SegmentSpec> {
        (0..n)
            .map(|i| SegmentSpec {
                start_time: i as f64 * 30.0,
                duration: 2.0,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_extract_segment_passes_spec_to_transcoder() {
        let mut mock = MockTranscodeExecutor::new();
        mock.expect_trim()
            .withf(|src, start, dur, out| {
                src == Path::new("/videos/source.mp4")
                    && *start == 12.34
                    && *dur == 2.0
                    && out == Path::new("/tmp/seg.mp4")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let spec = SegmentSpec {
            start_time: 12.34,
            duration: 2.0,
        };
        extract_segment(&mock, &source(), &spec, Path::new("/tmp/seg.mp4"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_extract_all_returns_paths_in_plan_order() {
        let dir = tempdir().unwrap();
        let mut mock = MockTranscodeExecutor::new();
        mock.expect_trim().times(4).returning(|_, _, _, _| Ok(()));

        let paths = extract_all(&mock, &source(), &specs(4), dir.path(), 2)
            .await
            .unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["segment_0.mp4", "segment_1.mp4", "segment_2.mp4", "segment_3.mp4"]
        );
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_batch_but_siblings_still_run() {
        let dir = tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut mock = MockTranscodeExecutor::new();
        mock.expect_trim().times(5).returning(move |_, start, _, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            if start == 60.0 {
                Err(TranscodeError::Failed {
                    program: "ffmpeg".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "Invalid data found".to_string(),
                })
            } else {
                Ok(())
            }
        });

        let err = extract_all(&mock, &source(), &specs(5), dir.path(), 5)
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        match err {
            PipelineError::Extraction { failures, total } => {
                assert_eq!(total, 5);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timed_out_clip_reports_timeout_with_its_index() {
        let dir = tempdir().unwrap();
        let mut mock = MockTranscodeExecutor::new();
        mock.expect_trim().times(4).returning(|_, start, _, _| {
            if start == 30.0 {
                Err(TranscodeError::Failed {
                    program: "ffmpeg".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "Invalid data found".to_string(),
                })
            } else if start == 60.0 {
                Err(TranscodeError::Timeout {
                    program: "ffmpeg".to_string(),
                    timeout: Duration::from_secs(600),
                })
            } else {
                Ok(())
            }
        });

        let err = extract_all(&mock, &source(), &specs(4), dir.path(), 2)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "TimeoutFailure");
        assert_eq!(err.stage(), JobState::Extracting);
        match &err {
            PipelineError::Timeout {
                segment, timeout, ..
            } => {
                assert_eq!(*segment, Some(2));
                assert_eq!(*timeout, Duration::from_secs(600));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("(segment 2)"), "{}", err);
    }

    struct SlowTranscoder {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TranscodeExecutor for SlowTranscoder {
        async fn probe_duration(&self, _: &Path) -> Result<f64, TranscodeError> {
            Ok(0.0)
        }

        async fn trim(&self, _: &Path, _: f64, _: f64, _: &Path) -> Result<(), TranscodeError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        async fn concat(&self, _: &Path, _: &str, _: &Path) -> Result<(), TranscodeError> {
            Ok(())
        }

        async fn pad(&self, _: &Path, _: &str, _: &Path) -> Result<(), TranscodeError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_pool_width_bounds_parallel_invocations() {
        let dir = tempdir().unwrap();
        let transcoder = SlowTranscoder {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };

        extract_all(&transcoder, &source(), &specs(12), dir.path(), 3)
            .await
            .unwrap();
        let peak = transcoder.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency was {}", peak);
        assert!(peak >= 2);
    }
}
