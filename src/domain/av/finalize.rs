use crate::ports::{TranscodeError, TranscodeExecutor};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Pad the height to 9/4 of itself with the picture centered vertically and
/// the width untouched: a 4:3 draft comes out 4:9.
pub const FINAL_VIDEO_FILTER: &str = "pad=iw:ih*9/4:0:(oh-ih)/2";

/// Pad `draft_path` into `final_path`. The draft is deleted either way; a
/// failed run also removes whatever was left at `final_path`.
pub async fn finalize<T>(
    transcoder: &T,
    draft_path: &Path,
    final_path: &Path,
) -> Result<PathBuf, TranscodeError>
where
    T: TranscodeExecutor + ?Sized,
{
    let result = transcoder
        .pad(draft_path, FINAL_VIDEO_FILTER, final_path)
        .await;

    if let Err(e) = tokio::fs::remove_file(draft_path).await {
        warn!(path = %draft_path.display(), error = %e, "could not remove draft");
    }

    match result {
        Ok(()) => {
            info!(output = %final_path.display(), "final video created");
            Ok(final_path.to_path_buf())
        }
        Err(e) => {
            error!(error = %e, "conversion to final aspect ratio failed");
            let _ = tokio::fs::remove_file(final_path).await;
            Err(e)
        }
    }
}
