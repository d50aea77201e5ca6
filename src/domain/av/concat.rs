use crate::ports::{TranscodeError, TranscodeExecutor};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Crop to 4:3 from the clip's own height, then mirror horizontally.
pub const DRAFT_VIDEO_FILTER: &str = "crop=in_h*4/3:in_h,hflip";

/// Join `clip_paths`, in order, into a single draft at `draft_path`.
///
/// On success the manifest and the whole `staging_dir` are removed. On
/// failure only the manifest is removed; the clips stay for inspection.
pub async fn concatenate<T>(
    transcoder: &T,
    clip_paths: &[PathBuf],
    staging_dir: &Path,
    manifest_path: &Path,
    draft_path: &Path,
) -> Result<PathBuf, TranscodeError>
where
    T: TranscodeExecutor + ?Sized,
{
    if clip_paths.is_empty() {
        return Err(TranscodeError::NoClips);
    }

    tokio::fs::write(manifest_path, manifest_contents(clip_paths))
        .await
        .map_err(|e| TranscodeError::io(manifest_path, e))?;

    let result = transcoder
        .concat(manifest_path, DRAFT_VIDEO_FILTER, draft_path)
        .await;

    if let Err(e) = tokio::fs::remove_file(manifest_path).await {
        warn!(path = %manifest_path.display(), error = %e, "could not remove concat manifest");
    }

    match result {
        Ok(()) => {
            info!(draft = %draft_path.display(), clips = clip_paths.len(), "combined clips into 4:3 draft");
            if let Err(e) = tokio::fs::remove_dir_all(staging_dir).await {
                warn!(path = %staging_dir.display(), error = %e, "could not remove staging directory");
            }
            Ok(draft_path.to_path_buf())
        }
        Err(e) => {
            error!(error = %e, staging = %staging_dir.display(), "concatenation failed, keeping clips");
            let _ = tokio::fs::remove_file(draft_path).await;
            Err(e)
        }
    }
}

/// Concat demuxer listing: one `file '<path>'` line per clip. Single quotes
/// inside a path close the quoted string, emit an escaped quote and reopen.
pub fn manifest_contents(clip_paths: &[PathBuf]) -> String {
    clip_paths
        .iter()
        .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', r"'\''")))
        .collect::<Vec<_>>()
        .join("\n")
}
