//! Configuration loaded from the environment (and `.env`, when present).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// Encoder passed to `-c:v` for every re-encode
    pub video_codec: String,
    /// Directory the submitted video names are resolved against
    pub root_dir_video: PathBuf,
    /// Where finished videos are written
    pub output_dir: PathBuf,
    /// Parent of the per-job staging directories
    pub work_dir: PathBuf,
    pub default_segment_duration: f64,
    pub default_segment_count: usize,
    pub extract_concurrency: usize,
    /// Upper bound on a single ffmpeg/ffprobe run
    pub transcode_timeout: Duration,
    /// Pause between two videos of the same batch
    pub batch_delay: Duration,
    /// Batches allowed to run at the same time
    pub max_concurrent_jobs: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| var(key).unwrap_or_else(|| String::from(default));
        let number = |key: &str, default: u64| {
            var(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        Self {
            addr: string("ADDR", "127.0.0.1"),
            port: string("PORT", "3000"),
            ffmpeg_path: PathBuf::from(string("FFMPEG_PATH", "ffmpeg")),
            ffprobe_path: PathBuf::from(string("FFPROBE_PATH", "ffprobe")),
            video_codec: string("VIDEO_CODEC", "libx264"),
            root_dir_video: PathBuf::from(string("ROOT_DIR_VIDEO", "./videos")),
            output_dir: PathBuf::from(string("OUTPUT_DIR", "./output")),
            work_dir: PathBuf::from(string("WORK_DIR", "./work")),
            default_segment_duration: var("DEFAULT_SEGMENT_DURATION")
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(2.0),
            default_segment_count: number("DEFAULT_SEGMENT_COUNT", 60) as usize,
            extract_concurrency: (number("EXTRACT_CONCURRENCY", 5) as usize).max(1),
            transcode_timeout: Duration::from_secs(number("TRANSCODE_TIMEOUT_SECS", 600)),
            batch_delay: Duration::from_millis(number("BATCH_DELAY_MS", 1000)),
            max_concurrent_jobs: (number("MAX_CONCURRENT_JOBS", 1) as usize).max(1),
        }
    }
}
