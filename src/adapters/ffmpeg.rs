//! ffmpeg / ffprobe subprocess adapter.

use crate::ports::{TranscodeError, TranscodeExecutor};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    video_codec: String,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(
        ffmpeg_path: impl Into<PathBuf>,
        ffprobe_path: impl Into<PathBuf>,
        video_codec: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            video_codec: video_codec.into(),
            timeout,
        }
    }

    /// Run `program`, killing it if it outlives the configured timeout.
    async fn run(&self, program: &Path, args: Vec<OsString>) -> Result<Output, TranscodeError> {
        let name = program_name(program);
        debug!(program = %name, ?args, "spawning transcoder");

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranscodeError::Spawn {
                program: name.clone(),
                source,
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| TranscodeError::Spawn {
                program: name.clone(),
                source,
            })?,
            Err(_) => {
                return Err(TranscodeError::Timeout {
                    program: name,
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                program: name,
                status: output.status.to_string(),
                stderr: last_lines(&String::from_utf8_lossy(&output.stderr), 5),
            });
        }
        Ok(output)
    }

    pub fn probe_args(source: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-v", "error", "-show_entries", "format=duration", "-of"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push("default=noprint_wrappers=1:nokey=1".into());
        args.push(source.into());
        args
    }

    pub fn trim_args(&self, source: &Path, start_time: f64, duration: f64, output: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-ss".into(),
            start_time.to_string().into(),
            "-i".into(),
            source.into(),
            "-t".into(),
            duration.to_string().into(),
            "-c:v".into(),
            self.video_codec.clone().into(),
            output.into(),
        ]
    }

    pub fn concat_args(&self, manifest: &Path, video_filter: &str, output: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            manifest.into(),
            "-vf".into(),
            video_filter.into(),
            "-c:v".into(),
            self.video_codec.clone().into(),
            output.into(),
        ]
    }

    pub fn pad_args(&self, input: &Path, video_filter: &str, output: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-i".into(),
            input.into(),
            "-vf".into(),
            video_filter.into(),
            "-c:v".into(),
            self.video_codec.clone().into(),
            output.into(),
        ]
    }
}

#[async_trait]
impl TranscodeExecutor for FfmpegTranscoder {
    async fn probe_duration(&self, source: &Path) -> Result<f64, TranscodeError> {
        let output = self.run(&self.ffprobe_path, Self::probe_args(source)).await?;
        parse_duration(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            TranscodeError::InvalidOutput {
                program: program_name(&self.ffprobe_path),
                output: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            }
        })
    }

    async fn trim(
        &self,
        source: &Path,
        start_time: f64,
        duration: f64,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        let args = self.trim_args(source, start_time, duration, output);
        self.run(&self.ffmpeg_path, args).await.map(|_| ())
    }

    async fn concat(
        &self,
        manifest: &Path,
        video_filter: &str,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        let args = self.concat_args(manifest, video_filter, output);
        self.run(&self.ffmpeg_path, args).await.map(|_| ())
    }

    async fn pad(
        &self,
        input: &Path,
        video_filter: &str,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        let args = self.pad_args(input, video_filter, output);
        self.run(&self.ffmpeg_path, args).await.map(|_| ())
    }
}

fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
}

fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.to_string_lossy().to_string())
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
