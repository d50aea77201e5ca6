//! In-memory stand-in for ffmpeg that writes placeholder files and records
//! every call it receives.

use crate::ports::{TranscodeError, TranscodeExecutor};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct TrimCall {
    pub source: PathBuf,
    pub start_time: f64,
    pub duration: f64,
    pub output: PathBuf,
}

#[derive(Default)]
struct Calls {
    probes: Vec<PathBuf>,
    trims: Vec<TrimCall>,
    manifests: Vec<PathBuf>,
    pads: usize,
}

pub struct FakeTranscoder {
    duration: f64,
    fail_probe: bool,
    fail_trim: Option<usize>,
    fail_concat: bool,
    fail_pad: bool,
    calls: Mutex<Calls>,
}

impl FakeTranscoder {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration,
            fail_probe: false,
            fail_trim: None,
            fail_concat: false,
            fail_pad: false,
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    /// Fail the cut that writes `segment_<index>.mp4`.
    pub fn failing_trim(mut self, index: usize) -> Self {
        self.fail_trim = Some(index);
        self
    }

    pub fn failing_concat(mut self) -> Self {
        self.fail_concat = true;
        self
    }

    pub fn failing_pad(mut self) -> Self {
        self.fail_pad = true;
        self
    }

    pub fn probes(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().probes.clone()
    }

    pub fn trims(&self) -> Vec<TrimCall> {
        self.calls.lock().unwrap().trims.clone()
    }

    pub fn manifests(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().manifests.clone()
    }

    pub fn concat_calls(&self) -> usize {
        self.calls.lock().unwrap().manifests.len()
    }

    pub fn pad_calls(&self) -> usize {
        self.calls.lock().unwrap().pads
    }
}

fn failed(stderr: &str) -> TranscodeError {
    TranscodeError::Failed {
        program: "ffmpeg".to_string(),
        status: "exit status: 1".to_string(),
        stderr: stderr.to_string(),
    }
}

fn write(path: &Path, contents: &[u8]) -> Result<(), TranscodeError> {
    std::fs::write(path, contents).map_err(|e| TranscodeError::io(path, e))
}

#[async_trait]
impl TranscodeExecutor for FakeTranscoder {
    async fn probe_duration(&self, source: &Path) -> Result<f64, TranscodeError> {
        self.calls.lock().unwrap().probes.push(source.to_path_buf());
        if self.fail_probe {
            return Err(TranscodeError::Failed {
                program: "ffprobe".to_string(),
                status: "exit status: 1".to_string(),
                stderr: format!("{}: No such file or directory", source.display()),
            });
        }
        Ok(self.duration)
    }

    async fn trim(
        &self,
        source: &Path,
        start_time: f64,
        duration: f64,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        self.calls.lock().unwrap().trims.push(TrimCall {
            source: source.to_path_buf(),
            start_time,
            duration,
            output: output.to_path_buf(),
        });
        if let Some(index) = self.fail_trim {
            if output.ends_with(format!("segment_{}.mp4", index)) {
                return Err(failed("Conversion failed!"));
            }
        }
        write(output, format!("{}+{}", start_time, duration).as_bytes())
    }

    async fn concat(
        &self,
        manifest: &Path,
        _video_filter: &str,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        self.calls.lock().unwrap().manifests.push(manifest.to_path_buf());
        if self.fail_concat {
            return Err(failed("Impossible to open clip"));
        }
        let listing = std::fs::read_to_string(manifest).map_err(|e| TranscodeError::io(manifest, e))?;
        for line in listing.lines() {
            let clip = line.trim_start_matches("file '").trim_end_matches('\'');
            if !Path::new(clip).exists() {
                return Err(failed(&format!("{}: No such file or directory", clip)));
            }
        }
        write(output, b"draft")
    }

    async fn pad(
        &self,
        input: &Path,
        _video_filter: &str,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        self.calls.lock().unwrap().pads += 1;
        if self.fail_pad || !input.exists() {
            return Err(failed("pad failed"));
        }
        write(output, b"final")
    }
}
