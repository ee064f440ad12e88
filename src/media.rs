//! Media duration probing.
//!
//! Scans only ask one question of a media file: how long does it play. The
//! [`MediaProbe`] trait is that seam; [`FfprobeProbe`] answers it with the
//! `ffprobe` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The probe ran but could not read a duration from the file.
    #[error("Could not read duration of {path}: {message}")]
    Unreadable { path: PathBuf, message: String },
}

/// Returns the playing time of a media file in seconds.
pub trait MediaProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// Probe backed by `ffprobe` from FFmpeg.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self {
            program: "ffprobe".to_string(),
        }
    }
}

impl FfprobeProbe {
    /// Use a specific ffprobe binary instead of the one on `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl MediaProbe for FfprobeProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64, ProbeError> {
        let output = Command::new(&self.program)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Unreadable {
                path: path.to_path_buf(),
                message: format!("{} exited with {}", self.program, output.status),
            });
        }

        parse_ffprobe_duration(&output.stdout).ok_or_else(|| ProbeError::Unreadable {
            path: path.to_path_buf(),
            message: "no format.duration in ffprobe output".to_string(),
        })
    }
}

/// Pull `format.duration` out of `ffprobe -print_format json -show_format`.
///
/// ffprobe reports the duration as a decimal string.
fn parse_ffprobe_duration(stdout: &[u8]) -> Option<f64> {
    let json: serde_json::Value = serde_json::from_slice(stdout).ok()?;
    let duration = &json["format"]["duration"];
    duration
        .as_str()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .or_else(|| duration.as_f64())
}
