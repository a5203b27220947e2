//! Locating a usable ffmpeg executable.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{FfwaveError, Result};

/// Strategy for finding the ffmpeg executable to run.
///
/// Resolution happens once, when a transcoder or streamer is constructed,
/// and a failure there is fatal for the component being built. Embedding
/// applications with bundled binaries or platform-specific search rules
/// provide their own implementation.
pub trait FfmpegLocator {
    /// Returns the path of the executable to invoke.
    fn resolve_executable_path(&self) -> Result<PathBuf>;
}

/// Locator that trusts `PATH`, after checking that `ffmpeg -version`
/// actually reports a version banner.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLocator;

impl PathLocator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FfmpegLocator for PathLocator {
    fn resolve_executable_path(&self) -> Result<PathBuf> {
        let output = Command::new("ffmpeg")
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                FfwaveError::ExecutableNotFound(format!("ffmpeg is not runnable from PATH: {e}"))
            })?;

        // Older builds print the banner on stderr instead of stdout.
        let mut banner = String::from_utf8_lossy(&output.stdout).into_owned();
        banner.push_str(&String::from_utf8_lossy(&output.stderr));
        if !banner.to_ascii_lowercase().contains("version") {
            return Err(FfwaveError::ExecutableNotFound(
                "ffmpeg on PATH did not report a version".to_string(),
            ));
        }

        log::debug!("Found ffmpeg on PATH");
        Ok(PathBuf::from("ffmpeg"))
    }
}
