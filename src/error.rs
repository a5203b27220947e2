//! Error types for transcoding, probing, and streaming operations.

use std::path::Path;

use thiserror::Error;

/// Errors produced while driving the external ffmpeg binary.
#[derive(Error, Debug)]
pub enum FfwaveError {
    #[error("Invalid source {0}: {1}")]
    InvalidSource(String, String),

    #[error("The {0} attribute must be set for this operation")]
    MissingAttribute(&'static str),

    #[error("No media attributes recognized in decoder output for {0}")]
    UnrecognizedFormat(String),

    #[error("Failed to start {0}: {1}")]
    ProcessSpawnFailed(String, std::io::Error),

    #[error("Process timed out after {0} seconds")]
    ProcessTimedOut(u64),

    #[error("Process exited with unexpected code {0}: {1}")]
    ProcessExitRejected(i32, String),

    #[error("The size of the target {0} is zero bytes, nothing was transcoded")]
    EmptyOutput(String),

    #[error("Source and target should have a similar duration (source {0} ms, target {1} ms)")]
    DurationMismatch(u64, u64),

    #[error("Streaming only supports the wav format, not {0}")]
    UnsupportedStreamFormat(String),

    #[error("Could not read the stream header within {0} seconds")]
    PipeHeaderTimeout(u64),

    #[error("Stream ended after {0} of {1} header bytes, sample frames would be mis-aligned")]
    PipeHeaderIncomplete(usize, usize),

    #[error("No usable ffmpeg executable: {0}")]
    ExecutableNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ffwave operations.
pub type Result<T> = std::result::Result<T, FfwaveError>;

/// Builds an `InvalidSource` error for `path`.
pub(crate) fn invalid_source(path: &Path, reason: &str) -> FfwaveError {
    FfwaveError::InvalidSource(path.display().to_string(), reason.to_string())
}
