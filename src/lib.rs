//! Core library for audio transcoding and PCM streaming through the ffmpeg
//! command-line tool.
//!
//! This crate builds decoder invocations from declarative attribute sets,
//! runs them under a watchdog, scrapes media properties out of the tool's
//! diagnostic output, and exposes live WAV decoding as a readable stream.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ffwave::{PathLocator, Preset, Transcoder};
//! use std::path::Path;
//!
//! let locator = PathLocator::new();
//! let transcoder = Transcoder::new(&locator).unwrap();
//!
//! let attributes = Preset::MP3_128KBS_STEREO_44KHZ.attributes();
//! transcoder
//!     .encode(
//!         Path::new("/music/original.flac"),
//!         Path::new("/music/converted.mp3"),
//!         &attributes,
//!     )
//!     .unwrap();
//!
//! let info = transcoder.get_info(Path::new("/music/converted.mp3")).unwrap();
//! println!("duration: {:?} ms", info.duration);
//! ```

pub mod attributes;
pub mod error;
pub mod external;
pub mod presets;
pub mod streamer;
pub mod transcoder;

// Re-exports for public API
pub use attributes::Attributes;
pub use error::{FfwaveError, Result};
pub use external::{
    Arg, CommandInvocation, FfmpegCommandBuilder, FfmpegExecutor, FfmpegLocator, MediaProbe,
    PathLocator, ProcessResult, ProcessRunner, parse_probe_output,
};
pub use presets::Preset;
pub use streamer::{PcmFormat, PcmStream, StreamOutcome, Streamer};
pub use transcoder::Transcoder;
