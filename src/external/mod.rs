//! Interactions with the external ffmpeg binary.
//!
//! Everything that touches the tool lives here: locating the executable,
//! assembling argument lists, running the process under a watchdog, and
//! scraping media attributes out of its diagnostic output. Orchestration
//! code upstream consumes these pieces through small traits so it can be
//! tested without a real decoder.

pub mod ffmpeg_builder;
pub mod ffmpeg_executor;
pub mod locator;
pub mod probe;

pub use ffmpeg_builder::{Arg, CommandInvocation, FfmpegCommandBuilder};
pub use ffmpeg_executor::{FfmpegExecutor, ProcessResult, ProcessRunner};
pub use locator::{FfmpegLocator, PathLocator};
pub use probe::{MediaProbe, parse_probe_output};
