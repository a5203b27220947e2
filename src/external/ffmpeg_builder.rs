//! Builds argument lists for the external ffmpeg binary.
//!
//! An invocation is assembled as a list of typed tokens and handed to the
//! operating system one argv element at a time. Nothing is ever joined into
//! a shell string, so paths with spaces or shell metacharacters need no
//! quoting.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::attributes::Attributes;

/// One argument token of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// A fixed flag or value, passed verbatim.
    Literal(String),
    /// A filesystem path, passed as a single argument.
    Path(PathBuf),
}

/// A fully assembled invocation: the program plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub program: PathBuf,
    pub args: Vec<Arg>,
}

impl CommandInvocation {
    /// Renders the invocation as a `std::process::Command`.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        for arg in &self.args {
            match arg {
                Arg::Literal(value) => command.arg(value),
                Arg::Path(path) => command.arg(path),
            };
        }
        command
    }

    /// Loggable rendering of the command line.
    #[must_use]
    pub fn display_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            match arg {
                Arg::Literal(value) => line.push_str(value),
                Arg::Path(path) => line.push_str(&path.display().to_string()),
            }
        }
        line
    }
}

/// Assembles the ordered argument list for one ffmpeg invocation.
///
/// Flag order is fixed: seek, input, video suppression, codec parameters,
/// container format, then the output sink. Attributes that are unset are
/// omitted entirely so the tool falls back to its own defaults.
#[derive(Debug, Clone)]
pub struct FfmpegCommandBuilder {
    program: PathBuf,
    args: Vec<Arg>,
}

impl FfmpegCommandBuilder {
    /// Starts a builder for the given executable.
    #[must_use]
    pub fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Adds the decode side: an optional seek offset, then the source.
    ///
    /// On its own this is the probe shape; finish with [`Self::build`] to
    /// make ffmpeg print what it knows about the source and exit.
    #[must_use]
    pub fn input(mut self, source: &Path, seek_time_ms: Option<u64>) -> Self {
        if let Some(offset) = seek_time_ms {
            self.push_literal("-ss");
            self.push_literal(&format_seek_time(offset));
        }
        self.push_literal("-i");
        self.push_path(source);
        self
    }

    /// Adds the encode side from the attribute set: audio-only selection,
    /// codec parameters in fixed order, then the container format.
    #[must_use]
    pub fn encoding(mut self, attributes: &Attributes) -> Self {
        self.push_literal("-vn");
        if let Some(codec) = &attributes.codec {
            self.push_literal("-acodec");
            self.push_literal(codec);
        }
        if let Some(bit_rate) = attributes.bit_rate {
            self.push_literal("-ab");
            self.push_literal(&bit_rate.to_string());
        }
        if let Some(channels) = attributes.channels {
            self.push_literal("-ac");
            self.push_literal(&channels.to_string());
        }
        if let Some(sampling_rate) = attributes.sampling_rate {
            self.push_literal("-ar");
            self.push_literal(&sampling_rate.to_string());
        }
        if let Some(volume) = attributes.volume {
            self.push_literal("-vol");
            self.push_literal(&volume.to_string());
        }
        if let Some(format) = &attributes.format {
            self.push_literal("-f");
            self.push_literal(format);
        }
        self
    }

    /// Finishes with an overwrite-enabled file sink.
    #[must_use]
    pub fn output_file(mut self, target: &Path) -> CommandInvocation {
        self.push_literal("-y");
        self.push_path(target);
        self.build()
    }

    /// Finishes with the standard-output sink.
    #[must_use]
    pub fn output_pipe(mut self) -> CommandInvocation {
        self.push_literal("pipe:1");
        self.build()
    }

    /// Finishes without a sink.
    #[must_use]
    pub fn build(self) -> CommandInvocation {
        CommandInvocation {
            program: self.program,
            args: self.args,
        }
    }

    fn push_literal(&mut self, value: &str) {
        self.args.push(Arg::Literal(value.to_string()));
    }

    fn push_path(&mut self, path: &Path) {
        self.args.push(Arg::Path(path.to_path_buf()));
    }
}

/// Renders a millisecond offset in the tool's `HH:MM:SS.mmm` seek syntax.
/// The hour field is two digits wide, so offsets wrap at 100 hours.
fn format_seek_time(offset_ms: u64) -> String {
    let hours = (offset_ms / 3_600_000) % 100;
    let minutes = (offset_ms / 60_000) % 60;
    let seconds = (offset_ms / 1_000) % 60;
    let millis = offset_ms % 1_000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
