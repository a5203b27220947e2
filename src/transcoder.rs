//! Transcode orchestration: precondition checks, execution, and result
//! validation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::attributes::Attributes;
use crate::error::{FfwaveError, Result, invalid_source};
use crate::external::ffmpeg_builder::FfmpegCommandBuilder;
use crate::external::ffmpeg_executor::{FfmpegExecutor, ProcessRunner};
use crate::external::locator::FfmpegLocator;
use crate::external::probe;

/// Tolerated difference between source and target durations after a
/// transcode. Container padding and encoder delay account for small gaps;
/// anything larger means the tool stopped early or looped.
const DURATION_TOLERANCE_MS: u64 = 3_000;

/// Drives ffmpeg through complete transcode and probe operations.
///
/// The executable is resolved through the locator once, at construction.
pub struct Transcoder<R = FfmpegExecutor> {
    ffmpeg: PathBuf,
    runner: R,
}

impl Transcoder<FfmpegExecutor> {
    /// Builds a transcoder around the default watchdog runner.
    pub fn new(locator: &dyn FfmpegLocator) -> Result<Self> {
        Self::with_runner(locator, FfmpegExecutor::new())
    }
}

impl<R: ProcessRunner> Transcoder<R> {
    /// Builds a transcoder around a caller-supplied runner.
    pub fn with_runner(locator: &dyn FfmpegLocator, runner: R) -> Result<Self> {
        Ok(Self {
            ffmpeg: locator.resolve_executable_path()?,
            runner,
        })
    }

    /// Transcodes `source` into `target` with the requested attributes.
    ///
    /// Parent directories of the target are created as needed and an
    /// existing target is overwritten. After the tool finishes, the target
    /// is checked for emptiness and, when the durations of both files are
    /// known, for agreement with the source duration.
    pub fn encode(&self, source: &Path, target: &Path, attributes: &Attributes) -> Result<()> {
        check_source(source)?;
        if attributes.format.is_none() {
            return Err(FfwaveError::MissingAttribute("format"));
        }

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        log::info!("Transcoding {} to {}", source.display(), target.display());
        let invocation = FfmpegCommandBuilder::new(&self.ffmpeg)
            .input(source, attributes.seek_time)
            .encoding(attributes)
            .output_file(target);
        let result = self.runner.run(&invocation)?;
        log::debug!(
            "Transcode process finished after {:.1} seconds",
            result.elapsed.as_secs_f64()
        );

        if fs::metadata(target).map(|m| m.len()).unwrap_or(0) == 0 {
            return Err(FfwaveError::EmptyOutput(target.display().to_string()));
        }
        self.verify_durations(source, target)?;

        log::info!("Transcoded {} to {}", source.display(), target.display());
        Ok(())
    }

    /// Probes `source` and returns the attributes ffmpeg reports for it.
    ///
    /// The probe invocation has no output sink, which the tool treats as an
    /// error after printing what it knows; its exit code 1 is accepted by
    /// the default runner.
    pub fn get_info(&self, source: &Path) -> Result<Attributes> {
        let invocation = FfmpegCommandBuilder::new(&self.ffmpeg)
            .input(source, None)
            .build();
        let result = self.runner.run(&invocation)?;
        let probe = probe::parse_probe_output(source, &result.output)?;
        Ok(probe.into_attributes())
    }

    /// Returns true when `target` does not already carry the requested
    /// encoding: it is missing, cannot be probed, or its reported sampling
    /// rate, channel count, or format disagree with the request.
    pub fn transcoding_required(&self, target: &Path, attributes: &Attributes) -> bool {
        if !target.exists() {
            return true;
        }
        match self.get_info(target) {
            Ok(info) => !matches_encoding(&info, attributes),
            Err(e) => {
                log::warn!(
                    "Could not get information about {}: {}",
                    target.display(),
                    e
                );
                true
            }
        }
    }

    /// Compares the durations of two files, skipping the check when either
    /// probe does not report one.
    fn verify_durations(&self, source: &Path, target: &Path) -> Result<()> {
        let source_info = self.get_info(source)?;
        let target_info = self.get_info(target)?;
        if let (Some(source_ms), Some(target_ms)) = (source_info.duration, target_info.duration) {
            if source_ms.abs_diff(target_ms) > DURATION_TOLERANCE_MS {
                return Err(FfwaveError::DurationMismatch(source_ms, target_ms));
            }
        }
        Ok(())
    }
}

/// Checks whether a probed file already satisfies the requested encoding.
/// Only fields the request specifies are compared; the probed format may
/// match either the requested codec or the requested container name.
fn matches_encoding(probed: &Attributes, requested: &Attributes) -> bool {
    if requested.sampling_rate.is_some() && probed.sampling_rate != requested.sampling_rate {
        return false;
    }
    if requested.channels.is_some() && probed.channels != requested.channels {
        return false;
    }
    if requested.codec.is_none() && requested.format.is_none() {
        return true;
    }
    let Some(probed_format) = probed.format.as_deref() else {
        return false;
    };
    let codec_matches = requested
        .codec
        .as_deref()
        .is_some_and(|codec| codec.eq_ignore_ascii_case(probed_format));
    let format_matches = requested
        .format
        .as_deref()
        .is_some_and(|format| format.eq_ignore_ascii_case(probed_format));
    codec_matches || format_matches
}

fn check_source(source: &Path) -> Result<()> {
    let metadata =
        fs::metadata(source).map_err(|_| invalid_source(source, "it does not exist"))?;
    if metadata.is_dir() {
        return Err(invalid_source(
            source,
            "it is a directory, not a readable audio file",
        ));
    }
    if let Err(e) = fs::File::open(source) {
        return Err(invalid_source(
            source,
            &format!("it can not be read, check file permissions ({e})"),
        ));
    }
    Ok(())
}
