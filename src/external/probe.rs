//! Recovery of media attributes from the decoder's diagnostic output.
//!
//! There is no structured interface to what ffmpeg knows about an input in
//! this invocation style; the tool prints it as free text while opening the
//! file. This module scrapes that text with the patterns the tool has used
//! for years. The patterns are private and everything downstream sees only
//! [`MediaProbe`], so a change in the tool's phrasing stays contained here.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::error::{FfwaveError, Result};

static INPUT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Input #0, (\w+)").unwrap());

static DURATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Duration: (\d\d):(\d\d):(\d\d)\.(\d)").unwrap());

static STREAM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*Stream #\S+: (Audio|Video|Data): (.*)$").unwrap());

static SAMPLING_RATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s+Hz").unwrap());

static CHANNELS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(mono|stereo|.*(\d+).*channels)").unwrap());

static BIT_RATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s+kb/s").unwrap());

/// Media attributes recovered from one probe.
///
/// Fields the diagnostic text did not yield stay unset; nothing is
/// defaulted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaProbe {
    /// Container name from the input line, replaced by the first token of
    /// the audio stream description when one is present.
    pub format: Option<String>,
    /// Duration in milliseconds, at the tool's decisecond precision.
    pub duration: Option<u64>,
    pub sampling_rate: Option<u32>,
    pub channels: Option<u32>,
    /// The digits the tool printed next to `kb/s`, kept as printed.
    pub bit_rate: Option<u32>,
}

impl MediaProbe {
    /// Widens the probe into the public attribute type.
    #[must_use]
    pub fn into_attributes(self) -> Attributes {
        Attributes {
            format: self.format,
            codec: None,
            sampling_rate: self.sampling_rate,
            channels: self.channels,
            bit_rate: self.bit_rate,
            volume: None,
            duration: self.duration,
            seek_time: None,
        }
    }
}

/// Scrapes media attributes out of the diagnostic text for `source`.
///
/// Recognizes three markers: the input line, the duration line, and the
/// first stream description. When none of them appears the text is not
/// decoder output for a readable media file and an `UnrecognizedFormat`
/// error is returned. `source` is used for error reporting only.
pub fn parse_probe_output(source: &Path, output: &str) -> Result<MediaProbe> {
    let mut probe = MediaProbe::default();
    let mut matched = false;

    if let Some(caps) = INPUT_PATTERN.captures(output) {
        matched = true;
        probe.format = Some(caps[1].to_string());
    }

    if let Some(caps) = DURATION_PATTERN.captures(output) {
        matched = true;
        let hours: u64 = caps[1].parse().unwrap_or(0);
        let minutes: u64 = caps[2].parse().unwrap_or(0);
        let seconds: u64 = caps[3].parse().unwrap_or(0);
        let tenths: u64 = caps[4].parse().unwrap_or(0);
        probe.duration =
            Some(tenths * 100 + seconds * 1000 + minutes * 60_000 + hours * 3_600_000);
    }

    if let Some(caps) = STREAM_PATTERN.captures(output) {
        matched = true;
        if caps[1].eq_ignore_ascii_case("audio") {
            parse_audio_description(&caps[2], &mut probe);
        }
    }

    if !matched {
        log::warn!(
            "No media attributes recognized in decoder output for {}",
            source.display()
        );
        return Err(FfwaveError::UnrecognizedFormat(
            source.display().to_string(),
        ));
    }
    Ok(probe)
}

/// Walks the comma-separated audio stream description, e.g.
/// `mp3, 44100 Hz, stereo, fltp, 128 kb/s`. The first token names the
/// decoder; each later token is tried against the sampling rate, channel,
/// and bit rate patterns in that order, first match wins.
fn parse_audio_description(description: &str, probe: &mut MediaProbe) {
    for (index, token) in description.split(',').enumerate() {
        let token = token.trim();
        if index == 0 {
            probe.format = Some(token.to_string());
            continue;
        }
        if let Some(caps) = SAMPLING_RATE_PATTERN.captures(token) {
            if let Some(rate) = parse_positive(&caps[1]) {
                probe.sampling_rate = Some(rate);
            }
            continue;
        }
        if let Some(caps) = CHANNELS_PATTERN.captures(token) {
            let descriptor = &caps[1];
            if descriptor.eq_ignore_ascii_case("mono") {
                probe.channels = Some(1);
            } else if descriptor.eq_ignore_ascii_case("stereo") {
                probe.channels = Some(2);
            } else if let Some(count) = caps.get(2).and_then(|m| parse_positive(m.as_str())) {
                probe.channels = Some(count);
            }
            continue;
        }
        if let Some(caps) = BIT_RATE_PATTERN.captures(token) {
            if let Some(rate) = parse_positive(&caps[1]) {
                probe.bit_rate = Some(rate);
            }
        }
    }
}

fn parse_positive(digits: &str) -> Option<u32> {
    digits.parse().ok().filter(|value| *value > 0)
}
