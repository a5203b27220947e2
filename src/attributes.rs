//! The attribute set describing a transcode target or a probed file.

use serde::{Deserialize, Serialize};

/// Desired properties of a transcode, or the properties reported for an
/// existing file by a probe.
///
/// Every field is optional. An unset field is an instruction to let the
/// external tool pick its own default, and it is omitted from the built
/// command line entirely. A probe leaves fields it could not recover unset.
/// Numeric values that are present are positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Container or format family name, e.g. "wav", "mp3", "ogg".
    pub format: Option<String>,
    pub codec: Option<String>,
    /// Sampling rate in Hz.
    pub sampling_rate: Option<u32>,
    pub channels: Option<u32>,
    /// For a transcode, the bit rate in bits per second. Probed values
    /// instead carry the digits the tool printed, which are in kb/s.
    pub bit_rate: Option<u32>,
    /// Volume in the tool's 256-based scale; 256 leaves the level unchanged.
    pub volume: Option<u32>,
    /// Known duration in milliseconds. Unset when the duration is unknown.
    pub duration: Option<u64>,
    /// Offset in milliseconds to seek to before decoding starts.
    pub seek_time: Option<u64>,
}

impl Attributes {
    /// Creates an empty attribute set: every decision is left to the tool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: &str) -> Self {
        self.codec = Some(codec.to_string());
        self
    }

    #[must_use]
    pub fn with_sampling_rate(mut self, sampling_rate: u32) -> Self {
        self.sampling_rate = Some(sampling_rate);
        self
    }

    #[must_use]
    pub fn with_channels(mut self, channels: u32) -> Self {
        self.channels = Some(channels);
        self
    }

    #[must_use]
    pub fn with_bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    #[must_use]
    pub fn with_volume(mut self, volume: u32) -> Self {
        self.volume = Some(volume);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration = Some(duration_ms);
        self
    }

    #[must_use]
    pub fn with_seek_time(mut self, seek_time_ms: u64) -> Self {
        self.seek_time = Some(seek_time_ms);
        self
    }
}
