//! Ready-made encoding profiles for common audio targets.
//!
//! Each preset bundles a container format, a codec, a sampling rate, and a
//! channel count; the lossy mp3 profiles also fix a bit rate. Expanding a
//! preset with [`Preset::attributes`] yields the attribute set to hand to a
//! transcode or stream operation.

use std::fmt;

use crate::attributes::Attributes;

/// A named encoding profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    name: &'static str,
    format: &'static str,
    codec: &'static str,
    sampling_rate: u32,
    channels: u32,
    bit_rate: Option<u32>,
}

const fn preset(
    name: &'static str,
    format: &'static str,
    codec: &'static str,
    sampling_rate: u32,
    channels: u32,
    bit_rate: Option<u32>,
) -> Preset {
    Preset {
        name,
        format,
        codec,
        sampling_rate,
        channels,
        bit_rate,
    }
}

impl Preset {
    pub const OGG_MONO_44KHZ: Preset = preset("OGG_MONO_44KHZ", "ogg", "libvorbis", 44100, 1, None);
    pub const OGG_STEREO_44KHZ: Preset =
        preset("OGG_STEREO_44KHZ", "ogg", "libvorbis", 44100, 2, None);
    pub const FLAC_MONO_44KHZ: Preset = preset("FLAC_MONO_44KHZ", "flac", "flac", 44100, 1, None);
    pub const FLAC_STEREO_44KHZ: Preset =
        preset("FLAC_STEREO_44KHZ", "flac", "flac", 44100, 2, None);
    pub const MP3_320KBS_MONO_44KHZ: Preset = preset(
        "MP3_320KBS_MONO_44KHZ",
        "mp3",
        "libmp3lame",
        44100,
        1,
        Some(320_000),
    );
    pub const MP3_320KBS_STEREO_44KHZ: Preset = preset(
        "MP3_320KBS_STEREO_44KHZ",
        "mp3",
        "libmp3lame",
        44100,
        2,
        Some(320_000),
    );
    pub const MP3_192KBS_MONO_44KHZ: Preset = preset(
        "MP3_192KBS_MONO_44KHZ",
        "mp3",
        "libmp3lame",
        44100,
        1,
        Some(192_000),
    );
    pub const MP3_192KBS_STEREO_44KHZ: Preset = preset(
        "MP3_192KBS_STEREO_44KHZ",
        "mp3",
        "libmp3lame",
        44100,
        2,
        Some(192_000),
    );
    pub const MP3_128KBS_MONO_44KHZ: Preset = preset(
        "MP3_128KBS_MONO_44KHZ",
        "mp3",
        "libmp3lame",
        44100,
        1,
        Some(128_000),
    );
    pub const MP3_128KBS_STEREO_44KHZ: Preset = preset(
        "MP3_128KBS_STEREO_44KHZ",
        "mp3",
        "libmp3lame",
        44100,
        2,
        Some(128_000),
    );
    pub const WAV_PCM_S16LE_MONO_22KHZ: Preset = preset(
        "WAV_PCM_S16LE_MONO_22KHZ",
        "wav",
        "pcm_s16le",
        22050,
        1,
        None,
    );
    pub const WAV_PCM_S16LE_STEREO_22KHZ: Preset = preset(
        "WAV_PCM_S16LE_STEREO_22KHZ",
        "wav",
        "pcm_s16le",
        22050,
        2,
        None,
    );
    pub const WAV_PCM_S16LE_MONO_44KHZ: Preset = preset(
        "WAV_PCM_S16LE_MONO_44KHZ",
        "wav",
        "pcm_s16le",
        44100,
        1,
        None,
    );
    pub const WAV_PCM_S16LE_STEREO_44KHZ: Preset = preset(
        "WAV_PCM_S16LE_STEREO_44KHZ",
        "wav",
        "pcm_s16le",
        44100,
        2,
        None,
    );

    /// Every built-in preset.
    pub const ALL: [Preset; 14] = [
        Preset::OGG_MONO_44KHZ,
        Preset::OGG_STEREO_44KHZ,
        Preset::FLAC_MONO_44KHZ,
        Preset::FLAC_STEREO_44KHZ,
        Preset::MP3_320KBS_MONO_44KHZ,
        Preset::MP3_320KBS_STEREO_44KHZ,
        Preset::MP3_192KBS_MONO_44KHZ,
        Preset::MP3_192KBS_STEREO_44KHZ,
        Preset::MP3_128KBS_MONO_44KHZ,
        Preset::MP3_128KBS_STEREO_44KHZ,
        Preset::WAV_PCM_S16LE_MONO_22KHZ,
        Preset::WAV_PCM_S16LE_STEREO_22KHZ,
        Preset::WAV_PCM_S16LE_MONO_44KHZ,
        Preset::WAV_PCM_S16LE_STEREO_44KHZ,
    ];

    /// Machine-friendly identifier for this preset.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Looks up a preset by its identifier, e.g. "MP3_128KBS_STEREO_44KHZ".
    #[must_use]
    pub fn from_name(name: &str) -> Option<Preset> {
        Preset::ALL.into_iter().find(|p| p.name == name)
    }

    /// Expands the preset into a full attribute set.
    #[must_use]
    pub fn attributes(self) -> Attributes {
        let attributes = Attributes::new()
            .with_format(self.format)
            .with_codec(self.codec)
            .with_sampling_rate(self.sampling_rate)
            .with_channels(self.channels);
        match self.bit_rate {
            Some(bit_rate) => attributes.with_bit_rate(bit_rate),
            None => attributes,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl From<Preset> for Attributes {
    fn from(preset: Preset) -> Self {
        preset.attributes()
    }
}
