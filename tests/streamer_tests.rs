// tests/streamer_tests.rs
//
// Exercises the streamer against small shell scripts standing in for the
// decoder. A script that prints 46 bytes plays the role of ffmpeg writing
// its WAV header to the pipe.

#![cfg(unix)]

use std::fs;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ffwave::{Attributes, FfmpegLocator, FfwaveError, Streamer};
use tempfile::tempdir;

struct FixedLocator(PathBuf);

impl FfmpegLocator for FixedLocator {
    fn resolve_executable_path(&self) -> ffwave::Result<PathBuf> {
        Ok(self.0.clone())
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

fn wav_attributes() -> Attributes {
    Attributes::new()
        .with_format("wav")
        .with_codec("pcm_s16le")
        .with_sampling_rate(44100)
        .with_channels(2)
}

#[test]
fn test_stream_delivers_payload_after_the_header() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let decoder = write_script(
        dir.path(),
        "decoder.sh",
        "head -c 46 /dev/zero\n\
         printf '0123456789abcdef'\n\
         echo 'decoder run' >&2",
    )?;
    let log = dir.path().join("decoder_log.txt");

    let streamer = Streamer::new(&FixedLocator(decoder))?.with_stderr_log(&log);
    let (mut stream, format) = streamer.stream(Path::new("song.mp3"), &wav_attributes())?;

    assert_eq!(format.sample_rate, 44100);
    assert_eq!(format.channels, 2);
    assert_eq!(format.bits_per_sample, 16);
    assert_eq!(format.frame_size, 4);

    let mut payload = Vec::new();
    stream.read_to_end(&mut payload)?;
    assert_eq!(payload, b"0123456789abcdef", "header bytes must not leak");

    let outcome = stream.finish();
    assert_eq!(outcome.exit_code, Some(0));

    let logged = fs::read_to_string(&log)?;
    assert!(logged.contains("decoder run"), "log was: {logged}");
    Ok(())
}

#[test]
fn test_stream_passes_decoder_flags() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let args_file = dir.path().join("seen_args.txt");
    let decoder = write_script(
        dir.path(),
        "decoder.sh",
        &format!(
            "printf '%s\\n' \"$@\" > {}\nhead -c 46 /dev/zero",
            args_file.display()
        ),
    )?;
    let log = dir.path().join("decoder_log.txt");

    let streamer = Streamer::new(&FixedLocator(decoder))?.with_stderr_log(&log);
    let attributes = wav_attributes().with_seek_time(1_000);
    let (stream, _) = streamer.stream(Path::new("song.mp3"), &attributes)?;
    stream.finish();

    let seen: Vec<String> = fs::read_to_string(&args_file)?
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(
        seen,
        vec![
            "-ss",
            "00:00:01.000",
            "-i",
            "song.mp3",
            "-vn",
            "-acodec",
            "pcm_s16le",
            "-ac",
            "2",
            "-ar",
            "44100",
            "-f",
            "wav",
            "pipe:1",
        ]
    );
    Ok(())
}

#[test]
fn test_stream_appends_to_the_decoder_log() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let decoder = write_script(
        dir.path(),
        "decoder.sh",
        "echo 'decoder run' >&2\nhead -c 46 /dev/zero",
    )?;
    let log = dir.path().join("decoder_log.txt");

    let streamer = Streamer::new(&FixedLocator(decoder))?.with_stderr_log(&log);
    for _ in 0..2 {
        let (stream, _) = streamer.stream(Path::new("song.mp3"), &wav_attributes())?;
        stream.finish();
    }

    let logged = fs::read_to_string(&log)?;
    assert_eq!(logged.matches("decoder run").count(), 2, "log was: {logged}");
    Ok(())
}

#[test]
fn test_stream_rejects_non_wav_formats() -> Result<(), Box<dyn std::error::Error>> {
    let streamer = Streamer::new(&FixedLocator(PathBuf::from("/bin/true")))?;
    let attributes = Attributes::new()
        .with_format("mp3")
        .with_sampling_rate(44100)
        .with_channels(2);

    let result = streamer.stream(Path::new("song.flac"), &attributes);
    assert!(result.is_err());
    match result.err().unwrap() {
        FfwaveError::UnsupportedStreamFormat(format) => assert_eq!(format, "mp3"),
        e => panic!("Unexpected error type: {:?}", e),
    }
    Ok(())
}

#[test]
fn test_stream_requires_a_format() -> Result<(), Box<dyn std::error::Error>> {
    let streamer = Streamer::new(&FixedLocator(PathBuf::from("/bin/true")))?;
    let attributes = Attributes::new().with_sampling_rate(44100).with_channels(2);

    let result = streamer.stream(Path::new("song.flac"), &attributes);
    assert!(result.is_err());
    match result.err().unwrap() {
        FfwaveError::MissingAttribute("format") => {}
        e => panic!("Unexpected error type: {:?}", e),
    }
    Ok(())
}

#[test]
fn test_stream_requires_sampling_parameters() -> Result<(), Box<dyn std::error::Error>> {
    let streamer = Streamer::new(&FixedLocator(PathBuf::from("/bin/true")))?;

    let no_channels = Attributes::new().with_format("wav").with_sampling_rate(44100);
    match streamer.stream(Path::new("song.flac"), &no_channels).err().unwrap() {
        FfwaveError::MissingAttribute("channels") => {}
        e => panic!("Unexpected error type: {:?}", e),
    }

    let no_rate = Attributes::new().with_format("wav").with_channels(2);
    match streamer.stream(Path::new("song.flac"), &no_rate).err().unwrap() {
        FfwaveError::MissingAttribute("sampling_rate") => {}
        e => panic!("Unexpected error type: {:?}", e),
    }
    Ok(())
}

#[test]
fn test_stream_times_out_without_a_header() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let decoder = write_script(dir.path(), "decoder.sh", "sleep 30")?;
    let log = dir.path().join("decoder_log.txt");

    let streamer = Streamer::new(&FixedLocator(decoder))?
        .with_stderr_log(&log)
        .with_header_wait(Duration::from_millis(300));

    let started = Instant::now();
    match streamer.stream(Path::new("song.mp3"), &wav_attributes()).err().unwrap() {
        FfwaveError::PipeHeaderTimeout(_) => {}
        e => panic!("Unexpected error type: {:?}", e),
    }
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "the decoder was not killed promptly"
    );
    Ok(())
}

#[test]
fn test_stream_rejects_a_short_header() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let decoder = write_script(dir.path(), "decoder.sh", "head -c 20 /dev/zero")?;
    let log = dir.path().join("decoder_log.txt");

    let streamer = Streamer::new(&FixedLocator(decoder))?.with_stderr_log(&log);
    match streamer.stream(Path::new("song.mp3"), &wav_attributes()).err().unwrap() {
        FfwaveError::PipeHeaderIncomplete(got, wanted) => {
            assert_eq!(got, 20);
            assert_eq!(wanted, 46);
        }
        e => panic!("Unexpected error type: {:?}", e),
    }
    Ok(())
}

#[test]
fn test_dropping_the_stream_stops_the_decoder() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    // An endless payload writer; only the closed pipe can stop it.
    let decoder = write_script(
        dir.path(),
        "decoder.sh",
        "head -c 46 /dev/zero\ncat /dev/zero",
    )?;
    let log = dir.path().join("decoder_log.txt");

    let streamer = Streamer::new(&FixedLocator(decoder))?.with_stderr_log(&log);
    let (mut stream, _) = streamer.stream(Path::new("song.mp3"), &wav_attributes())?;

    let mut chunk = [0u8; 8];
    stream.read_exact(&mut chunk)?;

    let started = Instant::now();
    drop(stream);
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "dropping the stream must end the decoder"
    );
    Ok(())
}
