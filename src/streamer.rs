//! Live PCM streaming straight out of a running decoder process.
//!
//! The decoder writes a WAV stream to its standard output; the header is
//! consumed here so what reaches the caller starts at the first sample
//! frame. Reads pass through to the pipe without an intermediate buffer,
//! and backpressure is whatever the operating system's pipe buffer allows.

use std::fs::OpenOptions;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::error::{FfwaveError, Result};
use crate::external::ffmpeg_builder::FfmpegCommandBuilder;
use crate::external::locator::FfmpegLocator;

/// The only container format with a known, fixed header size here.
const STREAMABLE_FORMAT: &str = "wav";

/// Size of the WAV header the decoder writes before the samples.
const WAV_HEADER_BYTES: usize = 46;

/// Default wait for the header before the decoder is given up on.
pub const DEFAULT_HEADER_WAIT: Duration = Duration::from_secs(20);

/// Poll interval while waiting for the header.
const HEADER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default file receiving the decoder's diagnostic output. Opened in
/// append mode, so one file collects the chatter of consecutive streams.
const DEFAULT_STDERR_LOG: &str = "decoder_log.txt";

/// PCM layout of a stream's payload, derived from the requested attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    /// Sample frames per second.
    pub sample_rate: u32,
    pub channels: u32,
    /// Always 16 in this pipeline; samples are signed.
    pub bits_per_sample: u16,
    /// Bytes per sample frame across all channels.
    pub frame_size: u32,
    pub big_endian: bool,
}

impl PcmFormat {
    /// Derives the payload layout for streaming the given attributes.
    ///
    /// The sampling rate and channel count must both be set; there is no
    /// tool default to fall back on when describing the payload.
    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        let sample_rate = attributes
            .sampling_rate
            .ok_or(FfwaveError::MissingAttribute("sampling_rate"))?;
        let channels = attributes
            .channels
            .ok_or(FfwaveError::MissingAttribute("channels"))?;
        Ok(Self {
            sample_rate,
            channels,
            bits_per_sample: 16,
            frame_size: 2 * channels,
            big_endian: cfg!(target_endian = "big"),
        })
    }
}

/// How a decoder process ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Exit code, when the process exited normally. Killed or signaled
    /// processes report none.
    pub exit_code: Option<i32>,
}

/// Streams transcoded WAV audio out of a live decoder process.
///
/// The executable is resolved through the locator once, at construction.
pub struct Streamer {
    ffmpeg: PathBuf,
    stderr_log: PathBuf,
    header_wait: Duration,
}

impl Streamer {
    pub fn new(locator: &dyn FfmpegLocator) -> Result<Self> {
        Ok(Self {
            ffmpeg: locator.resolve_executable_path()?,
            stderr_log: PathBuf::from(DEFAULT_STDERR_LOG),
            header_wait: DEFAULT_HEADER_WAIT,
        })
    }

    /// Redirects the decoder's diagnostic output to `path` instead of the
    /// default `decoder_log.txt`.
    #[must_use]
    pub fn with_stderr_log(mut self, path: &Path) -> Self {
        self.stderr_log = path.to_path_buf();
        self
    }

    /// Replaces the default twenty second header wait.
    #[must_use]
    pub fn with_header_wait(mut self, wait: Duration) -> Self {
        self.header_wait = wait;
        self
    }

    /// Starts decoding `source` toward the requested attributes and returns
    /// the live sample stream together with its payload layout.
    ///
    /// Only the wav format is streamable. The call returns once the decoder
    /// has produced its WAV header, which is consumed here; on any failure
    /// before that point the decoder is killed and reaped.
    pub fn stream(&self, source: &Path, attributes: &Attributes) -> Result<(PcmStream, PcmFormat)> {
        match attributes.format.as_deref() {
            None => return Err(FfwaveError::MissingAttribute("format")),
            Some(format) if !format.eq_ignore_ascii_case(STREAMABLE_FORMAT) => {
                return Err(FfwaveError::UnsupportedStreamFormat(format.to_string()));
            }
            Some(_) => {}
        }
        let pcm_format = PcmFormat::from_attributes(attributes)?;

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.stderr_log)?;

        let invocation = FfmpegCommandBuilder::new(&self.ffmpeg)
            .input(source, attributes.seek_time)
            .encoding(attributes)
            .output_pipe();
        log::debug!("Starting piped decoding process: {}", invocation.display_line());

        let mut child = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::from(log_file))
            .spawn()
            .map_err(|e| FfwaveError::ProcessSpawnFailed(self.ffmpeg.display().to_string(), e))?;

        let stdout = match child.stdout.take() {
            Some(pipe) => pipe,
            None => {
                kill_and_reap(&mut child);
                return Err(FfwaveError::Io(io::Error::other(
                    "decoder stdout pipe was not captured",
                )));
            }
        };

        // The pipe cannot be read with a deadline directly, so a helper
        // thread collects the header and hands the pipe back when done.
        let (header_tx, header_rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = header_tx.send(skip_header(stdout));
        });

        let wait_started = Instant::now();
        let header_result = loop {
            match header_rx.try_recv() {
                Ok(result) => break result,
                Err(mpsc::TryRecvError::Empty) => {
                    if wait_started.elapsed() >= self.header_wait {
                        log::warn!(
                            "No stream header after {} seconds, killing the decoder",
                            self.header_wait.as_secs()
                        );
                        kill_and_reap(&mut child);
                        return Err(FfwaveError::PipeHeaderTimeout(self.header_wait.as_secs()));
                    }
                    thread::sleep(HEADER_POLL_INTERVAL);
                }
                Err(mpsc::TryRecvError::Disconnected) => {
                    kill_and_reap(&mut child);
                    return Err(FfwaveError::Io(io::Error::other(
                        "header reader thread ended without a result",
                    )));
                }
            }
        };

        let stdout = match header_result {
            (Ok(filled), stdout) if filled == WAV_HEADER_BYTES => stdout,
            (Ok(filled), _) => {
                kill_and_reap(&mut child);
                return Err(FfwaveError::PipeHeaderIncomplete(filled, WAV_HEADER_BYTES));
            }
            (Err(e), _) => {
                kill_and_reap(&mut child);
                return Err(FfwaveError::Io(e));
            }
        };

        // From here the child is owned by its exit watcher; the stream owns
        // the pipe and joins the watcher when it closes.
        let watcher = thread::spawn(move || {
            let mut child = child;
            match child.wait() {
                Ok(status) => {
                    log::debug!("Piped decoding process finished: {:?}", status.code());
                    StreamOutcome {
                        exit_code: status.code(),
                    }
                }
                Err(e) => {
                    log::error!("Failed waiting for the piped decoding process: {}", e);
                    StreamOutcome::default()
                }
            }
        });

        log::info!(
            "Streaming {} as wav, {} Hz, {} channel(s)",
            source.display(),
            pcm_format.sample_rate,
            pcm_format.channels
        );
        Ok((
            PcmStream {
                stdout: Some(stdout),
                watcher: Some(watcher),
            },
            pcm_format,
        ))
    }
}

/// Live PCM payload of a running decoder.
///
/// Reads pass straight through to the decoder's standard output. Closing
/// the stream, by [`PcmStream::finish`] or by dropping it, closes the pipe,
/// which is the decoder's signal to stop, and waits until the process has
/// been reaped.
pub struct PcmStream {
    stdout: Option<ChildStdout>,
    watcher: Option<JoinHandle<StreamOutcome>>,
}

impl PcmStream {
    /// Closes the stream and reports how the decoder ended.
    pub fn finish(mut self) -> StreamOutcome {
        self.shutdown()
    }

    fn shutdown(&mut self) -> StreamOutcome {
        drop(self.stdout.take());
        match self.watcher.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => StreamOutcome::default(),
        }
    }
}

impl Read for PcmStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stdout.as_mut() {
            Some(pipe) => pipe.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for PcmStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Collects the fixed-size WAV header, returning how many bytes arrived
/// before the pipe ended and the pipe itself for further reading.
fn skip_header(mut stdout: ChildStdout) -> (io::Result<usize>, ChildStdout) {
    let mut header = [0u8; WAV_HEADER_BYTES];
    let mut filled = 0;
    while filled < WAV_HEADER_BYTES {
        match stdout.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (Err(e), stdout),
        }
    }
    (Ok(filled), stdout)
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_format_needs_rate_and_channels() {
        let attributes = Attributes::new().with_format("wav").with_channels(2);
        assert!(matches!(
            PcmFormat::from_attributes(&attributes),
            Err(FfwaveError::MissingAttribute("sampling_rate"))
        ));

        let attributes = Attributes::new().with_format("wav").with_sampling_rate(44100);
        assert!(matches!(
            PcmFormat::from_attributes(&attributes),
            Err(FfwaveError::MissingAttribute("channels"))
        ));
    }

    #[test]
    fn test_frame_size_spans_all_channels() {
        let attributes = Attributes::new()
            .with_format("wav")
            .with_sampling_rate(22050)
            .with_channels(2);
        let format = PcmFormat::from_attributes(&attributes).expect("complete attributes");
        assert_eq!(format.sample_rate, 22050);
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!(format.frame_size, 4);
        assert_eq!(format.big_endian, cfg!(target_endian = "big"));
    }
}
