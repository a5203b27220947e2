//! Runs assembled invocations under a watchdog and captures their output.

use std::io::Read;
use std::process::Stdio;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{FfwaveError, Result};
use crate::external::ffmpeg_builder::CommandInvocation;

/// Deadline applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Poll interval while waiting for the child to finish.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of one accepted invocation.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Exit code the tool reported.
    pub exit_code: i32,
    /// Captured stdout and stderr text, merged into one buffer.
    pub output: String,
    /// Wall-clock run time.
    pub elapsed: Duration,
}

/// Executes invocations and captures their diagnostic output.
///
/// Orchestration code talks to the tool through this trait so it can be
/// tested against a canned runner instead of a real decoder.
pub trait ProcessRunner {
    fn run(&self, invocation: &CommandInvocation) -> Result<ProcessResult>;
}

/// Default runner: spawns the process, kills it past the deadline, and
/// rejects exit codes outside the allowed set.
///
/// ffmpeg reports exit code 1 for several non-fatal situations, probe-only
/// invocations among them, so 1 is accepted next to 0 by default.
#[derive(Debug, Clone)]
pub struct FfmpegExecutor {
    timeout: Duration,
    allowed_exit_codes: Vec<i32>,
}

impl Default for FfmpegExecutor {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            allowed_exit_codes: vec![0, 1],
        }
    }
}

impl FfmpegExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default five minute deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the default `{0, 1}` exit-code allow-set.
    #[must_use]
    pub fn with_allowed_exit_codes(mut self, codes: &[i32]) -> Self {
        self.allowed_exit_codes = codes.to_vec();
        self
    }
}

impl ProcessRunner for FfmpegExecutor {
    fn run(&self, invocation: &CommandInvocation) -> Result<ProcessResult> {
        debug!("Executing: {}", invocation.display_line());
        let start = Instant::now();

        let mut child = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                FfwaveError::ProcessSpawnFailed(invocation.program.display().to_string(), e)
            })?;

        // Each pipe gets its own reader thread so neither can fill up and
        // stall the child while the parent is waiting.
        let stdout_pipe = child.stdout.take();
        let stdout_handle = std::thread::spawn(move || drain_to_string(stdout_pipe));
        let stderr_pipe = child.stderr.take();
        let stderr_handle = std::thread::spawn(move || drain_to_string(stderr_pipe));

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() >= self.timeout {
                        warn!(
                            "Killing {} after {} seconds",
                            invocation.program.display(),
                            self.timeout.as_secs()
                        );
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(FfwaveError::ProcessTimedOut(self.timeout.as_secs()));
                    }
                    std::thread::sleep(WAIT_POLL_INTERVAL);
                }
                Err(e) => return Err(FfwaveError::Io(e)),
            }
        };

        let mut output = stdout_handle.join().unwrap_or_default();
        let stderr_text = stderr_handle.join().unwrap_or_default();
        if !output.is_empty() && !stderr_text.is_empty() {
            output.push('\n');
        }
        output.push_str(&stderr_text);

        let elapsed = start.elapsed();
        let exit_code = status.code().unwrap_or(-1);
        if !self.allowed_exit_codes.contains(&exit_code) {
            return Err(FfwaveError::ProcessExitRejected(exit_code, output));
        }

        debug!(
            "Process finished with code {} after {:.1} seconds",
            exit_code,
            elapsed.as_secs_f64()
        );
        Ok(ProcessResult {
            exit_code,
            output,
            elapsed,
        })
    }
}

fn drain_to_string<R: Read>(pipe: Option<R>) -> String {
    let mut bytes = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut bytes);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::ffmpeg_builder::Arg;
    use std::path::PathBuf;

    fn invocation(program: &str, args: &[&str]) -> CommandInvocation {
        CommandInvocation {
            program: PathBuf::from(program),
            args: args.iter().map(|a| Arg::Literal((*a).to_string())).collect(),
        }
    }

    #[test]
    fn test_run_echo() {
        let result = FfmpegExecutor::new()
            .run(&invocation("echo", &["hello"]))
            .expect("echo should run");
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("hello"));
    }

    #[test]
    fn test_stderr_is_merged_into_output() {
        let result = FfmpegExecutor::new()
            .run(&invocation("sh", &["-c", "echo out; echo diag >&2"]))
            .expect("sh should run");
        assert!(result.output.contains("out"));
        assert!(result.output.contains("diag"));
    }

    #[test]
    fn test_missing_program_spawn_failure() {
        let result = FfmpegExecutor::new().run(&invocation("/no/such/binary", &[]));
        assert!(matches!(result, Err(FfwaveError::ProcessSpawnFailed(_, _))));
    }

    #[test]
    fn test_rejected_exit_code() {
        let result = FfmpegExecutor::new().run(&invocation("sh", &["-c", "exit 3"]));
        assert!(matches!(
            result,
            Err(FfwaveError::ProcessExitRejected(3, _))
        ));
    }

    #[test]
    fn test_exit_code_one_is_accepted_by_default() {
        let result = FfmpegExecutor::new()
            .run(&invocation("sh", &["-c", "echo probing >&2; exit 1"]))
            .expect("exit code 1 is in the default allow-set");
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("probing"));
    }

    #[test]
    fn test_custom_allow_set() {
        let executor = FfmpegExecutor::new().with_allowed_exit_codes(&[0]);
        let result = executor.run(&invocation("sh", &["-c", "exit 1"]));
        assert!(matches!(
            result,
            Err(FfwaveError::ProcessExitRejected(1, _))
        ));
    }

    #[test]
    fn test_timeout_kills_the_process() {
        let executor = FfmpegExecutor::new().with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        let result = executor.run(&invocation("sleep", &["30"]));
        assert!(matches!(result, Err(FfwaveError::ProcessTimedOut(0))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
