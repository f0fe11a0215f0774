//! Running the ZAdviser CLI as a child process
//!
//! The invoker blocks until the script exits. Output is streamed line by
//! line to the job log while it is also captured for the caller. A raised
//! [`CancellationToken`] kills the child and ends the call with
//! [`StepError::Interrupted`].

use crate::command::ArgumentVector;
use crate::step::StepError;
use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// How often a running child is checked for cancellation
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared flag raised to abort a running step
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag for every clone of this token
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`cancel`](Self::cancel) was called on any clone
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One call of the CLI script
#[derive(Clone)]
pub struct InvocationRequest {
    /// Script to run
    pub program: String,

    /// Arguments after the script, secrets included
    pub args: Vec<String>,

    /// Extra environment for the child
    pub env: HashMap<String, String>,

    /// Working directory
    pub cwd: PathBuf,

    /// Command line with secrets masked, for logs
    pub display: String,

    /// Raised to abort the call
    pub cancel: CancellationToken,

    /// Echo child output to this process's stdout and stderr
    pub echo: bool,
}

impl InvocationRequest {
    /// Creates a request from a built argument vector
    #[must_use]
    pub fn from_arguments(arguments: &ArgumentVector, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: arguments.program().to_string(),
            args: arguments.to_command_args(),
            env: HashMap::new(),
            cwd: cwd.into(),
            display: arguments.masked_command_line(),
            cancel: CancellationToken::new(),
            echo: true,
        }
    }

    /// Sets the child environment
    #[must_use]
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Sets the cancellation token
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Turns echoing of child output on or off
    #[must_use]
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// File name of the script, as used in error messages
    #[must_use]
    pub fn script_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map_or_else(|| self.program.clone(), |name| name.to_string_lossy().into_owned())
    }
}

impl fmt::Debug for InvocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationRequest")
            .field("command", &self.display)
            .field("cwd", &self.cwd)
            .field("env", &self.env.len())
            .field("echo", &self.echo)
            .finish_non_exhaustive()
    }
}

/// Result of a completed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOutcome {
    /// Exit code, -1 when the child was ended by a signal
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Wall time of the call
    pub duration: Duration,
}

impl InvocationOutcome {
    /// Returns true if the script exited with 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs the CLI script
pub trait ProcessInvoker: Send + Sync {
    /// Runs the request to completion
    ///
    /// A nonzero exit code is an `Ok` outcome; deciding what it means is up
    /// to the caller.
    ///
    /// # Errors
    ///
    /// Returns `StepError::Io` if the script cannot be started and
    /// `StepError::Interrupted` if the request was cancelled.
    fn invoke(&self, request: &InvocationRequest) -> Result<InvocationOutcome, StepError>;
}

/// Invoker spawning the script on the local machine
#[derive(Debug, Clone)]
pub struct LocalProcessInvoker {
    poll_interval: Duration,
}

impl Default for LocalProcessInvoker {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl LocalProcessInvoker {
    /// Creates an invoker with the default poll interval
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how often the child is checked for cancellation
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn spawn_reader<R>(source: R, stream: Stream, echo: bool) -> JoinHandle<String>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut captured = String::new();
        for line in BufReader::new(source).lines().map_while(Result::ok) {
            match stream {
                Stream::Stdout => {
                    tracing::debug!(target: "zadviser::cli", "{line}");
                    if echo {
                        println!("{line}");
                    }
                }
                Stream::Stderr => {
                    tracing::debug!(target: "zadviser::cli", stderr = true, "{line}");
                    if echo {
                        eprintln!("{line}");
                    }
                }
            }
            captured.push_str(&line);
            captured.push('\n');
        }
        captured
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

impl ProcessInvoker for LocalProcessInvoker {
    fn invoke(&self, request: &InvocationRequest) -> Result<InvocationOutcome, StepError> {
        let script = request.script_name();
        tracing::info!(
            script = %script,
            cwd = %request.cwd.display(),
            "Starting ZAdviser CLI"
        );
        tracing::debug!(command = %request.display, "ZAdviser CLI command line");

        let start = Instant::now();
        let mut child = Command::new(&request.program)
            .args(&request.args)
            .envs(&request.env)
            .current_dir(&request.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StepError::Io(format!("cannot start {}: {e}", request.program)))?;

        let stdout = child
            .stdout
            .take()
            .map(|out| spawn_reader(out, Stream::Stdout, request.echo));
        let stderr = child
            .stderr
            .take()
            .map(|err| spawn_reader(err, Stream::Stderr, request.echo));

        let status = loop {
            if request.cancel.is_cancelled() {
                tracing::warn!(script = %script, "Cancellation requested, stopping ZAdviser CLI");
                if let Err(e) = child.kill() {
                    tracing::warn!(error = %e, "Failed to kill ZAdviser CLI");
                }
                let _ = child.wait();
                // Readers may still be blocked on pipes held by grandchildren.
                drop(stdout);
                drop(stderr);
                return Err(StepError::Interrupted { script });
            }

            if let Some(status) = child.wait_timeout(self.poll_interval)? {
                break status;
            }
        };

        let outcome = InvocationOutcome {
            exit_code: status.code().unwrap_or(-1),
            stdout: collect(stdout),
            stderr: collect(stderr),
            duration: start.elapsed(),
        };

        tracing::info!(
            script = %script,
            exit_code = outcome.exit_code,
            duration_ms = u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
            "ZAdviser CLI finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ArgValue, flags};
    use crate::infrastructure::Sensitive;

    #[cfg(unix)]
    fn sh(script: &str) -> InvocationRequest {
        InvocationRequest {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            env: HashMap::new(),
            cwd: std::env::temp_dir(),
            display: format!("sh -c {script}"),
            cancel: CancellationToken::new(),
            echo: false,
        }
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_request_from_arguments_masks_display() {
        let mut args = ArgumentVector::new("/opt/cli/ZAdviserCLI.sh");
        args.push(flags::ACCESS_KEY, ArgValue::secret(&Sensitive::new("AKIA")));

        let request = InvocationRequest::from_arguments(&args, "/ws");
        assert_eq!(request.args, vec!["-accessKey", "AKIA"]);
        assert!(!request.display.contains("AKIA"));
        assert!(!format!("{request:?}").contains("AKIA"));
        assert_eq!(request.script_name(), "ZAdviserCLI.sh");
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_output_and_exit_code() {
        let outcome = LocalProcessInvoker::new()
            .invoke(&sh("echo hello; echo oops 1>&2; exit 3"))
            .unwrap();

        assert_eq!(outcome.exit_code, 3);
        assert!(!outcome.is_success());
        assert_eq!(outcome.stdout, "hello\n");
        assert_eq!(outcome.stderr, "oops\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_passes_environment() {
        let mut request = sh("printf '%s' \"$ZADVISER_TEST_VALUE\"");
        request.env.insert("ZADVISER_TEST_VALUE".to_string(), "42".to_string());

        let outcome = LocalProcessInvoker::new().invoke(&request).unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.stdout, "42\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_kills_child() {
        let request = sh("sleep 30");
        let token = request.cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            token.cancel();
        });

        let start = Instant::now();
        let result = LocalProcessInvoker::new()
            .with_poll_interval(Duration::from_millis(20))
            .invoke(&request);
        canceller.join().unwrap();

        assert!(matches!(result, Err(StepError::Interrupted { .. })));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let request = InvocationRequest {
            program: "/definitely/not/here/ZAdviserCLI.sh".to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: std::env::temp_dir(),
            display: String::new(),
            cancel: CancellationToken::new(),
            echo: false,
        };
        let result = LocalProcessInvoker::new().invoke(&request);
        assert!(matches!(result, Err(StepError::Io(_))));
    }
}
