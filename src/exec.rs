//! External process invocation with timeouts and provenance capture.
//!
//! Every external tool call goes through [`run`]: the exact command line is
//! rendered for the run log, output locations are always explicit arguments
//! (never the ambient working directory), and a hung process is killed at
//! the configured deadline instead of stalling the whole run.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use itertools::Itertools;

use crate::error::GeneError;

/// One fully-resolved external command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec { program: program.into(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn arg_path(mut self, arg: &Path) -> Self {
        self.args.push(arg.display().to_string());
        self
    }

    /// The command line as written to the provenance log.
    pub fn render(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.iter().join(" "))
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Captured result of a finished invocation.
#[derive(Debug)]
pub struct CapturedOutput {
    pub stdout: String,
}

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run one external command.
///
/// `timeout = None` waits forever; with a timeout
/// the child is killed on expiry and the gene fails with
/// [`GeneError::Timeout`]. When `capture` is set, stdout is drained on a
/// helper thread so a full pipe can never deadlock the deadline loop;
/// otherwise the child's output is discarded.
pub fn run(
    spec: &CommandSpec,
    timeout: Option<Duration>,
    capture: bool,
) -> Result<CapturedOutput, GeneError> {
    let rendered = spec.render();
    log::debug!("exec: {rendered}");

    let mut command = Command::new(&spec.program);
    command.args(&spec.args).stdin(Stdio::null()).stderr(Stdio::null());
    command.stdout(if capture { Stdio::piped() } else { Stdio::null() });

    let mut child = command.spawn().map_err(|e| GeneError::ExternalTool {
        command: rendered.clone(),
        reason: format!("failed to start: {e}"),
    })?;

    let reader = child.stdout.take().map(|mut stdout| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            buf
        })
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if let Some(limit) = timeout {
                    if started.elapsed() >= limit {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(GeneError::Timeout {
                            command: rendered,
                            secs: limit.as_secs(),
                        });
                    }
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                return Err(GeneError::ExternalTool {
                    command: rendered,
                    reason: format!("wait failed: {e}"),
                });
            }
        }
    };

    let stdout = reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();

    if !status.success() {
        return Err(GeneError::ExternalTool {
            command: rendered,
            reason: format!("exited with {status}"),
        });
    }

    Ok(CapturedOutput { stdout })
}

/// Run and require that `expected_output` exists afterwards.
///
/// Tree-search engines signal success through their output files, so a
/// zero exit without the promised best-tree file is still a failure.
pub fn run_expecting_file(
    spec: &CommandSpec,
    timeout: Option<Duration>,
    expected_output: &Path,
) -> Result<(), GeneError> {
    run(spec, timeout, false)?;
    if !expected_output.exists() {
        return Err(GeneError::ExternalTool {
            command: spec.render(),
            reason: format!("expected output file {} is missing", expected_output.display()),
        });
    }
    Ok(())
}
