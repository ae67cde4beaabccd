//! Collaborator seams - the transport helper and physical side effects.
//!
//! Both are external processes. The core only sees (stdout, stderr, exit
//! code) triples; tests substitute recording fakes behind the traits.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::command::DeviceCommand;

/// Captured output of one collaborator invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// A non-empty stderr or non-zero exit code is a transport failure,
    /// distinct from a signal mismatch.
    pub fn transport_failed(&self) -> bool {
        !self.stderr.is_empty() || self.exit_code != 0
    }

    /// Synthesize a failure for cases where the collaborator never ran.
    pub fn spawn_failure(err: impl std::fmt::Display) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("failed to spawn collaborator: {}", err),
            exit_code: -1,
        }
    }
}

fn capture(output: std::process::Output) -> CommandOutput {
    let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
    let exit_code = output.status.code().unwrap_or(-1);
    debug!("stdout: {}", stdout);
    debug!("stderr: {}", stderr);
    CommandOutput {
        stdout,
        stderr,
        exit_code,
    }
}

/// Line-oriented command channel to the switcher.
pub trait Transport {
    fn execute(&self, port: &str, command: DeviceCommand) -> Result<CommandOutput>;
}

/// Production transport: spawns the serial helper process, which owns the
/// wire protocol and the port I/O.
pub struct HelperTransport {
    helper: PathBuf,
}

impl HelperTransport {
    pub fn new(helper: impl Into<PathBuf>) -> Self {
        Self {
            helper: helper.into(),
        }
    }
}

impl Transport for HelperTransport {
    fn execute(&self, port: &str, command: DeviceCommand) -> Result<CommandOutput> {
        debug!("Command: {} {} {}", self.helper.display(), port, command);
        let output = Command::new(&self.helper)
            .arg(port)
            .arg(command.name())
            .output()
            .with_context(|| format!("failed to spawn transport helper {}", self.helper.display()))?;
        Ok(capture(output))
    }
}

/// Opaque side-effecting commands: power control, wake scheduling, event
/// reports, email.
pub trait SideEffects {
    fn run(&self, argv: &[String]) -> Result<CommandOutput>;
}

/// Production side effects: spawns argv[0] with the remaining arguments.
pub struct ProcessSideEffects;

impl SideEffects for ProcessSideEffects {
    fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .context("side-effect argv must not be empty")?;
        debug!("Command: {:?}", argv);
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to spawn {}", program))?;
        Ok(capture(output))
    }
}
