//! Opaque shell command execution.
//!
//! Command strings are handed to the platform shell untouched, so hooks behave
//! exactly as they would when typed at a prompt. They run with the caller's
//! privileges and are trusted as much as the configuration file itself.

use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};
use std::sync::Arc;

#[derive(Clone, Debug, Display, From, Deref, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShellCommand(Arc<str>);

impl From<&str> for ShellCommand {
    fn from(value: &str) -> Self {
        ShellCommand(value.into())
    }
}

impl From<String> for ShellCommand {
    fn from(value: String) -> Self {
        ShellCommand(value.into())
    }
}

impl ShellCommand {
    #[cfg(not(windows))]
    fn shell(&self) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(self.0.as_ref());
        command
    }

    #[cfg(windows)]
    fn shell(&self) -> Command {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(self.0.as_ref());
        command
    }

    /// Runs the command to completion with inherited standard streams.
    pub fn run(&self) -> Result<()> {
        let status = self.shell().status()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                command: self.0.to_string(),
                status,
            })
        }
    }

    /// Runs the command and returns its raw stdout. Stderr stays attached to
    /// the caller's stream.
    pub fn capture_stdout(&self) -> Result<Vec<u8>> {
        let output = self
            .shell()
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(Error::CommandFailed {
                command: self.0.to_string(),
                status: output.status,
            })
        }
    }
}

/// Runs each command in order, waiting for each to exit before starting the
/// next. A failing command is reported and the sequence carries on.
pub fn run_all(commands: &[ShellCommand]) -> Vec<Result<()>> {
    commands
        .iter()
        .map(|command| {
            tracing::debug!("Executing {command}");
            let res = command.run();
            if let Err(e) = &res {
                tracing::warn!("{e}");
            }
            res
        })
        .collect()
}
