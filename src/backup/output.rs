//! Output jobs: shell commands whose stdout is kept as a backup artifact.

use crate::backup::command::ShellCommand;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One configured output job.
///
/// Both fields are optional at load time. A job missing either one is only
/// rejected when the outputs batch reaches it.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct OutputSpec {
    #[builder(into)]
    name: Option<Arc<str>>,
    #[builder(into)]
    command: Option<ShellCommand>,
}

pub fn artifact_file_name(name: &str) -> String {
    format!("output-{name}.txt")
}

impl OutputSpec {
    fn checked_fields(&self, index: usize) -> Result<(&str, &ShellCommand)> {
        let name = self
            .name
            .as_deref()
            .ok_or(Error::MissingOutputField { field: "name", index })?;
        let command = self
            .command
            .as_ref()
            .ok_or(Error::MissingOutputField { field: "command", index })?;
        if !sanitize_filename::is_sanitized(name) {
            return Err(Error::InvalidOutputName(name.to_string()));
        }
        Ok((name, command))
    }

    /// Runs the job and writes its raw stdout to
    /// `backup_directory/output-<name>.txt`, replacing any previous capture.
    ///
    /// `index` is the job's position in the batch and only used for reporting.
    pub fn run_output<P: AsRef<Path>>(&self, index: usize, backup_directory: P) -> Result<PathBuf> {
        let (name, command) = self.checked_fields(index)?;

        tracing::info!("Executing output {name}...");
        let stdout = command
            .capture_stdout()
            .with_msg(format!("Output {name} failed"))?;

        let backup_directory = backup_directory.as_ref();
        std::fs::create_dir_all(backup_directory)?;
        let artifact = backup_directory.join(artifact_file_name(name));
        std::fs::write(&artifact, stdout)
            .map_err(Error::from)
            .with_msg(format!("Writing {:?} failed", artifact))?;
        Ok(artifact)
    }
}

/// Result of the outputs batch.
#[derive(Debug, Default)]
pub struct OutputsOutcome {
    /// Artifacts written, in job order.
    pub written: Vec<PathBuf>,
    /// The failure that stopped the batch, if any.
    pub aborted: Option<Error>,
}

impl OutputsOutcome {
    pub fn is_success(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Runs every output job in order.
///
/// The first job that fails stops the batch: later jobs do not run, and
/// artifacts already written by earlier jobs stay in place.
pub fn run_outputs<P: AsRef<Path>>(outputs: &[OutputSpec], backup_directory: P) -> OutputsOutcome {
    let mut outcome = OutputsOutcome::default();
    for (index, output) in outputs.iter().enumerate() {
        match output.run_output(index, backup_directory.as_ref()) {
            Ok(artifact) => outcome.written.push(artifact),
            Err(e) => {
                tracing::warn!("{e}");
                let skipped = outputs.len() - index - 1;
                if skipped > 0 {
                    tracing::warn!("Skipping {skipped} remaining output(s)");
                }
                outcome.aborted = Some(e);
                break;
            }
        }
    }
    outcome
}
