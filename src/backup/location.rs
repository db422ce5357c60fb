use crate::backup::archive::archive;
use crate::backup::command::{run_all, ShellCommand};
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::validate::validate_non_empty_path;
use bon::Builder;
use getset::Getters;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// A directory to back up, with the hooks wrapped around its archive.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct LocationSpec {
    #[validate(custom(function = validate_non_empty_path))]
    #[builder(into)]
    path: PathBuf,
    #[serde(default)]
    #[builder(default, into)]
    pre_backup: Vec<ShellCommand>,
    #[serde(default)]
    #[builder(default, into)]
    post_backup: Vec<ShellCommand>,
}

/// What happened to one location during a run.
#[derive(Debug)]
pub struct LocationOutcome {
    pub path: PathBuf,
    pub pre_backup: Vec<Result<()>>,
    pub archive: Result<PathBuf>,
    /// Empty when the archive step failed, since post-backup hooks only run
    /// after a successful archive.
    pub post_backup: Vec<Result<()>>,
    /// Post-backup hooks that were not run because the archive failed.
    pub skipped_post_backup: Vec<ShellCommand>,
}

impl LocationOutcome {
    pub fn is_success(&self) -> bool {
        self.archive.is_ok()
    }

    pub fn failed_hooks(&self) -> usize {
        self.pre_backup
            .iter()
            .chain(self.post_backup.iter())
            .filter(|r| r.is_err())
            .count()
    }
}

impl LocationSpec {
    /// Runs pre-backup hooks, archives the location, then runs post-backup
    /// hooks.
    ///
    /// The format tag is only checked by the archive step, so pre-backup
    /// hooks run even when the format turns out to be unsupported.
    pub fn backup<P: AsRef<Path>>(&self, format_tag: &str, backup_directory: P) -> LocationOutcome {
        tracing::info!("Backing up {:?}...", self.path);

        tracing::info!("Executing pre-backup commands...");
        let pre_backup = run_all(&self.pre_backup);

        let archive = archive(&self.path, format_tag, backup_directory)
            .with_msg(format!("Backing up {:?} failed", self.path));

        let (post_backup, skipped_post_backup) = match &archive {
            Ok(_) => {
                tracing::info!("Executing post-backup commands...");
                (run_all(&self.post_backup), Vec::new())
            }
            Err(e) => {
                tracing::warn!("{e}");
                if !self.post_backup.is_empty() {
                    tracing::warn!(
                        "Skipping post-backup commands for {:?}, run them by hand if needed:\n{}",
                        self.path,
                        self.post_backup.iter().map(|c| format!("  {c}")).join("\n")
                    );
                }
                (Vec::new(), self.post_backup.clone())
            }
        };

        LocationOutcome {
            path: self.path.clone(),
            pre_backup,
            archive,
            post_backup,
            skipped_post_backup,
        }
    }
}
