use crate::backup::backup_config::BackupConfig;
use crate::backup::location::LocationOutcome;
use crate::backup::output::{run_outputs, OutputsOutcome};
use crate::backup::result_error::result::{convert_error_vec, Result};
use crate::backup::size::{measure, SizeAccumulator};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Everything a full run did, in the order it happened.
#[derive(Debug)]
pub struct BackupReport {
    pub locations: Vec<LocationOutcome>,
    pub outputs: OutputsOutcome,
    /// Wall-clock time from the first location to the end of the outputs batch.
    pub elapsed: Duration,
    pub backup_directory: PathBuf,
    /// Size of everything currently in the backup directory, including files
    /// this run did not write.
    pub backup_directory_size: SizeAccumulator,
}

impl BackupReport {
    pub fn failed_locations(&self) -> usize {
        self.locations.iter().filter(|l| !l.is_success()).count()
    }

    pub fn failed_hooks(&self) -> usize {
        self.locations.iter().map(LocationOutcome::failed_hooks).sum()
    }

    /// Collects every failure recorded during the run into one error.
    pub fn into_result(self) -> Result<()> {
        let mut errors = Vec::new();
        for location in self.locations {
            errors.extend(location.pre_backup.into_iter().filter_map(|r| r.err()));
            errors.extend(location.archive.err());
            errors.extend(location.post_backup.into_iter().filter_map(|r| r.err()));
        }
        errors.extend(self.outputs.aborted);
        convert_error_vec(errors)
    }
}

impl Display for BackupReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Backup completed in {:.2} seconds.", self.elapsed.as_secs_f64())?;
        writeln!(f, "Backup directory: {}", self.backup_directory.display())?;
        write!(
            f,
            "Backup total size is {}.",
            self.backup_directory_size.human_size()
        )?;

        let failed_locations = self.failed_locations();
        if failed_locations > 0 {
            write!(
                f,
                "\n{} of {} location(s) failed.",
                failed_locations,
                self.locations.len()
            )?;
        }
        let failed_hooks = self.failed_hooks();
        if failed_hooks > 0 {
            write!(f, "\n{} hook command(s) failed.", failed_hooks)?;
        }
        for location in &self.locations {
            for command in &location.skipped_post_backup {
                write!(
                    f,
                    "\nSkipped post-backup command for {}: {}",
                    location.path.display(),
                    command
                )?;
            }
        }
        if let Some(e) = &self.outputs.aborted {
            write!(f, "\nOutputs aborted: {e}")?;
        }
        Ok(())
    }
}

impl BackupConfig {
    /// Backs up every location in order, then runs the outputs batch.
    ///
    /// A failing location never stops the loop. The outputs batch stops at its
    /// first failing job.
    pub fn run_backup(&self) -> BackupReport {
        let start = Instant::now();

        let locations = self
            .locations()
            .iter()
            .map(|location| location.backup(self.archive_format(), self.backup_directory()))
            .collect();
        let outputs = run_outputs(self.outputs(), self.backup_directory());

        let elapsed = start.elapsed();

        BackupReport {
            locations,
            outputs,
            elapsed,
            backup_directory: self.backup_directory().clone(),
            backup_directory_size: measure(self.backup_directory()),
        }
    }

    /// Current size of the backup directory.
    pub fn backup_size(&self) -> SizeAccumulator {
        measure(self.backup_directory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::location::LocationSpec;
    use crate::backup::output::OutputSpec;
    use crate::backup::result_error::error::Error;
    use std::path::Path;
    use tempfile::TempDir;

    fn make_dir(root: &Path, name: &str, bytes: usize) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("data.bin"), vec![1u8; bytes]).unwrap();
        dir
    }

    #[test]
    fn test_full_run_replaces_previous_archive() {
        let temp_dir = TempDir::new().unwrap();
        let photos = make_dir(temp_dir.path(), "photos", 64);
        let backups = temp_dir.path().join("backups");
        std::fs::create_dir_all(&backups).unwrap();
        std::fs::write(backups.join("photos.zip"), "old archive").unwrap();

        let config = BackupConfig::builder()
            .backup_directory(&backups)
            .archive_format("zip")
            .locations(vec![LocationSpec::builder().path(&photos).build()])
            .build();
        let report = config.run_backup();

        assert_eq!(report.failed_locations(), 0);
        assert!(report.outputs.is_success());
        let content = std::fs::read(backups.join("photos.zip")).unwrap();
        assert_ne!(content, b"old archive");
        assert_eq!(&content[..2], b"PK");
        assert_eq!(report.backup_directory_size.bytes_total(), content.len() as u64);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_failed_location_does_not_stop_the_loop() {
        let temp_dir = TempDir::new().unwrap();
        let docs = make_dir(temp_dir.path(), "docs", 16);
        let backups = temp_dir.path().join("backups");

        let config = BackupConfig::builder()
            .backup_directory(&backups)
            .archive_format("tar")
            .locations(vec![
                LocationSpec::builder().path(temp_dir.path().join("missing")).build(),
                LocationSpec::builder().path(&docs).build(),
            ])
            .build();
        let report = config.run_backup();

        assert_eq!(report.locations.len(), 2);
        assert_eq!(report.failed_locations(), 1);
        assert!(!report.locations[0].is_success());
        assert!(report.locations[1].is_success());
        assert!(backups.join("docs.tar").is_file());
        assert!(report.to_string().contains("1 of 2 location(s) failed."));
        assert!(report.into_result().is_err());
    }

    #[test]
    fn test_unsupported_format_fails_every_location_but_runs_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let a = make_dir(temp_dir.path(), "a", 1);
        let b = make_dir(temp_dir.path(), "b", 1);
        let backups = temp_dir.path().join("backups");

        let config = BackupConfig::builder()
            .backup_directory(&backups)
            .archive_format("rar")
            .locations(vec![
                LocationSpec::builder().path(&a).build(),
                LocationSpec::builder().path(&b).build(),
            ])
            .outputs(vec![OutputSpec::builder().name("only-name").build()])
            .build();
        let report = config.run_backup();

        assert_eq!(report.failed_locations(), 2);
        assert!(!report.outputs.is_success());
        assert_eq!(report.backup_directory_size.bytes_total(), 0);
        match report.into_result() {
            Err(Error::LotsOfError(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("Expected LotsOfError, got {:?}", other),
        }
    }

    #[test]
    fn test_report_lists_skipped_post_backup_commands() {
        let temp_dir = TempDir::new().unwrap();
        let db = make_dir(temp_dir.path(), "db", 4);

        let config = BackupConfig::builder()
            .backup_directory(temp_dir.path().join("backups"))
            .archive_format("rar")
            .locations(vec![LocationSpec::builder()
                .path(&db)
                .post_backup(vec!["systemctl start db".into()])
                .build()])
            .build();
        let report = config.run_backup();

        assert_eq!(report.failed_hooks(), 0);
        assert!(report.to_string().contains(&format!(
            "Skipped post-backup command for {}: systemctl start db",
            db.display()
        )));
    }

    #[cfg(unix)]
    #[test]
    fn test_outputs_run_after_locations() {
        let temp_dir = TempDir::new().unwrap();
        let src = make_dir(temp_dir.path(), "etc", 8);
        let backups = temp_dir.path().join("backups");

        let config = BackupConfig::builder()
            .backup_directory(&backups)
            .archive_format("gzip-tar")
            .locations(vec![LocationSpec::builder().path(&src).build()])
            .outputs(vec![OutputSpec::builder()
                .name("listing")
                .command(format!("ls {}", backups.display()))
                .build()])
            .build();
        let report = config.run_backup();

        assert!(report.outputs.is_success());
        assert_eq!(
            std::fs::read_to_string(backups.join("output-listing.txt")).unwrap(),
            "etc.tar.gz\n"
        );
        let rendered = report.to_string();
        assert!(rendered.starts_with("Backup completed in "));
        assert!(rendered.contains(&format!("Backup directory: {}", backups.display())));
    }

    #[test]
    fn test_backup_size_counts_unrelated_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("unrelated"), vec![0u8; 1024]).unwrap();

        let config = BackupConfig::builder()
            .backup_directory(temp_dir.path())
            .archive_format("zip")
            .build();
        assert_eq!(config.backup_size().human_size().to_string(), "1.00KB");
    }
}
