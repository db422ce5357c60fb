//! Dry-run size estimation. Nothing here writes to the filesystem.

use crate::backup::backup_config::BackupConfig;
use crate::backup::result_error::result::Result;
use crate::backup::size::human::HumanSize;
use crate::backup::size::{measure, SizeAccumulator};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct LocationEstimate {
    pub path: PathBuf,
    pub size: SizeAccumulator,
}

#[derive(Debug)]
pub struct PreviewReport {
    pub locations: Vec<LocationEstimate>,
    pub total_bytes: u64,
    pub archive_format: Arc<str>,
    /// Predicted archive size in bytes, or why it could not be predicted.
    pub estimated_archive_bytes: Result<f64>,
}

impl Display for PreviewReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for location in &self.locations {
            writeln!(
                f,
                "Backup of {} will be {} ({} files ignored)",
                location.path.display(),
                location.size.human_size(),
                location.size.files_skipped()
            )?;
        }
        writeln!(
            f,
            "Total backup size will be {}.",
            HumanSize::from(self.total_bytes)
        )?;
        match &self.estimated_archive_bytes {
            Ok(bytes) => write!(
                f,
                "Expected archive size for {} is {}",
                self.archive_format,
                HumanSize::from(*bytes)
            ),
            Err(e) => write!(f, "Cannot estimate archive size: {e}"),
        }
    }
}

impl BackupConfig {
    /// Measures every location and predicts the archive size from the
    /// configured format's compression ratio.
    pub fn preview(&self) -> PreviewReport {
        let locations: Vec<_> = self
            .locations()
            .iter()
            .map(|location| {
                tracing::info!("Measuring {:?}...", location.path());
                LocationEstimate {
                    path: location.path().clone(),
                    size: measure(location.path()),
                }
            })
            .collect();

        let total_bytes: u64 = locations.iter().map(|l| l.size.bytes_total()).sum();
        let estimated_archive_bytes = self
            .compression_ratio()
            .map(|ratio| total_bytes as f64 * ratio);

        PreviewReport {
            locations,
            total_bytes,
            archive_format: self.archive_format().clone(),
            estimated_archive_bytes,
        }
    }
}
