use crate::backup::format::{ArchiveFormat, CompressionRatios};
use crate::backup::location::LocationSpec;
use crate::backup::output::OutputSpec;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::validate::validate_dir_or_absent;
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::Validate;

/// The whole backup job, as read from the YAML configuration file.
///
/// `archive_format` is kept as the raw tag from the file. It is parsed each
/// time it is used so an unsupported tag fails the affected location instead
/// of the load.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct BackupConfig {
    #[validate(custom(function = validate_dir_or_absent))]
    #[builder(into)]
    backup_directory: PathBuf,
    #[builder(into)]
    archive_format: Arc<str>,
    #[validate(nested)]
    #[serde(default)]
    #[builder(default, into)]
    locations: Vec<LocationSpec>,
    #[serde(default)]
    #[builder(default, into)]
    outputs: Vec<OutputSpec>,
    #[validate(nested)]
    compression_ratios: Option<CompressionRatios>,
}

impl BackupConfig {
    /// Reads and validates a configuration file. Any failure here is fatal and
    /// happens before a single hook or archive runs.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        File::open(path)
            .map_err(Error::from)
            .with_msg(format!("Open config failed: {:?}", path))
            .and_then(|f| {
                serde_yml::from_reader::<_, BackupConfig>(f)
                    .map_err(Error::from)
                    .with_msg(format!("Parse YAML config failed: {:?}", path))
            })
            .and_then(|bc| {
                bc.validate()
                    .map_err(Error::from)
                    .map(|_| bc)
                    .with_msg(format!("Config validation failed: {:?}", path))
            })
    }

    pub fn parse_archive_format(&self) -> Result<ArchiveFormat> {
        self.archive_format.parse()
    }

    /// Estimated archive size divided by input size for the configured format.
    pub fn compression_ratio(&self) -> Result<f64> {
        let format = self.parse_archive_format()?;
        Ok(self
            .compression_ratios
            .as_ref()
            .map(|r| r.ratio_for(format))
            .unwrap_or(format.info().compression_ratio))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yml::to_string(self)?)
    }
}
