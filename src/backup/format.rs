//! Archive format tags and their static properties.
//!
//! A configured format tag is kept as raw text in the configuration and parsed
//! here, at the point a location is archived, so an unknown tag only fails the
//! location being processed.

use crate::backup::compress::CompressorConfig;
use crate::backup::file_ext::FileExtProvider;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use derive_more::Display;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use validator::Validate;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    #[display("zip")]
    Zip,
    #[display("tar")]
    Tar,
    #[display("gzip-tar")]
    #[serde(alias = "gztar")]
    GzipTar,
    #[display("bzip2-tar")]
    #[serde(alias = "bztar")]
    Bzip2Tar,
}

/// Container layout written by the codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    Zip,
    Tar,
}

/// Static facts about one archive format.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveFormatInfo {
    pub compression_ratio: f64,
    pub file_extension: Arc<str>,
}

static FORMAT_INFO: OnceLock<HashMap<ArchiveFormat, ArchiveFormatInfo>> = OnceLock::new();
static ZIP_FILE_EXT: OnceLock<Arc<str>> = OnceLock::new();
static TAR_FILE_EXT: OnceLock<Arc<str>> = OnceLock::new();

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 4] = [
        ArchiveFormat::Zip,
        ArchiveFormat::Tar,
        ArchiveFormat::GzipTar,
        ArchiveFormat::Bzip2Tar,
    ];

    /// Tag the codec names its freshly written archive with.
    pub fn codec_tag(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::GzipTar => "gztar",
            ArchiveFormat::Bzip2Tar => "bztar",
        }
    }

    pub fn container(&self) -> Container {
        match self {
            ArchiveFormat::Zip => Container::Zip,
            _ => Container::Tar,
        }
    }

    pub fn compressor(&self) -> CompressorConfig {
        match self {
            ArchiveFormat::Zip | ArchiveFormat::Tar => CompressorConfig::None,
            ArchiveFormat::GzipTar => CompressorConfig::Gzip,
            ArchiveFormat::Bzip2Tar => CompressorConfig::Bzip2,
        }
    }

    fn default_compression_ratio(&self) -> f64 {
        match self.compressor() {
            CompressorConfig::None => 1.0,
            CompressorConfig::Gzip | CompressorConfig::Bzip2 => 0.5,
        }
    }

    pub fn info(&self) -> &'static ArchiveFormatInfo {
        &FORMAT_INFO.get_or_init(|| {
            ArchiveFormat::ALL
                .iter()
                .map(|f| {
                    let info = ArchiveFormatInfo {
                        compression_ratio: f.default_compression_ratio(),
                        file_extension: f.file_ext().unwrap_or_else(|| f.codec_tag().into()),
                    };
                    (*f, info)
                })
                .collect()
        })[self]
    }
}

impl FileExtProvider for ArchiveFormat {
    fn file_ext(&self) -> Option<Arc<str>> {
        let container = match self.container() {
            Container::Zip => ZIP_FILE_EXT.get_or_init(|| "zip".into()),
            Container::Tar => TAR_FILE_EXT.get_or_init(|| "tar".into()),
        };
        Some(
            std::iter::once(container.clone())
                .chain(self.compressor().file_ext())
                .join(".")
                .into(),
        )
    }
}

impl FromStr for ArchiveFormat {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar" => Ok(ArchiveFormat::Tar),
            "gzip-tar" | "gztar" => Ok(ArchiveFormat::GzipTar),
            "bzip2-tar" | "bztar" => Ok(ArchiveFormat::Bzip2Tar),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Per-format overrides for the estimated compression ratio used by preview.
///
/// The defaults are coarse guesses, not measurements; any format left unset
/// keeps its default.
#[skip_serializing_none]
#[derive(Clone, Default, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct CompressionRatios {
    #[validate(range(min = 0.0))]
    pub zip: Option<f64>,
    #[validate(range(min = 0.0))]
    pub tar: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(alias = "gztar")]
    pub gzip_tar: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(alias = "bztar")]
    pub bzip2_tar: Option<f64>,
}

impl CompressionRatios {
    pub fn ratio_for(&self, format: ArchiveFormat) -> f64 {
        let configured = match format {
            ArchiveFormat::Zip => self.zip,
            ArchiveFormat::Tar => self.tar,
            ArchiveFormat::GzipTar => self.gzip_tar,
            ArchiveFormat::Bzip2Tar => self.bzip2_tar,
        };
        configured.unwrap_or(format.info().compression_ratio)
    }
}
