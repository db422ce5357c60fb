use crate::backup::file_ext::FileExtProvider;
use crate::backup::finish::Finish;
use bzip2::write::BzEncoder;
use derive_more::From;
use flate2::write::GzEncoder;
use io_enum::Write;
use std::io;
use std::io::Write;
use std::sync::{Arc, OnceLock};

/// Stream compressor wrapped around a tar stream.
#[derive(Write, From)]
pub enum Compressor<W: Write> {
    None(W),
    GzEncoder(GzEncoder<W>),
    BzEncoder(BzEncoder<W>),
}

/// Compression stage of a tar based archive format.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
pub enum CompressorConfig {
    #[default]
    None,
    Gzip,
    Bzip2,
}

pub trait CompressorBuilder<W: Write> {
    fn build_compressor(&self, writer: W) -> Compressor<W>;
}

impl<W: Write> Finish<W> for Compressor<W> {
    fn finish(self) -> io::Result<W> {
        match self {
            Compressor::None(w) => Ok(w),
            Compressor::GzEncoder(w) => w.finish(),
            Compressor::BzEncoder(w) => w.finish(),
        }
    }
}

impl<W: Write> CompressorBuilder<W> for CompressorConfig {
    fn build_compressor(&self, writer: W) -> Compressor<W> {
        tracing::debug!("Creating {:?} compressor", self);
        match self {
            CompressorConfig::None => Compressor::None(writer),
            CompressorConfig::Gzip => {
                GzEncoder::new(writer, flate2::Compression::default()).into()
            }
            CompressorConfig::Bzip2 => {
                BzEncoder::new(writer, bzip2::Compression::default()).into()
            }
        }
    }
}

static GZ_FILE_EXT: OnceLock<Arc<str>> = OnceLock::new();
static BZ2_FILE_EXT: OnceLock<Arc<str>> = OnceLock::new();

impl FileExtProvider for CompressorConfig {
    fn file_ext(&self) -> Option<Arc<str>> {
        match self {
            CompressorConfig::None => None,
            CompressorConfig::Gzip => Some(GZ_FILE_EXT.get_or_init(|| "gz".into()).clone()),
            CompressorConfig::Bzip2 => Some(BZ2_FILE_EXT.get_or_init(|| "bz2".into()).clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_ext() {
        assert_eq!(CompressorConfig::None.file_ext(), None);
        assert_eq!(CompressorConfig::Gzip.file_ext().as_deref(), Some("gz"));
        assert_eq!(CompressorConfig::Bzip2.file_ext().as_deref(), Some("bz2"));
    }

    #[test]
    fn test_none_compressor_passes_bytes_through() {
        let mut compressor = CompressorConfig::None.build_compressor(Vec::new());
        compressor.write_all(b"plain").unwrap();
        assert_eq!(compressor.finish().unwrap(), b"plain");
    }

    #[test]
    fn test_build_compressor_variants() {
        match CompressorConfig::Gzip.build_compressor(Vec::new()) {
            Compressor::GzEncoder(_) => (),
            _ => panic!("Expected GzEncoder"),
        }
        match CompressorConfig::Bzip2.build_compressor(Vec::new()) {
            Compressor::BzEncoder(_) => (),
            _ => panic!("Expected BzEncoder"),
        }
    }

    #[test]
    fn test_gzip_round_trip() {
        let mut compressor = CompressorConfig::Gzip.build_compressor(Vec::new());
        compressor.write_all(b"hello hello hello").unwrap();
        let compressed = compressor.finish().unwrap();

        let mut decoded = String::new();
        std::io::Read::read_to_string(
            &mut flate2::read::GzDecoder::new(compressed.as_slice()),
            &mut decoded,
        )
        .unwrap();
        assert_eq!(decoded, "hello hello hello");
    }
}
