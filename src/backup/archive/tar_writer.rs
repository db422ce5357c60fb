use crate::backup::archive::{ArchiveEntry, ArchiveEntryKind};
use crate::backup::compress::{CompressorBuilder, CompressorConfig};
use crate::backup::finish::Finish;
use crate::backup::result_error::result::Result;
use std::io::{BufWriter, IntoInnerError, Write};

/// Streams `entries` into a tar archive, compressed with `compressor`, and
/// returns the writer once the archive trailer and compression footer are
/// flushed.
pub fn write_tar_archive<W: Write, I: IntoIterator<Item = Result<ArchiveEntry>>>(
    entries: I,
    compressor: CompressorConfig,
    writer: W,
) -> Result<W> {
    let mut builder = tar::Builder::new(compressor.build_compressor(BufWriter::new(writer)));
    builder.follow_symlinks(false);

    let mut entry_count = 0;
    for entry in entries {
        let entry = entry?;
        match entry.kind {
            ArchiveEntryKind::Dir => builder.append_dir(&entry.dst, &entry.src)?,
            ArchiveEntryKind::File | ArchiveEntryKind::Symlink => {
                builder.append_path_with_name(&entry.src, &entry.dst)?
            }
        }
        tracing::trace!("Added {:?} as {:?}", entry.src, entry.dst);
        entry_count += 1;
    }
    tracing::debug!("Processed {} tar entries", entry_count);

    let writer = builder
        .into_inner()?
        .finish()?
        .into_inner()
        .map_err(IntoInnerError::into_error)?;
    Ok(writer)
}
