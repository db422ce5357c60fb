pub mod tar_writer;
pub mod zip_writer;

use crate::backup::archive::tar_writer::write_tar_archive;
use crate::backup::archive::zip_writer::write_zip_archive;
use crate::backup::format::{ArchiveFormat, Container};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{WithDebugObjectAndFnName, WithMsg};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Mode of a persisted archive, instead of the owner-only mode of temp files.
#[cfg(unix)]
const ARCHIVE_MODE: u32 = 0o644;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveEntryKind {
    Dir,
    File,
    /// Stored as a link, never descended into.
    Symlink,
}

/// A single file or directory to be written into an archive.
#[derive(Debug)]
pub struct ArchiveEntry {
    /// Path on the filesystem.
    pub src: PathBuf,
    /// Path inside the archive, relative to the archived directory.
    pub dst: PathBuf,
    pub kind: ArchiveEntryKind,
}

/// Lists everything below `src_dir` in a stable order.
///
/// Symlinks are listed as links and never followed, except when `src_dir`
/// itself is one. Anything under a path in `excluded` is left out, as are
/// entries that are neither directories, regular files nor symlinks (sockets,
/// fifos).
pub fn archive_entries<'a>(
    src_dir: &'a Path,
    excluded: &'a [PathBuf],
) -> impl Iterator<Item = Result<ArchiveEntry>> + 'a {
    WalkDir::new(src_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |de| !excluded.iter().any(|p| p == de.path()))
        .filter_map(move |res| match res {
            Ok(de) => process_dir_entry(de, src_dir),
            Err(e) => Some(Err(e.into())),
        })
}

fn process_dir_entry(de: DirEntry, base_src_dir: &Path) -> Option<Result<ArchiveEntry>> {
    let kind = if de.file_type().is_dir() {
        ArchiveEntryKind::Dir
    } else if de.file_type().is_file() {
        ArchiveEntryKind::File
    } else if de.path_is_symlink() {
        ArchiveEntryKind::Symlink
    } else {
        tracing::trace!("Skipping {:?}, not a file or directory", de.path());
        return None;
    };

    let src = de.into_path();
    let res = match src.strip_prefix(base_src_dir) {
        Ok(stripped) => Ok(stripped.to_path_buf()),
        Err(e) => Err(Error::from(std::io::Error::other(e)).with_msg(format!(
            "Stripping {:?} from {:?} failed",
            base_src_dir, src
        ))),
    };

    Some(res.map(|dst| ArchiveEntry { src, dst, kind }))
}

/// Writes an archive of one directory in a given format.
pub trait ArchiveCodec {
    fn write_archive<W: Write + Seek>(
        &self,
        src_dir: &Path,
        excluded: &[PathBuf],
        writer: W,
    ) -> Result<W>;
}

impl ArchiveCodec for ArchiveFormat {
    fn write_archive<W: Write + Seek>(
        &self,
        src_dir: &Path,
        excluded: &[PathBuf],
        writer: W,
    ) -> Result<W> {
        if !src_dir.is_dir() {
            return Err(Error::from(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{:?} is not a directory", src_dir),
            )));
        }

        match self.container() {
            Container::Zip => write_zip_archive(archive_entries(src_dir, excluded), writer),
            Container::Tar => {
                write_tar_archive(archive_entries(src_dir, excluded), self.compressor(), writer)
            }
        }
    }
}

/// Name of the archive for `source_dir`: its last path component, ignoring
/// trailing separators.
pub fn archive_base_name(source_dir: &Path) -> Result<String> {
    source_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| {
            Error::from(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("cannot derive an archive name from {:?}", source_dir),
            ))
        })
}

/// Paths under `source_dir` that must stay out of its own archive.
///
/// When `dest_dir` lies inside `source_dir` the whole backup directory is
/// excluded. When both are the same directory only `own_files` (the temporary
/// and final archive) are.
fn excluded_paths(source_dir: &Path, dest_dir: &Path, own_files: &[&Path]) -> Vec<PathBuf> {
    let (Ok(source), Ok(dest)) = (source_dir.canonicalize(), dest_dir.canonicalize()) else {
        return Vec::new();
    };
    match dest.strip_prefix(&source) {
        Ok(rel) if rel.as_os_str().is_empty() => own_files
            .iter()
            .filter_map(|f| f.file_name())
            .map(|name| source_dir.join(name))
            .collect(),
        Ok(rel) => vec![source_dir.join(rel)],
        Err(_) => Vec::new(),
    }
}

/// Archives `source_dir` into `dest_dir/<base_name>.<extension>`.
///
/// The format tag is checked first; an unknown tag fails without touching the
/// filesystem. The archive is written to a temporary file in `dest_dir`, any
/// previous archive at the destination is deleted, and the temporary file is
/// then moved into place with mode 0644 on unix. Interrupting the process
/// between the delete and the move leaves no archive for this location.
///
/// A `dest_dir` inside `source_dir` is never archived into itself.
pub fn archive<P1: AsRef<Path>, P2: AsRef<Path>>(
    source_dir: P1,
    format_tag: &str,
    dest_dir: P2,
) -> Result<PathBuf> {
    let source_dir = source_dir.as_ref();
    let dest_dir = dest_dir.as_ref();
    let format: ArchiveFormat = format_tag.parse()?;
    let base_name = archive_base_name(source_dir)?;

    std::fs::create_dir_all(dest_dir)?;

    tracing::info!("Creating {} archive...", format);
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{base_name}."))
        .suffix(&format!(".{}", format.codec_tag()))
        .tempfile_in(dest_dir)?;
    let target_path = dest_dir.join(format!("{base_name}.{}", format.info().file_extension));

    let excluded = excluded_paths(source_dir, dest_dir, &[tmp.path(), target_path.as_path()]);
    if !excluded.is_empty() {
        tracing::debug!("Excluding {:?} from the archive", excluded);
    }
    format
        .write_archive(source_dir, &excluded, tmp.as_file_mut())
        .with_debug_object_and_fn_name(source_dir.to_path_buf(), "write_archive")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(ARCHIVE_MODE))?;
    }

    if target_path.exists() {
        tracing::info!("Removing existing archive from target path {:?}...", target_path);
        std::fs::remove_file(&target_path)?;
    }

    tracing::info!("Moving {}.{} archive to {:?}...", base_name, format.codec_tag(), dest_dir);
    tmp.persist(&target_path)?;
    Ok(target_path)
}
