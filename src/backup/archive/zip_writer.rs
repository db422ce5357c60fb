use crate::backup::archive::{ArchiveEntry, ArchiveEntryKind};
use crate::backup::result_error::result::Result;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive member names always use `/`, whatever the host separator.
fn member_name(dst: &Path) -> String {
    dst.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_options(src: &Path) -> Result<SimpleFileOptions> {
    let md = std::fs::metadata(src)?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(md.len() >= u32::MAX as u64);

    #[cfg(unix)]
    let options = {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(md.permissions().mode())
    };

    Ok(options)
}

/// Writes `entries` into a deflate compressed zip archive.
pub fn write_zip_archive<W: Write + Seek, I: IntoIterator<Item = Result<ArchiveEntry>>>(
    entries: I,
    writer: W,
) -> Result<W> {
    let mut zip = ZipWriter::new(writer);

    let mut entry_count = 0;
    for entry in entries {
        let entry = entry?;
        let name = member_name(&entry.dst);
        match entry.kind {
            ArchiveEntryKind::Dir => {
                zip.add_directory(name, SimpleFileOptions::default())?;
            }
            ArchiveEntryKind::File => {
                zip.start_file(name, file_options(&entry.src)?)?;
                std::io::copy(&mut File::open(&entry.src)?, &mut zip)?;
            }
            ArchiveEntryKind::Symlink => {
                let target = std::fs::read_link(&entry.src)?;
                zip.add_symlink(name, target.to_string_lossy(), SimpleFileOptions::default())?;
            }
        }
        tracing::trace!("Added {:?} as {:?}", entry.src, entry.dst);
        entry_count += 1;
    }
    tracing::debug!("Processed {} zip entries", entry_count);

    Ok(zip.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::archive::archive_entries;
    use std::io::{Cursor, Read};
    use tempfile::TempDir;

    #[test]
    fn test_member_name_uses_forward_slash() {
        assert_eq!(member_name(Path::new("a").join("b").join("c.txt").as_path()), "a/b/c.txt");
    }

    #[test]
    fn test_zip_contents() {
        let src = TempDir::new().unwrap();
        std::fs::create_dir_all(src.path().join("nested")).unwrap();
        std::fs::write(src.path().join("top.txt"), "top level").unwrap();
        std::fs::write(src.path().join("nested/inner.txt"), "inner").unwrap();

        let out = write_zip_archive(archive_entries(src.path(), &[]), Cursor::new(Vec::new())).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(out.into_inner())).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["nested/", "nested/inner.txt", "top.txt"]);

        let mut content = String::new();
        archive
            .by_name("nested/inner.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "inner");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_stored_not_followed() {
        let src = TempDir::new().unwrap();
        std::fs::write(src.path().join("top.txt"), "top level").unwrap();
        std::os::unix::fs::symlink(".", src.path().join("self")).unwrap();

        let out = write_zip_archive(archive_entries(src.path(), &[]), Cursor::new(Vec::new())).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(out.into_inner())).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["self", "top.txt"]);

        let mut link = archive.by_name("self").unwrap();
        assert!(link.is_symlink());
        let mut target = String::new();
        link.read_to_string(&mut target).unwrap();
        assert_eq!(target, ".");
    }

    #[test]
    fn test_entry_error_propagates() {
        let entries = vec![Err(std::io::Error::other("boom").into())];
        assert!(write_zip_archive(entries, Cursor::new(Vec::new())).is_err());
    }
}
