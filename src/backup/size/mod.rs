pub mod human;

use crate::backup::size::human::HumanSize;
use getset::CopyGetters;
use std::io::ErrorKind;
use std::path::Path;
use walkdir::WalkDir;

/// Counters collected by one tree walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct SizeAccumulator {
    bytes_total: u64,
    files_skipped: u64,
}

impl SizeAccumulator {
    pub fn human_size(&self) -> HumanSize {
        self.bytes_total.into()
    }

    fn add_file(&mut self, len: u64) {
        self.bytes_total += len;
    }

    fn skip_file(&mut self) {
        self.files_skipped += 1;
    }
}

/// Sums the sizes of every regular file under `path`.
///
/// Symlinks to files count with the size of their target. Symlinked
/// directories are not descended into, matching what the archive stores.
/// A file that disappears between being listed and being measured, or a
/// dangling link, is counted as skipped. Any other unreadable entry is logged
/// and skipped as well; the walk never fails.
pub fn measure<P: AsRef<Path>>(path: P) -> SizeAccumulator {
    let path = path.as_ref();
    let mut acc = SizeAccumulator::default();

    for res in WalkDir::new(path) {
        let entry = match res {
            Ok(entry) => entry,
            Err(e) => {
                record_walk_error(&mut acc, path, e);
                continue;
            }
        };

        if entry.file_type().is_file() {
            match entry.metadata() {
                Ok(md) => {
                    tracing::trace!("{:?}: {} bytes", entry.path(), md.len());
                    acc.add_file(md.len())
                }
                Err(e) => record_walk_error(&mut acc, path, e),
            }
        } else if entry.path_is_symlink() {
            match std::fs::metadata(entry.path()) {
                Ok(md) if md.is_file() => {
                    tracing::trace!("{:?} (link): {} bytes", entry.path(), md.len());
                    acc.add_file(md.len())
                }
                Ok(_) => tracing::trace!("Not descending into linked {:?}", entry.path()),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("Skipping dangling link {:?}", entry.path());
                    acc.skip_file();
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable link {:?}: {e}", entry.path());
                    acc.skip_file();
                }
            }
        }
    }

    tracing::debug!(
        "Measured {:?}: {} bytes, {} skipped",
        path,
        acc.bytes_total,
        acc.files_skipped
    );
    acc
}

fn record_walk_error(acc: &mut SizeAccumulator, root: &Path, e: walkdir::Error) {
    let vanished = e.io_error().map(|io| io.kind()) == Some(ErrorKind::NotFound);
    if vanished && e.depth() == 0 {
        tracing::warn!("{:?} does not exist", root);
    } else if vanished {
        tracing::debug!("Skipping vanished file {:?}", e.path());
        acc.skip_file();
    } else {
        tracing::warn!("Skipping unreadable entry: {e}");
        acc.skip_file();
    }
}
