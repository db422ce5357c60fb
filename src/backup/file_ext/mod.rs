use std::sync::Arc;

/// Anything that contributes a dotted suffix to an archive file name.
pub trait FileExtProvider {
    fn file_ext(&self) -> Option<Arc<str>>;
}
