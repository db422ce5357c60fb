use std::fmt::{Display, Formatter};

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// Byte count rendered with binary unit scaling, e.g. `1023B`, `1.00KB`, `3.50MB`.
///
/// Sizes below one kilobyte print as a whole number of bytes; fractional
/// estimates are rounded.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct HumanSize(pub f64);

impl From<u64> for HumanSize {
    fn from(bytes: u64) -> Self {
        HumanSize(bytes as f64)
    }
}

impl From<f64> for HumanSize {
    fn from(bytes: f64) -> Self {
        HumanSize(bytes)
    }
}

impl Display for HumanSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let size = self.0;
        if size < KIB {
            write!(f, "{}B", size.round() as u64)
        } else if size < MIB {
            write!(f, "{:.2}KB", size / KIB)
        } else if size < GIB {
            write!(f, "{:.2}MB", size / MIB)
        } else {
            write!(f, "{:.2}GB", size / GIB)
        }
    }
}
