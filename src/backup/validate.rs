//! Validation functions for configuration values.
//!
//! These run before any backup work starts and must not touch the
//! filesystem beyond reading metadata.

use validator::ValidationError;

use std::path::Path;

pub fn validate_non_empty_path<P: AsRef<Path>>(path: P) -> Result<(), ValidationError> {
    if path.as_ref().as_os_str().is_empty() {
        return Err(ValidationError::new("EmptyPath").with_message("path must not be empty".into()));
    }

    Ok(())
}

/// Accepts an existing directory or a path that does not exist yet.
pub fn validate_dir_or_absent<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    validate_non_empty_path(dir)?;
    if dir.exists() && !dir.is_dir() {
        return Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("{:?} is not a directory", dir).into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_non_empty_path() {
        assert!(validate_non_empty_path("").is_err());
        assert!(validate_non_empty_path("/data").is_ok());
    }

    #[test]
    fn test_dir_or_absent() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, "x").unwrap();

        assert!(validate_dir_or_absent(temp_dir.path()).is_ok());
        assert!(validate_dir_or_absent(temp_dir.path().join("later")).is_ok());
        assert!(validate_dir_or_absent(&file).is_err());
        assert!(validate_dir_or_absent("").is_err());
    }
}
