//! # config-backup
//!
//! A declarative backup tool: every configured directory is archived into
//! the backup directory, and optional output jobs capture command output next
//! to the archives.
//!
//! ## Features
//!
//! - **Formats**: zip, tar, gzip-tar and bzip2-tar archives
//! - **Hooks**: shell commands before and after each location
//! - **Outputs**: raw stdout of shell commands kept as `output-<name>.txt`
//! - **Preview**: size estimation without writing anything
//!
//! ## Quick Start
//!
//! ```no_run
//! use config_backup::backup::backup_config::BackupConfig;
//!
//! // Load and validate configuration from a YAML file
//! let config = BackupConfig::load("config.yaml")?;
//!
//! // Run every location, then the outputs batch
//! let report = config.run_backup();
//! println!("{report}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
