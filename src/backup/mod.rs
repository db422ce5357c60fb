pub mod archive;
pub mod backup_config;
pub mod command;
pub mod compress;
pub mod file_ext;
pub mod finish;
pub mod format;
pub mod location;
pub mod output;
pub mod preview;
pub mod result_error;
pub mod run;
pub mod size;
pub mod validate;
