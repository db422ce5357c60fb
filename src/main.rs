use clap::Parser;
use config_backup::backup::backup_config::BackupConfig;
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, warn, Level};

/// Back up directories and command output into a single backup directory
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Location of config file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(flatten)]
    mode: ModeArgs,

    /// Log per-file and per-command details
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args, Debug)]
#[group(multiple = false)]
struct ModeArgs {
    /// Show the config file and exit
    #[arg(long)]
    show_config: bool,

    /// Estimate the size of the backup and exit
    #[arg(short, long)]
    preview: bool,

    /// Calculate the size of the backup directory and exit
    #[arg(long)]
    size: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    ShowConfig,
    Preview,
    Size,
    Backup,
}

impl ModeArgs {
    fn run_mode(&self) -> RunMode {
        if self.show_config {
            RunMode::ShowConfig
        } else if self.preview {
            RunMode::Preview
        } else if self.size {
            RunMode::Size
        } else {
            RunMode::Backup
        }
    }
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let config = match BackupConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            exit(1);
        }
    };

    match args.mode.run_mode() {
        RunMode::ShowConfig => match config.to_yaml() {
            Ok(yaml) => print!("{yaml}"),
            Err(e) => {
                error!("{e}");
                exit(1);
            }
        },
        RunMode::Preview => println!("{}", config.preview()),
        RunMode::Size => println!(
            "Backup total size is {}.",
            config.backup_size().human_size()
        ),
        RunMode::Backup => {
            let report = config.run_backup();
            println!("{report}");
            if let Err(e) = report.into_result() {
                warn!("Backup finished with errors:\n{e}");
            }
        }
    }
}
