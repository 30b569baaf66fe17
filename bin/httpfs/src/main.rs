//! httpfs CLI - mount a remote HTTP(S) directory tree as a read-only
//! filesystem.
//!
//! The server must emit a JSON autoindex for directories and honor
//! byte-range GET requests on files.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use httpfs_fs::{mount, FsConfig, MountConfig};

/// Read-only FUSE mount backed by an HTTP(S) autoindex server.
#[derive(Parser)]
#[command(name = "httpfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// URL of the HTTP(s) server
    #[arg(long)]
    url: Option<String>,

    /// Metadata cache TTL (seconds)
    #[arg(long = "meta-cache-ttl", default_value_t = 60)]
    meta_cache_ttl: u64,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Allow other users to access the mount
    #[arg(long)]
    allow_other: bool,

    /// Unmount automatically when the process exits
    #[arg(long)]
    auto_unmount: bool,

    /// Where to mount the filesystem
    mountpoint: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) if error.use_stderr() => {
            let _ = error.print();
            return ExitCode::from(1);
        }
        Err(help) => {
            let _ = help.print();
            return ExitCode::SUCCESS;
        }
    };

    let Some(url) = cli.url.clone() else {
        eprintln!("`url` is a required argument to mount a filesystem!");
        return ExitCode::from(1);
    };

    match run(cli, url) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("httpfs: {:#}", error);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli, url: String) -> Result<()> {
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;

    let config = FsConfig {
        url,
        meta_cache_ttl: cli.meta_cache_ttl,
        client: Default::default(),
    };
    let options = MountConfig {
        allow_other: cli.allow_other,
        auto_unmount: cli.auto_unmount,
    };

    mount(config, &cli.mountpoint, options).context("Mount failed")
}
