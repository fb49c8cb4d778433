//! Command-line arguments

use clap::Parser;
use core_runtime::logging::{LogFormat, LogLevel};
use std::path::PathBuf;

/// Copy photos and videos from a Google Drive folder tree into Google Photos,
/// creating one album per folder.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Name of the top-level Drive folder to copy (prompted when omitted)
    #[arg(short, long, value_name = "NAME")]
    pub root_folder: Option<String>,

    /// Skip videos longer than this many seconds
    #[arg(short, long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_video_seconds: Option<u64>,

    /// OAuth client secrets downloaded from the Google Cloud console
    #[arg(short, long = "credentials", value_name = "PATH", default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Where the OAuth token is cached between runs
    #[arg(short, long = "token", value_name = "PATH", default_value = "token.json")]
    pub token: PathBuf,

    /// Scratch directory for downloads [default: <cache dir>/drive-to-photos/downloads]
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Append skipped and failed files to this log
    #[arg(long, value_name = "PATH")]
    pub missed_log: Option<PathBuf>,

    /// Log output format: pretty, json or compact
    #[arg(long, value_name = "FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Minimum log level: trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}
