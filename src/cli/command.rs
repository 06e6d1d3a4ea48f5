use std::path::PathBuf;

use clap::Parser;

/// Prints on-disk diagnostic information for one or more store files:
/// disk version, update sequence, document counts, data size, B+-tree
/// size, and total file size.
#[derive(Debug, Parser)]
#[command(name = "seqstore-info", about = "Print diagnostic info for a seqstore file")]
pub struct Cli {
    /// Store files to inspect, in order.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Path to a TOML config file (chunk split threshold, default map
    /// timeout). Defaults to `seqstore.toml` in the current directory;
    /// missing files fall back to built-in defaults.
    #[arg(long, default_value = "seqstore.toml")]
    pub config: PathBuf,
}
