#![forbid(unsafe_code)]

use clap::Parser;
use seqstore::cli::Cli;
use seqstore::config::StoreConfig;
use seqstore::errors::StoreError;
use seqstore::mapreduce::set_timeout;

fn main() {
    let _ = seqstore::logger::init();
    let cli = Cli::parse();

    let config = StoreConfig::load(&cli.config).unwrap_or_else(|err| {
        eprintln!("WARNING: failed to parse {}: {err}, using defaults", cli.config.display());
        StoreConfig::default()
    });
    set_timeout(config.map_timeout_ms);

    let mut exit_code = 0i32;
    for path in &cli.paths {
        if let Err(err) = seqstore::cli::run(path, &config) {
            eprintln!("ERROR: {err}");
            exit_code = error_code(&err);
            break;
        }
    }
    std::process::exit(exit_code);
}

fn error_code(err: &StoreError) -> i32 {
    err.as_code()
}
