//! Diagnostic CLI: a thin clap front-end over [`runner::run`].

pub mod command;
pub mod runner;

pub use command::Cli;
pub use runner::{run, size_str};
