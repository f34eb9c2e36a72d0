//! CLI commands.
//!
//! Everything except plain service startup is a thin client against the
//! local REST API, so the commands work whether or not this process is the
//! one doing the monitoring.

pub mod args;
pub mod client;

pub use args::{Cli, CliCommand};
pub use client::{handle_recordings_command, handle_status_command};
