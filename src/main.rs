//! trustgate CLI entry point
//!
//! main.rs only hands over to `cli::run` and turns its status into the
//! process exit code. Argument parsing, logging setup and error reporting
//! all live in the CLI module.

use std::process::ExitCode;

use trustgate::cli;

fn main() -> ExitCode {
    ExitCode::from(cli::run())
}
