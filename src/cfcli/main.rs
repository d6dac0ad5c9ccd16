//! # The `cf` Binary
//!
//! The binary is intentionally thin: argument parsing, wiring, and exit codes
//! live in `cli/`, and this file only invokes `cli::run()`.
//!
//! ## Environment
//!
//! - `CF_HOME`: directory holding `.cf/` (defaults to the home directory)
//! - `CF_COLOR`: `true`/`false` to force styling on or off
//! - `CF_LOG`: `tracing` filter for diagnostics on stderr
//! - `CF_USERNAME`, `CF_PASSWORD`: credentials for `cf auth`
//!
//! State lives in `$CF_HOME/.cf/`: `config.json` for login and target
//! information, `sandbox.json` for the local platform, and optional message
//! catalogs under `i18n/`.

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
