//! # CLI Wiring
//!
//! The only place that knows about process arguments and exit codes.
//!
//! - `setup`: clap definitions, command groups, and help rendering
//! - `commands`: builds the collaborators and dispatches to a command

mod commands;
pub mod setup;

pub use commands::run;
