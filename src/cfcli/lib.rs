//! # cfcli Architecture
//!
//! `cfcli` is the command layer of a Cloud Foundry style client: the code that
//! turns a parsed verb (`cf create-service`, `cf target -o ORG`) into checks,
//! platform calls, and terminal output. The `cf` binary is a thin wrapper that
//! parses arguments and hands a command its collaborators.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (src/cfcli/cli/, binary only)                          │
//! │  - clap parsing, grouped help, wiring, exit codes           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/)                                       │
//! │  - one struct per verb, `Command::execute(&BaseCommand)`    │
//! │  - all user-facing text goes through `Ui`                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Actors (actor/)                                            │
//! │  - `Actor`: platform operations returning result + warnings │
//! │  - `SharedActor`: login/target preconditions                │
//! │  - `JobStream`: progress of long-running operations         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Sandbox platform (actor/sandbox.rs, actor/platform.rs)     │
//! │  - local JSON-backed control plane with background jobs     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands never print directly and never exit the process. Everything they
//! need arrives through [`commands::BaseCommand`], which is what makes them
//! testable against the fakes in `test_utils`.
//!
//! ## Supporting Modules
//!
//! - [`config`]: persisted login and target state (`$CF_HOME/.cf/config.json`)
//! - [`ui`]: output, prompts, tables, and message templating
//! - [`i18n`]: optional message catalogs
//! - [`error`]: the command-level error type
//! - [`logging`]: `tracing` setup for diagnostics

pub mod actor;
pub mod commands;
pub mod config;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod ui;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
