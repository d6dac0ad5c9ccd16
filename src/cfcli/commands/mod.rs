//! # Command Layer
//!
//! One struct per verb. Each struct holds the parsed arguments for its verb
//! (derived with `clap::Args`) and implements [`Command`], whose `execute`
//! receives a [`BaseCommand`] carrying the four collaborators every command
//! uses:
//!
//! - [`Ui`]: all output and prompts
//! - [`Config`]: login and target state
//! - [`SharedActor`]: login/target precondition checks
//! - [`Actor`]: the platform operations themselves
//!
//! ## Shape of a Command
//!
//! ```text
//! check_target ──► get_current_user ──► "Doing X as USER..."
//!                                            │
//!                                     actor call (result + warnings)
//!                                            │
//!                        display warnings ◄──┤
//!                                            ├─ sentinel error ──► message + OK
//!                                            ├─ other error ─────► return Err (no OK)
//!                                            └─ Ok(stream) ──► wait::wait_for_result ──► OK
//! ```
//!
//! Precondition failures are returned untouched. Warnings are always shown
//! before the result is inspected, so they reach the user even when the call
//! fails. "Sentinel" errors are the ones that mean the user's intent already
//! holds (deleting something that is gone, creating something that exists);
//! each command picks its own with a `match` on [`ActorError`].
//!
//! ## Destructive Commands
//!
//! Commands that destroy state ask for confirmation unless `-f` is given (see
//! [`confirm`]). Declining prints a cancellation message and succeeds.
//!
//! ## Testing
//!
//! Command tests run against `test_utils::TestEnv`: scripted fake actors, an
//! in-memory config, and captured stdout/stderr.

use crate::actor::{Actor, ActorError, SharedActor};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::ui::{Message, Ui};
use serde_json::Value;
use std::path::Path;

pub mod api;
pub mod apps;
pub mod auth;
pub mod bind_service;
pub mod create_service;
pub mod delete_service;
pub mod logout;
pub mod orgs;
pub mod service_broker;
pub mod service_key;
pub mod services;
pub mod share_service;
pub mod spaces;
pub mod target;
pub mod unbind_service;
pub mod upgrade_service;
pub mod wait;

/// Collaborators handed to every command.
#[derive(Clone, Copy)]
pub struct BaseCommand<'a> {
    pub ui: &'a dyn Ui,
    pub config: &'a dyn Config,
    pub shared_actor: &'a dyn SharedActor,
    pub actor: &'a dyn Actor,
}

pub trait Command {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()>;
}

/// Asks `prompt` unless `force` is set. Prints `cancelled` and returns
/// `false` when the user declines.
pub fn confirm(ui: &dyn Ui, force: bool, prompt: Message, cancelled: &str) -> Result<bool> {
    if force {
        return Ok(true);
    }
    if ui.display_bool_prompt(false, prompt)? {
        Ok(true)
    } else {
        ui.display_text(cancelled.into());
        Ok(false)
    }
}

/// Interprets a `-c` value: an inline JSON object, or the path of a file
/// containing one.
pub fn parse_json_flag(raw: Option<&str>) -> Result<Option<Value>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let path = Path::new(raw);
    let text = if path.is_file() {
        std::fs::read_to_string(path)?
    } else {
        raw.to_string()
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(value @ Value::Object(_)) => Ok(Some(value)),
        _ => Err(CliError::InvalidJson),
    }
}

/// Shows the warnings of an actor reply and hands back its result.
pub(crate) fn displayed<T>(
    ui: &dyn Ui,
    (result, warnings): (std::result::Result<T, ActorError>, Vec<String>),
) -> std::result::Result<T, ActorError> {
    ui.display_warnings(&warnings);
    result
}
