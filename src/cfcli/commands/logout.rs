use super::{BaseCommand, Command};
use crate::error::Result;
use crate::ui::Message;
use clap::Args;
use tracing::debug;

#[derive(Args, Debug, Clone, Default)]
pub struct LogoutCommand {}

impl Command for LogoutCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        let user = base.config.current_user().unwrap_or_default();
        base.ui
            .display_text_with_flavor(Message::new("Logging out {{ user }}...").arg("user", user));
        let token = base.config.access_token();
        if !token.is_empty() {
            if let Err(err) = base.actor.revoke_session(&token) {
                debug!(error = %err, "could not revoke session");
            }
        }
        base.config.unset_user_information();
        base.ui.display_ok();
        Ok(())
    }
}
