use super::wait::{wait_for_result, JobOutcome};
use super::{displayed, BaseCommand, Command};
use crate::actor::ActorError;
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct UpgradeServiceCommand {
    /// Name of the service instance
    #[arg(value_name = "SERVICE_INSTANCE")]
    pub service_instance: String,

    /// Force upgrade without asking for confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Wait for the operation to complete
    #[arg(short, long)]
    pub wait: bool,
}

impl UpgradeServiceCommand {
    fn confirmed(&self, base: &BaseCommand<'_>) -> Result<bool> {
        if self.force {
            return Ok(true);
        }
        base.ui.display_text(
            "Warning: This operation may be long running and will block further operations on the service instance until it's completed"
                .into(),
        );
        let prompt = Message::new("Do you really want to upgrade the service instance {{ name }}?")
            .arg("name", &self.service_instance);
        super::confirm(base.ui, false, prompt, "Upgrade cancelled")
    }
}

impl Command for UpgradeServiceCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;

        if !self.confirmed(base)? {
            return Ok(());
        }

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        let space = base.config.targeted_space();
        base.ui.display_text_with_flavor(
            Message::new(
                "Upgrading service instance {{ name }} in org {{ org }} / space {{ space }} as {{ user }}...",
            )
            .arg("name", &self.service_instance)
            .arg("org", &org.name)
            .arg("space", &space.name)
            .arg("user", &user.name),
        );
        base.ui.display_newline();

        let reply = base
            .actor
            .upgrade_managed_service_instance(&self.service_instance, &space.guid);
        let stream = match displayed(base.ui, reply.into_parts()) {
            Ok(stream) => stream,
            Err(ActorError::UpgradeNotAvailable) => {
                base.ui.display_text("No upgrade is available.".into());
                base.ui.display_ok();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let outcome = wait_for_result(base.ui, stream, self.wait, base.config.polling_timeout())?;
        match outcome {
            JobOutcome::Completed => base.ui.display_text(
                Message::new("Upgrade of service instance {{ name }} complete.")
                    .arg("name", &self.service_instance),
            ),
            JobOutcome::InProgress => base.ui.display_text(
                Message::new(
                    "Upgrade in progress. Use '{{ bin }} services' or '{{ bin }} service {{ name }}' to check operation status.",
                )
                .arg("bin", base.config.binary_name())
                .arg("name", &self.service_instance),
            ),
        }
        base.ui.display_ok();
        Ok(())
    }
}
