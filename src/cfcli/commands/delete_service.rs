use super::wait::{wait_for_result, JobOutcome};
use super::{confirm, displayed, BaseCommand, Command};
use crate::actor::ActorError;
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct DeleteServiceCommand {
    /// Name of the service instance
    #[arg(value_name = "SERVICE_INSTANCE")]
    pub service_instance: String,

    /// Force deletion without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Wait for the operation to complete
    #[arg(short, long)]
    pub wait: bool,
}

impl Command for DeleteServiceCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;

        let prompt = Message::new("Really delete the service instance {{ name }}?")
            .arg("name", &self.service_instance);
        if !confirm(base.ui, self.force, prompt, "Delete cancelled")? {
            return Ok(());
        }

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        let space = base.config.targeted_space();
        base.ui.display_text_with_flavor(
            Message::new(
                "Deleting service instance {{ name }} in org {{ org }} / space {{ space }} as {{ user }}...",
            )
            .arg("name", &self.service_instance)
            .arg("org", &org.name)
            .arg("space", &space.name)
            .arg("user", &user.name),
        );

        let reply = base
            .actor
            .delete_service_instance(&self.service_instance, &space.guid);
        let stream = match displayed(base.ui, reply.into_parts()) {
            Ok(stream) => stream,
            Err(ActorError::ServiceInstanceNotFound { .. }) => {
                base.ui.display_newline();
                base.ui.display_text(
                    Message::new("Service instance {{ name }} did not exist.")
                        .arg("name", &self.service_instance),
                );
                base.ui.display_ok();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let outcome = wait_for_result(base.ui, stream, self.wait, base.config.polling_timeout())?;

        base.ui.display_newline();
        match outcome {
            JobOutcome::Completed => base.ui.display_text(
                Message::new("Service instance {{ name }} deleted.")
                    .arg("name", &self.service_instance),
            ),
            JobOutcome::InProgress => base.ui.display_text(
                Message::new(
                    "Delete in progress. Use '{{ bin }} services' or '{{ bin }} service {{ name }}' to check operation status.",
                )
                .arg("bin", base.config.binary_name())
                .arg("name", &self.service_instance),
            ),
        }
        base.ui.display_ok();
        Ok(())
    }
}
