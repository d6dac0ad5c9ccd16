use super::wait::{wait_for_result, JobOutcome};
use super::{confirm, displayed, parse_json_flag, BaseCommand, Command};
use crate::actor::{ActorError, CreateServiceKeyParams};
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct CreateServiceKeyCommand {
    /// Name of the service instance
    #[arg(value_name = "SERVICE_INSTANCE")]
    pub service_instance: String,

    /// Name of the new service key
    #[arg(value_name = "SERVICE_KEY")]
    pub service_key: String,

    /// Valid JSON object containing service-specific configuration parameters, provided inline or in a file
    #[arg(short = 'c', value_name = "JSON")]
    pub parameters: Option<String>,

    /// Wait for the operation to complete
    #[arg(short, long)]
    pub wait: bool,
}

impl Command for CreateServiceKeyCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;
        let parameters = parse_json_flag(self.parameters.as_deref())?;

        let user = base.actor.get_current_user()?;
        base.ui.display_text_with_flavor(
            Message::new(
                "Creating service key {{ key }} for service instance {{ instance }} as {{ user }}...",
            )
            .arg("key", &self.service_key)
            .arg("instance", &self.service_instance)
            .arg("user", &user.name),
        );

        let params = CreateServiceKeyParams {
            instance_name: self.service_instance.clone(),
            key_name: self.service_key.clone(),
            space_guid: base.config.targeted_space().guid,
            parameters,
        };
        let stream = match displayed(base.ui, base.actor.create_service_key(&params).into_parts()) {
            Ok(stream) => stream,
            Err(ActorError::ResourceAlreadyExists(_)) => {
                base.ui.display_newline();
                base.ui.display_warning(
                    Message::new("Service key {{ key }} already exists")
                        .arg("key", &self.service_key),
                );
                base.ui.display_ok();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let outcome = wait_for_result(base.ui, stream, self.wait, base.config.polling_timeout())?;
        base.ui.display_ok();
        if outcome == JobOutcome::InProgress {
            base.ui.display_newline();
            base.ui.display_text("Create in progress.".into());
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeleteServiceKeyCommand {
    /// Name of the service instance
    #[arg(value_name = "SERVICE_INSTANCE")]
    pub service_instance: String,

    /// Name of the service key
    #[arg(value_name = "SERVICE_KEY")]
    pub service_key: String,

    /// Force deletion without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Wait for the operation to complete
    #[arg(short, long)]
    pub wait: bool,
}

impl Command for DeleteServiceKeyCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;

        let prompt = Message::new("Really delete the service key {{ key }}?")
            .arg("key", &self.service_key);
        if !confirm(base.ui, self.force, prompt, "Delete cancelled")? {
            return Ok(());
        }

        let user = base.actor.get_current_user()?;
        base.ui.display_text_with_flavor(
            Message::new("Deleting key {{ key }} for service instance {{ instance }} as {{ user }}...")
                .arg("key", &self.service_key)
                .arg("instance", &self.service_instance)
                .arg("user", &user.name),
        );

        let reply = base.actor.delete_service_key_by_service_instance_and_name(
            &self.service_instance,
            &self.service_key,
            &base.config.targeted_space().guid,
        );
        let stream = match displayed(base.ui, reply.into_parts()) {
            Ok(stream) => stream,
            Err(ActorError::ServiceKeyNotFound { .. }) => {
                base.ui.display_newline();
                base.ui.display_text(
                    Message::new(
                        "Service key {{ key }} does not exist for service instance {{ instance }}.",
                    )
                    .arg("key", &self.service_key)
                    .arg("instance", &self.service_instance),
                );
                base.ui.display_ok();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let outcome = wait_for_result(base.ui, stream, self.wait, base.config.polling_timeout())?;
        base.ui.display_ok();
        if outcome == JobOutcome::InProgress {
            base.ui.display_newline();
            base.ui.display_text("Delete in progress.".into());
        }
        Ok(())
    }
}
