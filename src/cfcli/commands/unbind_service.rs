use super::wait::{wait_for_result, JobOutcome};
use super::{displayed, BaseCommand, Command};
use crate::actor::{ActorError, ListBindingParams};
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct UnbindServiceCommand {
    /// Name of the app
    #[arg(value_name = "APP_NAME")]
    pub app: String,

    /// Name of the service instance
    #[arg(value_name = "SERVICE_INSTANCE")]
    pub service_instance: String,

    /// Wait for the operation to complete
    #[arg(short, long)]
    pub wait: bool,
}

impl Command for UnbindServiceCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        let space = base.config.targeted_space();
        base.ui.display_text_with_flavor(
            Message::new(
                "Unbinding app {{ app }} from service {{ instance }} in org {{ org }} / space {{ space }} as {{ user }}...",
            )
            .arg("app", &self.app)
            .arg("instance", &self.service_instance)
            .arg("org", &org.name)
            .arg("space", &space.name)
            .arg("user", &user.name),
        );

        let params = ListBindingParams {
            app_name: self.app.clone(),
            instance_name: self.service_instance.clone(),
            space_guid: space.guid,
        };
        let bindings = match displayed(base.ui, base.actor.list_service_app_bindings(&params).into_parts()) {
            Ok(bindings) => bindings,
            Err(ActorError::ServiceBindingNotFound { .. }) => {
                base.ui.display_text(
                    Message::new("Binding between {{ instance }} and {{ app }} does not exist")
                        .arg("instance", &self.service_instance)
                        .arg("app", &self.app),
                );
                base.ui.display_ok();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        for binding in bindings {
            base.ui.display_text(
                Message::new("Deleting service binding {{ guid }}...").arg("guid", &binding.guid),
            );
            let reply = base.actor.delete_service_app_binding(&binding.guid);
            let stream = displayed(base.ui, reply.into_parts())?;

            let outcome =
                wait_for_result(base.ui, stream, self.wait, base.config.polling_timeout())?;
            if self.wait {
                base.ui.display_newline();
            }
            base.ui.display_ok();

            if outcome == JobOutcome::InProgress {
                base.ui.display_newline();
                base.ui.display_text(
                    Message::new(
                        "Unbinding in progress. Use '{{ bin }} service {{ instance }}' to check operation status.",
                    )
                    .arg("bin", base.config.binary_name())
                    .arg("instance", &self.service_instance),
                );
            }
        }
        Ok(())
    }
}
