use super::wait::{wait_for_result, JobOutcome};
use super::{displayed, parse_json_flag, BaseCommand, Command};
use crate::actor::{ActorError, CreateBindingParams};
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct BindServiceCommand {
    /// Name of the app
    #[arg(value_name = "APP_NAME")]
    pub app: String,

    /// Name of the service instance
    #[arg(value_name = "SERVICE_INSTANCE")]
    pub service_instance: String,

    /// Name to expose service instance to app process with
    #[arg(long = "binding-name", value_name = "BINDING_NAME")]
    pub binding_name: Option<String>,

    /// Valid JSON object containing service-specific configuration parameters, provided inline or in a file
    #[arg(short = 'c', value_name = "JSON")]
    pub parameters: Option<String>,

    /// Wait for the operation to complete
    #[arg(short, long)]
    pub wait: bool,
}

impl Command for BindServiceCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;
        let parameters = parse_json_flag(self.parameters.as_deref())?;

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        let space = base.config.targeted_space();
        base.ui.display_text_with_flavor(
            Message::new(
                "Binding service instance {{ instance }} to app {{ app }} in org {{ org }} / space {{ space }} as {{ user }}...",
            )
            .arg("instance", &self.service_instance)
            .arg("app", &self.app)
            .arg("org", &org.name)
            .arg("space", &space.name)
            .arg("user", &user.name),
        );

        let params = CreateBindingParams {
            app_name: self.app.clone(),
            instance_name: self.service_instance.clone(),
            binding_name: self.binding_name.clone(),
            space_guid: space.guid,
            parameters,
        };
        let reply = base.actor.create_service_app_binding(&params);
        let stream = match displayed(base.ui, reply.into_parts()) {
            Ok(stream) => stream,
            Err(ActorError::ResourceAlreadyExists(_)) => {
                base.ui.display_text(
                    Message::new("App {{ app }} is already bound to service instance {{ instance }}.")
                        .arg("app", &self.app)
                        .arg("instance", &self.service_instance),
                );
                base.ui.display_ok();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let outcome = wait_for_result(base.ui, stream, self.wait, base.config.polling_timeout())?;
        base.ui.display_ok();
        base.ui.display_newline();
        match outcome {
            JobOutcome::Completed => base.ui.display_text(
                Message::new("TIP: Use '{{ bin }} restage {{ app }}' to ensure your env variable changes take effect")
                    .arg("bin", base.config.binary_name())
                    .arg("app", &self.app),
            ),
            JobOutcome::InProgress => base.ui.display_text(
                Message::new(
                    "Binding in progress. Use '{{ bin }} service {{ instance }}' to check operation status.",
                )
                .arg("bin", base.config.binary_name())
                .arg("instance", &self.service_instance),
            ),
        }
        Ok(())
    }
}
