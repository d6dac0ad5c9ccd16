use super::wait::{wait_for_result, JobOutcome};
use super::{displayed, parse_json_flag, BaseCommand, Command};
use crate::actor::{ActorError, CreateServiceInstanceParams};
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct CreateServiceCommand {
    /// Service offering
    #[arg(value_name = "SERVICE_OFFERING")]
    pub service_offering: String,

    /// Service plan
    #[arg(value_name = "SERVICE_PLAN")]
    pub service_plan: String,

    /// Name of the new service instance
    #[arg(value_name = "SERVICE_INSTANCE")]
    pub service_instance: String,

    /// Create a service instance from a particular broker
    #[arg(short = 'b', long = "broker", value_name = "BROKER")]
    pub broker: Option<String>,

    /// Valid JSON object containing service-specific configuration parameters, provided inline or in a file
    #[arg(short = 'c', value_name = "JSON")]
    pub parameters: Option<String>,

    /// Wait for the operation to complete
    #[arg(short, long)]
    pub wait: bool,
}

impl Command for CreateServiceCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;
        let parameters = parse_json_flag(self.parameters.as_deref())?;

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        let space = base.config.targeted_space();
        base.ui.display_text_with_flavor(
            Message::new(
                "Creating service instance {{ name }} in org {{ org }} / space {{ space }} as {{ user }}...",
            )
            .arg("name", &self.service_instance)
            .arg("org", &org.name)
            .arg("space", &space.name)
            .arg("user", &user.name),
        );

        let params = CreateServiceInstanceParams {
            offering_name: self.service_offering.clone(),
            plan_name: self.service_plan.clone(),
            broker_name: self.broker.clone(),
            instance_name: self.service_instance.clone(),
            space_guid: space.guid,
            parameters,
        };
        let reply = base.actor.create_managed_service_instance(&params);
        let stream = match displayed(base.ui, reply.into_parts()) {
            Ok(stream) => stream,
            Err(ActorError::ResourceAlreadyExists(_)) => {
                base.ui.display_newline();
                base.ui.display_text(
                    Message::new("Service instance {{ name }} already exists")
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
                Message::new("Service instance {{ name }} created.")
                    .arg("name", &self.service_instance),
            ),
            JobOutcome::InProgress => base.ui.display_text(
                Message::new(
                    "Create in progress. Use '{{ bin }} services' or '{{ bin }} service {{ name }}' to check operation status.",
                )
                .arg("bin", base.config.binary_name())
                .arg("name", &self.service_instance),
            ),
        }
        base.ui.display_ok();
        Ok(())
    }
}
