use super::{confirm, displayed, BaseCommand, Command};
use crate::actor::ActorError;
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

const PURGE_WARNING: &str = "WARNING: This operation assumes that the service broker responsible for this service offering is no longer available, and all service instances have been deleted, leaving orphan records in the platform's database. All knowledge of the service offering will be removed, including service instances and service bindings. No attempt will be made to contact the service broker; running this command without destroying the service broker will cause orphan service instances. After running this command you may want to run delete-service-broker to complete the cleanup.";

#[derive(Args, Debug, Clone, Default)]
pub struct DeleteServiceBrokerCommand {
    /// Name of the service broker
    #[arg(value_name = "SERVICE_BROKER")]
    pub service_broker: String,

    /// Force deletion without confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl Command for DeleteServiceBrokerCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(false, false)?;

        let prompt = Message::new("Really delete the service broker {{ broker }}?")
            .arg("broker", &self.service_broker);
        if !confirm(base.ui, self.force, prompt, "Delete cancelled")? {
            return Ok(());
        }

        let user = base.actor.get_current_user()?;
        base.ui.display_text_with_flavor(
            Message::new("Deleting service broker {{ broker }} as {{ user }}...")
                .arg("broker", &self.service_broker)
                .arg("user", &user.name),
        );

        let reply = base.actor.get_service_broker_by_name(&self.service_broker);
        let broker = match displayed(base.ui, reply.into_parts()) {
            Ok(broker) => broker,
            Err(ActorError::ServiceBrokerNotFound { .. }) => {
                base.ui.display_warning(
                    Message::new("Service broker '{{ broker }}' does not exist.")
                        .arg("broker", &self.service_broker),
                );
                base.ui.display_ok();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        displayed(base.ui, base.actor.delete_service_broker(&broker.guid).into_parts())?;
        base.ui.display_ok();
        Ok(())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct PurgeServiceOfferingCommand {
    /// Name of the service offering
    #[arg(value_name = "SERVICE")]
    pub service_offering: String,

    /// Purge a service offering from a particular service broker
    #[arg(short = 'b', value_name = "BROKER")]
    pub broker: Option<String>,

    /// Force deletion without confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl PurgeServiceOfferingCommand {
    fn prompt(&self) -> Message {
        match &self.broker {
            Some(broker) => Message::new(
                "Really purge service offering {{ offering }} from broker {{ broker }}?",
            )
            .arg("offering", &self.service_offering)
            .arg("broker", broker),
            None => Message::new("Really purge service offering {{ offering }}?")
                .arg("offering", &self.service_offering),
        }
    }
}

impl Command for PurgeServiceOfferingCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(false, false)?;

        if !self.force {
            base.ui.display_warning(PURGE_WARNING.into());
            base.ui.display_newline();
        }
        if !confirm(base.ui, self.force, self.prompt(), "Purge service offering cancelled")? {
            return Ok(());
        }

        base.ui.display_text_with_flavor(
            Message::new("Purging service offering {{ offering }}...")
                .arg("offering", &self.service_offering),
        );

        let reply = base
            .actor
            .purge_service_offering_by_name_and_broker(&self.service_offering, self.broker.as_deref());
        match displayed(base.ui, reply.into_parts()) {
            Ok(()) => {}
            Err(ActorError::ServiceOfferingNotFound { .. }) => {
                base.ui.display_text(
                    Message::new("Service offering '{{ offering }}' not found.")
                        .arg("offering", &self.service_offering),
                );
            }
            Err(err) => return Err(err.into()),
        }
        base.ui.display_ok();
        Ok(())
    }
}
