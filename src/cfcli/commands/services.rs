use super::{displayed, BaseCommand, Command};
use crate::actor::model::{ServiceInstanceDetails, ServiceInstanceSummary};
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

fn yes_no(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_string()
}

fn bound_app_names(summary: &ServiceInstanceSummary) -> String {
    summary
        .bound_apps
        .iter()
        .map(|b| b.app_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn instance_row(summary: &ServiceInstanceSummary) -> Vec<String> {
    let instance = &summary.instance;
    vec![
        instance.name.clone(),
        instance.offering_name.clone(),
        instance.plan_name.clone(),
        bound_app_names(summary),
        instance.last_operation.status(),
        summary.broker_name.clone(),
        yes_no(summary.upgrade_available),
    ]
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServicesCommand {}

impl Command for ServicesCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        let space = base.config.targeted_space();
        base.ui.display_text_with_flavor(
            Message::new("Getting services in org {{ org }} / space {{ space }} as {{ user }}...")
                .arg("org", &org.name)
                .arg("space", &space.name)
                .arg("user", &user.name),
        );
        base.ui.display_newline();

        let reply = base.actor.get_service_instances_for_space(&space.guid);
        let summaries = displayed(base.ui, reply.into_parts())?;

        if summaries.is_empty() {
            base.ui.display_text("No services found".into());
            return Ok(());
        }

        let mut rows = vec![vec![
            "name".to_string(),
            "offering".to_string(),
            "plan".to_string(),
            "bound apps".to_string(),
            "last operation".to_string(),
            "broker".to_string(),
            "upgrade available".to_string(),
        ]];
        rows.extend(summaries.iter().map(instance_row));
        base.ui.display_table_with_header("", rows, 3);
        Ok(())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServiceCommand {
    /// Name of the service instance
    #[arg(value_name = "SERVICE_INSTANCE")]
    pub service_instance: String,

    /// Retrieve and display the given service instance's guid. All other output for the service instance is suppressed.
    #[arg(long)]
    pub guid: bool,
}

impl ServiceCommand {
    fn display_bound_apps(&self, base: &BaseCommand<'_>, summary: &ServiceInstanceSummary) {
        base.ui.display_text("Showing bound apps:".into());
        if summary.bound_apps.is_empty() {
            base.ui
                .display_text("There are no bound apps for this service instance.".into());
            return;
        }
        let mut rows = vec![vec!["name".to_string(), "binding name".to_string()]];
        rows.extend(summary.bound_apps.iter().map(|b| {
            vec![b.app_name.clone(), b.binding_name.clone().unwrap_or_default()]
        }));
        base.ui.display_table_with_header("   ", rows, 3);
    }

    fn display_sharing(&self, base: &BaseCommand<'_>, details: &ServiceInstanceDetails) {
        base.ui.display_text("Showing sharing info:".into());
        if let Some((org, space)) = &details.shared_from {
            base.ui.display_text(
                Message::new("This service instance is shared from space {{ space }} of org {{ org }}.")
                    .arg("space", space)
                    .arg("org", org),
            );
            return;
        }
        if details.shared_with.is_empty() {
            base.ui
                .display_text("This service instance is not currently being shared.".into());
            return;
        }
        base.ui.display_text("Shared with spaces:".into());
        let mut rows = vec![vec![
            "org".to_string(),
            "space".to_string(),
            "bindings".to_string(),
        ]];
        rows.extend(details.shared_with.iter().map(|s| {
            vec![s.org_name.clone(), s.space_name.clone(), s.bindings.to_string()]
        }));
        base.ui.display_table_with_header("   ", rows, 3);
    }

    fn display_upgrade(&self, base: &BaseCommand<'_>, summary: &ServiceInstanceSummary) {
        base.ui.display_text("Showing upgrade status:".into());
        if !summary.upgrade_available {
            base.ui
                .display_text("There is no upgrade available for this service.".into());
            return;
        }
        base.ui
            .display_text("There is an upgrade available for this service.".into());
        base.ui.display_text(
            Message::new("TIP: You can upgrade using '{{ bin }} upgrade-service {{ instance }}'")
                .arg("bin", base.config.binary_name())
                .arg("instance", &self.service_instance),
        );
    }
}

impl Command for ServiceCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;
        let space = base.config.targeted_space();

        if self.guid {
            let reply = base
                .actor
                .get_service_instance_details(&self.service_instance, &space.guid);
            let details = displayed(base.ui, reply.into_parts())?;
            base.ui.display_text(details.summary.instance.guid.into());
            return Ok(());
        }

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        base.ui.display_text_with_flavor(
            Message::new(
                "Showing info of service {{ instance }} in org {{ org }} / space {{ space }} as {{ user }}...",
            )
            .arg("instance", &self.service_instance)
            .arg("org", &org.name)
            .arg("space", &space.name)
            .arg("user", &user.name),
        );
        base.ui.display_newline();

        let reply = base
            .actor
            .get_service_instance_details(&self.service_instance, &space.guid);
        let details = displayed(base.ui, reply.into_parts())?;
        let summary = &details.summary;
        let instance = &summary.instance;

        base.ui.display_key_value_table(
            "",
            vec![
                vec!["name:".to_string(), instance.name.clone()],
                vec!["guid:".to_string(), instance.guid.clone()],
                vec!["type:".to_string(), "managed".to_string()],
                vec!["broker:".to_string(), summary.broker_name.clone()],
                vec!["offering:".to_string(), instance.offering_name.clone()],
                vec!["plan:".to_string(), instance.plan_name.clone()],
            ],
            3,
        );
        base.ui.display_newline();

        base.ui.display_text("Showing status of last operation:".into());
        base.ui.display_key_value_table(
            "   ",
            vec![vec!["status:".to_string(), instance.last_operation.status()]],
            3,
        );
        base.ui.display_newline();

        self.display_bound_apps(base, summary);
        base.ui.display_newline();
        self.display_sharing(base, &details);
        base.ui.display_newline();
        self.display_upgrade(base, summary);
        Ok(())
    }
}
