use super::{confirm, displayed, BaseCommand, Command};
use crate::actor::model::{ApplicationSummary, Process};
use crate::actor::ActorError;
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

fn process_summary(processes: &[Process]) -> String {
    processes
        .iter()
        .map(|p| format!("{}:{}/{}", p.process_type, p.running, p.instances))
        .collect::<Vec<_>>()
        .join(", ")
}

fn app_row(summary: &ApplicationSummary) -> Vec<String> {
    vec![
        summary.application.name.clone(),
        summary.application.state.as_str().to_string(),
        process_summary(&summary.processes),
        summary.routes.join(", "),
    ]
}

#[derive(Args, Debug, Clone, Default)]
pub struct AppsCommand {
    /// Selector to filter apps by labels
    #[arg(long = "labels", value_name = "SELECTOR")]
    pub labels: Option<String>,
}

impl Command for AppsCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        let space = base.config.targeted_space();
        base.ui.display_text_with_flavor(
            Message::new("Getting apps in org {{ org }} / space {{ space }} as {{ user }}...")
                .arg("org", &org.name)
                .arg("space", &space.name)
                .arg("user", &user.name),
        );
        base.ui.display_newline();

        let reply = base
            .actor
            .get_app_summaries_for_space(&space.guid, self.labels.as_deref());
        let summaries = displayed(base.ui, reply.into_parts())?;

        if summaries.is_empty() {
            base.ui.display_text("No apps found".into());
            return Ok(());
        }

        let mut rows = vec![vec![
            "name".to_string(),
            "requested state".to_string(),
            "processes".to_string(),
            "routes".to_string(),
        ]];
        rows.extend(summaries.iter().map(app_row));
        base.ui.display_table_with_header("", rows, 3);
        Ok(())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct AppCommand {
    /// Name of the app
    #[arg(value_name = "APP_NAME")]
    pub app: String,

    /// Retrieve and display the given app's guid. All other health and status output for the app is suppressed.
    #[arg(long)]
    pub guid: bool,
}

impl AppCommand {
    fn display_guid(&self, base: &BaseCommand<'_>, space_guid: &str) -> Result<()> {
        let reply = base
            .actor
            .get_application_by_name_and_space(&self.app, space_guid);
        let app = displayed(base.ui, reply.into_parts())?;
        base.ui.display_text(app.guid.into());
        Ok(())
    }
}

impl Command for AppCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;
        let space = base.config.targeted_space();

        if self.guid {
            return self.display_guid(base, &space.guid);
        }

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        base.ui.display_text_with_flavor(
            Message::new(
                "Showing health and status for app {{ app }} in org {{ org }} / space {{ space }} as {{ user }}...",
            )
            .arg("app", &self.app)
            .arg("org", &org.name)
            .arg("space", &space.name)
            .arg("user", &user.name),
        );
        base.ui.display_newline();

        let reply = base.actor.get_detailed_app_summary(&self.app, &space.guid);
        let detail = displayed(base.ui, reply.into_parts())?;
        let summary = &detail.summary;

        let last_uploaded = detail
            .last_uploaded
            .map(|t| t.format("%a %d %b %H:%M:%S UTC %Y").to_string())
            .unwrap_or_default();
        base.ui.display_key_value_table(
            "",
            vec![
                vec!["name:".to_string(), summary.application.name.clone()],
                vec![
                    "requested state:".to_string(),
                    summary.application.state.as_str().to_string(),
                ],
                vec!["routes:".to_string(), summary.routes.join(", ")],
                vec!["last uploaded:".to_string(), last_uploaded],
                vec!["stack:".to_string(), detail.stack.clone()],
                vec!["buildpacks:".to_string(), detail.buildpacks.join(", ")],
            ],
            3,
        );

        for process in &summary.processes {
            base.ui.display_newline();
            base.ui.display_key_value_table(
                "",
                vec![
                    vec!["type:".to_string(), process.process_type.clone()],
                    vec![
                        "instances:".to_string(),
                        format!("{}/{}", process.running, process.instances),
                    ],
                    vec!["memory usage:".to_string(), format!("{}M", process.memory_mb)],
                    vec!["disk usage:".to_string(), format!("{}M", process.disk_mb)],
                ],
                3,
            );
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct CreateAppCommand {
    /// Name of the new app
    #[arg(value_name = "APP_NAME")]
    pub app: String,
}

impl Command for CreateAppCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        let space = base.config.targeted_space();
        base.ui.display_text_with_flavor(
            Message::new("Creating app {{ app }} in org {{ org }} / space {{ space }} as {{ user }}...")
                .arg("app", &self.app)
                .arg("org", &org.name)
                .arg("space", &space.name)
                .arg("user", &user.name),
        );

        let reply = base.actor.create_application_in_space(&self.app, &space.guid);
        match displayed(base.ui, reply.into_parts()) {
            Ok(_) => {}
            Err(ActorError::ResourceAlreadyExists(_)) => {
                base.ui
                    .display_warning(Message::new("App {{ app }} already exists").arg("app", &self.app));
            }
            Err(err) => return Err(err.into()),
        }
        base.ui.display_ok();
        Ok(())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeleteCommand {
    /// Name of the app
    #[arg(value_name = "APP_NAME")]
    pub app: String,

    /// Force deletion without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Also delete any mapped routes
    #[arg(short = 'r')]
    pub delete_mapped_routes: bool,
}

impl Command for DeleteCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;

        let prompt = Message::new("Really delete the app {{ app }}?").arg("app", &self.app);
        if !confirm(base.ui, self.force, prompt, "Delete cancelled")? {
            return Ok(());
        }

        let user = base.actor.get_current_user()?;
        let org = base.config.targeted_organization();
        let space = base.config.targeted_space();
        base.ui.display_text_with_flavor(
            Message::new("Deleting app {{ app }} in org {{ org }} / space {{ space }} as {{ user }}...")
                .arg("app", &self.app)
                .arg("org", &org.name)
                .arg("space", &space.name)
                .arg("user", &user.name),
        );

        let reply = base.actor.delete_application_by_name_and_space(
            &self.app,
            &space.guid,
            self.delete_mapped_routes,
        );
        match displayed(base.ui, reply.into_parts()) {
            Ok(()) => {}
            Err(ActorError::ApplicationNotFound { .. }) => {
                base.ui.display_warning(
                    Message::new("App '{{ app }}' does not exist.").arg("app", &self.app),
                );
            }
            Err(err) => return Err(err.into()),
        }
        base.ui.display_ok();
        Ok(())
    }
}
