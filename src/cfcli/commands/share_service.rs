use super::{confirm, displayed, BaseCommand, Command};
use crate::actor::{ActorError, ShareParams};
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct ShareServiceCommand {
    /// Name of the service instance
    #[arg(value_name = "SERVICE_INSTANCE")]
    pub service_instance: String,

    /// Space to share the service instance into
    #[arg(short = 's', long = "space", value_name = "OTHER_SPACE", required = true)]
    pub space: String,

    /// Org of the other space (defaults to the targeted org)
    #[arg(short = 'o', long = "org", value_name = "OTHER_ORG")]
    pub org: Option<String>,
}

/// Share parameters for an instance in the targeted space, defaulting the
/// destination org to the targeted one.
fn share_params(
    base: &BaseCommand<'_>,
    instance: &str,
    org: Option<&str>,
    space: &str,
) -> ShareParams {
    ShareParams {
        instance_name: instance.to_string(),
        space_guid: base.config.targeted_space().guid,
        org_name: org
            .map(str::to_string)
            .unwrap_or_else(|| base.config.targeted_organization().name),
        space_name: space.to_string(),
    }
}

impl Command for ShareServiceCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;

        let user = base.actor.get_current_user()?;
        let params = share_params(base, &self.service_instance, self.org.as_deref(), &self.space);
        base.ui.display_text_with_flavor(
            Message::new(
                "Sharing service instance {{ instance }} into org {{ org }} / space {{ space }} as {{ user }}...",
            )
            .arg("instance", &params.instance_name)
            .arg("org", &params.org_name)
            .arg("space", &params.space_name)
            .arg("user", &user.name),
        );

        match displayed(base.ui, base.actor.share_service_instance(&params).into_parts()) {
            Ok(()) => {}
            Err(ActorError::ResourceAlreadyExists(_)) => {
                base.ui.display_text(
                    Message::new("Service instance {{ instance }} is already shared with that space.")
                        .arg("instance", &params.instance_name),
                );
            }
            Err(err) => return Err(err.into()),
        }
        base.ui.display_ok();
        Ok(())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct UnshareServiceCommand {
    /// Name of the service instance
    #[arg(value_name = "SERVICE_INSTANCE")]
    pub service_instance: String,

    /// Space to unshare the service instance from
    #[arg(short = 's', long = "space", value_name = "OTHER_SPACE", required = true)]
    pub space: String,

    /// Org of the other space (defaults to the targeted org)
    #[arg(short = 'o', long = "org", value_name = "OTHER_ORG")]
    pub org: Option<String>,

    /// Force unshare without confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl Command for UnshareServiceCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(true, true)?;
        let user = base.actor.get_current_user()?;

        if !self.force {
            base.ui.display_warning(
                Message::new(
                    "WARNING: Unsharing this service instance will remove any existing bindings originating from the service instance in the space \"{{ space }}\". This could cause apps to stop working.",
                )
                .arg("space", &self.space),
            );
            base.ui.display_newline();
        }
        if !confirm(
            base.ui,
            self.force,
            "Really unshare the service instance?".into(),
            "Unshare cancelled",
        )? {
            return Ok(());
        }

        let params = share_params(base, &self.service_instance, self.org.as_deref(), &self.space);
        base.ui.display_text_with_flavor(
            Message::new(
                "Unsharing service instance {{ instance }} from org {{ org }} / space {{ space }} as {{ user }}...",
            )
            .arg("instance", &params.instance_name)
            .arg("org", &params.org_name)
            .arg("space", &params.space_name)
            .arg("user", &user.name),
        );

        match displayed(base.ui, base.actor.unshare_service_instance(&params).into_parts()) {
            Ok(()) => {}
            Err(ActorError::ServiceInstanceNotShared { .. }) => {
                base.ui.display_text(
                    Message::new(
                        "Service instance {{ instance }} is not shared with space {{ space }} in organization {{ org }}.",
                    )
                    .arg("instance", &params.instance_name)
                    .arg("space", &params.space_name)
                    .arg("org", &params.org_name),
                );
            }
            Err(err) => return Err(err.into()),
        }
        base.ui.display_ok();
        Ok(())
    }
}
