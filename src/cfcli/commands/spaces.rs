use super::{displayed, BaseCommand, Command};
use crate::actor::model::Organization;
use crate::actor::ActorError;
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct CreateSpaceCommand {
    /// Name of the new space
    #[arg(value_name = "SPACE")]
    pub space: String,

    /// Organization (defaults to the targeted org)
    #[arg(short = 'o', value_name = "ORG")]
    pub organization: Option<String>,
}

impl CreateSpaceCommand {
    fn organization(&self, base: &BaseCommand<'_>) -> Result<Organization> {
        match &self.organization {
            Some(name) => {
                let reply = base.actor.get_organization_by_name(name);
                Ok(displayed(base.ui, reply.into_parts())?)
            }
            None => {
                let targeted = base.config.targeted_organization();
                Ok(Organization {
                    guid: targeted.guid,
                    name: targeted.name,
                })
            }
        }
    }
}

impl Command for CreateSpaceCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor
            .check_target(self.organization.is_none(), false)?;

        let user = base.actor.get_current_user()?;
        let org = self.organization(base)?;
        base.ui.display_text_with_flavor(
            Message::new("Creating space {{ space }} in org {{ org }} as {{ user }}...")
                .arg("space", &self.space)
                .arg("org", &org.name)
                .arg("user", &user.name),
        );

        let reply = base.actor.create_space(&self.space, &org.guid);
        match displayed(base.ui, reply.into_parts()) {
            Ok(_) => {}
            Err(ActorError::ResourceAlreadyExists(_)) => {
                base.ui.display_warning(
                    Message::new("Space '{{ space }}' already exists.").arg("space", &self.space),
                );
                base.ui.display_ok();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        base.ui.display_ok();
        base.ui.display_newline();
        base.ui.display_text(
            Message::new("TIP: Use '{{ bin }} target -o \"{{ org }}\" -s \"{{ space }}\"' to target new space")
                .arg("bin", base.config.binary_name())
                .arg("org", &org.name)
                .arg("space", &self.space),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Reply;
    use crate::test_utils::TestEnv;

    fn cmd(org: Option<&str>) -> CreateSpaceCommand {
        CreateSpaceCommand {
            space: "dev".to_string(),
            organization: org.map(str::to_string),
        }
    }

    #[test]
    fn test_create_in_targeted_org() {
        let env = TestEnv::new();
        cmd(None).execute(&env.base()).unwrap();
        assert_eq!(env.shared.check_target.last_call(), Some((true, false)));
        assert_eq!(env.actor.get_organization_by_name.call_count(), 0);
        assert_eq!(
            env.actor.create_space.last_call(),
            Some(("dev".to_string(), "some-org-guid".to_string()))
        );
        assert_eq!(
            env.out(),
            "Creating space dev in org some-org as steve...\nOK\n\n\
             TIP: Use 'cf target -o \"some-org\" -s \"dev\"' to target new space\n"
        );
    }

    #[test]
    fn test_create_in_named_org() {
        let env = TestEnv::new();
        env.actor
            .get_organization_by_name
            .returns(|n| Reply::ok(crate::test_utils::organization(n), vec!["get-org-warnings".to_string()]));
        cmd(Some("other")).execute(&env.base()).unwrap();
        assert_eq!(env.shared.check_target.last_call(), Some((false, false)));
        assert_eq!(
            env.actor.create_space.last_call(),
            Some(("dev".to_string(), "other-guid".to_string()))
        );
        assert_eq!(env.err(), "get-org-warnings\n");
    }

    #[test]
    fn test_named_org_missing() {
        let env = TestEnv::new();
        env.actor.get_organization_by_name.returns(|n| {
            Reply::err(ActorError::OrganizationNotFound { name: n.clone() }, Vec::new())
        });
        assert!(cmd(Some("ghost")).execute(&env.base()).is_err());
        assert_eq!(env.actor.create_space.call_count(), 0);
    }

    #[test]
    fn test_space_already_exists() {
        let env = TestEnv::new();
        env.actor.create_space.returns(|(n, _)| {
            Reply::err(ActorError::ResourceAlreadyExists(n.clone()), Vec::new())
        });
        cmd(None).execute(&env.base()).unwrap();
        assert_eq!(env.err(), "Space 'dev' already exists.\n");
        assert!(env.out().ends_with("as steve...\nOK\n"));
    }

    #[test]
    fn test_check_target_error_is_returned_unchanged() {
        let env = TestEnv::new();
        env.fail_target_check();
        let err = cmd(None)
            .execute(&env.base())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CliError::Actor(ActorError::NotLoggedIn { .. })
        ));
        assert_eq!(env.shared.check_target.last_call(), Some((true, false)));
        assert_eq!(env.actor.get_current_user.call_count(), 0);
        assert_eq!(env.actor.get_organization_by_name.call_count(), 0);
        assert_eq!(env.actor.create_space.call_count(), 0);
        assert_eq!(env.out(), "");
    }
}
