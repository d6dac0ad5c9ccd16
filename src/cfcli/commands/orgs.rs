use super::{displayed, BaseCommand, Command};
use crate::actor::ActorError;
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct CreateOrgCommand {
    /// Name of the new organization
    #[arg(value_name = "ORG")]
    pub organization: String,
}

impl Command for CreateOrgCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(false, false)?;

        let user = base.actor.get_current_user()?;
        base.ui.display_text_with_flavor(
            Message::new("Creating org {{ org }} as {{ user }}...")
                .arg("org", &self.organization)
                .arg("user", &user.name),
        );

        let reply = base.actor.create_organization(&self.organization);
        match displayed(base.ui, reply.into_parts()) {
            Ok(_) => {}
            Err(ActorError::ResourceAlreadyExists(_)) => {
                base.ui.display_text(
                    Message::new("Organization {{ org }} already exists.")
                        .arg("org", &self.organization),
                );
                base.ui.display_ok();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        base.ui.display_ok();
        base.ui.display_newline();
        base.ui.display_text(
            Message::new("TIP: Use '{{ bin }} target -o \"{{ org }}\"' to target new org")
                .arg("bin", base.config.binary_name())
                .arg("org", &self.organization),
        );
        Ok(())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct RenameOrgCommand {
    /// Current name of the organization
    #[arg(value_name = "ORG")]
    pub organization: String,

    /// New name for the organization
    #[arg(value_name = "NEW_ORG")]
    pub new_name: String,
}

impl Command for RenameOrgCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(false, false)?;

        let user = base.actor.get_current_user()?;
        base.ui.display_text_with_flavor(
            Message::new("Renaming org {{ org }} to {{ new_org }} as {{ user }}...")
                .arg("org", &self.organization)
                .arg("new_org", &self.new_name)
                .arg("user", &user.name),
        );

        let reply = base
            .actor
            .rename_organization(&self.organization, &self.new_name);
        let org = displayed(base.ui, reply.into_parts())?;

        if base.config.targeted_organization().guid == org.guid {
            base.config.set_organization_information(&org.guid, &org.name);
        }
        base.ui.display_ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::model::Organization;
    use crate::actor::Reply;
    use crate::config::Config;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_create_org() {
        let env = TestEnv::new();
        CreateOrgCommand {
            organization: "my-org".to_string(),
        }
        .execute(&env.base())
        .unwrap();
        assert_eq!(env.shared.check_target.last_call(), Some((false, false)));
        assert_eq!(
            env.out(),
            "Creating org my-org as steve...\nOK\n\nTIP: Use 'cf target -o \"my-org\"' to target new org\n"
        );
    }

    #[test]
    fn test_create_existing_org() {
        let env = TestEnv::new();
        env.actor.create_organization.returns(|name| {
            Reply::err(
                ActorError::ResourceAlreadyExists(name.clone()),
                vec!["org warning".to_string()],
            )
        });
        CreateOrgCommand {
            organization: "my-org".to_string(),
        }
        .execute(&env.base())
        .unwrap();
        assert!(env
            .out()
            .ends_with("Organization my-org already exists.\nOK\n"));
        assert_eq!(env.err(), "org warning\n");
    }

    #[test]
    fn test_rename_untargeted_org() {
        let env = TestEnv::new();
        RenameOrgCommand {
            organization: "old".to_string(),
            new_name: "new".to_string(),
        }
        .execute(&env.base())
        .unwrap();
        assert_eq!(
            env.actor.rename_organization.last_call(),
            Some(("old".to_string(), "new".to_string()))
        );
        assert_eq!(env.out(), "Renaming org old to new as steve...\nOK\n");
        assert_eq!(env.config.targeted_organization().name, "some-org");
    }

    #[test]
    fn test_rename_targeted_org_updates_config() {
        let env = TestEnv::new();
        env.actor.rename_organization.returns(|(_, new)| {
            Reply::ok(
                Organization {
                    guid: "some-org-guid".to_string(),
                    name: new.clone(),
                },
                Vec::new(),
            )
        });
        RenameOrgCommand {
            organization: "some-org".to_string(),
            new_name: "renamed".to_string(),
        }
        .execute(&env.base())
        .unwrap();
        assert_eq!(env.config.targeted_organization().name, "renamed");
        assert_eq!(env.config.targeted_space().name, "some-space");
    }

    #[test]
    fn test_rename_missing_org() {
        let env = TestEnv::new();
        env.actor.rename_organization.returns(|(old, _)| {
            Reply::err(
                ActorError::OrganizationNotFound { name: old.clone() },
                Vec::new(),
            )
        });
        let err = RenameOrgCommand {
            organization: "ghost".to_string(),
            new_name: "x".to_string(),
        }
        .execute(&env.base())
        .unwrap_err();
        assert_eq!(err.to_string(), "Organization 'ghost' not found.");
        assert!(!env.out().contains("OK"));
    }

    #[test]
    fn test_create_org_returns_check_target_error_unchanged() {
        let env = TestEnv::new();
        env.fail_target_check();
        let err = CreateOrgCommand {
            organization: "my-org".to_string(),
        }
            .execute(&env.base())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CliError::Actor(ActorError::NotLoggedIn { .. })
        ));
        assert_eq!(env.shared.check_target.last_call(), Some((false, false)));
        assert_eq!(env.actor.get_current_user.call_count(), 0);
        assert_eq!(env.actor.create_organization.call_count(), 0);
        assert_eq!(env.out(), "");
    }

    #[test]
    fn test_rename_org_returns_check_target_error_unchanged() {
        let env = TestEnv::new();
        env.fail_target_check();
        let err = RenameOrgCommand {
            organization: "my-org".to_string(),
            new_name: "our-org".to_string(),
        }
            .execute(&env.base())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CliError::Actor(ActorError::NotLoggedIn { .. })
        ));
        assert_eq!(env.shared.check_target.last_call(), Some((false, false)));
        assert_eq!(env.actor.get_current_user.call_count(), 0);
        assert_eq!(env.actor.get_organization_by_name.call_count(), 0);
        assert_eq!(env.actor.rename_organization.call_count(), 0);
        assert_eq!(env.out(), "");
    }
}
