use super::{displayed, BaseCommand, Command};
use crate::actor::model::{Organization, Space};
use crate::actor::ActorError;
use crate::error::Result;
use crate::ui::Message;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct TargetCommand {
    /// Organization
    #[arg(short = 'o', value_name = "ORG")]
    pub organization: Option<String>,

    /// Space
    #[arg(short = 's', value_name = "SPACE")]
    pub space: Option<String>,
}

impl TargetCommand {
    /// Targets the named org. With no explicit space, an org holding exactly
    /// one space gets that space targeted too.
    fn target_organization(&self, base: &BaseCommand<'_>, name: &str) -> Result<Organization> {
        let reply = base.actor.get_organization_by_name(name);
        let org = match displayed(base.ui, reply.into_parts()) {
            Ok(org) => org,
            Err(err) => {
                base.config.unset_organization_and_space_information();
                return Err(err.into());
            }
        };

        base.config.set_organization_information(&org.guid, &org.name);
        base.config.unset_space_information();

        if self.space.is_none() {
            let reply = base.actor.get_organization_spaces(&org.guid);
            let spaces = match displayed(base.ui, reply.into_parts()) {
                Ok(spaces) => spaces,
                Err(err) => {
                    base.config.unset_organization_and_space_information();
                    return Err(err.into());
                }
            };
            if let [only] = spaces.as_slice() {
                set_space(base, only);
            }
        }
        Ok(org)
    }

    fn target_space(&self, base: &BaseCommand<'_>, name: &str, org_guid: &str) -> Result<()> {
        let reply = base.actor.get_space_by_name_and_organization(name, org_guid);
        match displayed(base.ui, reply.into_parts()) {
            Ok(space) => {
                set_space(base, &space);
                Ok(())
            }
            Err(err) => {
                if self.organization.is_some() {
                    base.config.unset_organization_and_space_information();
                }
                Err(err.into())
            }
        }
    }
}

fn set_space(base: &BaseCommand<'_>, space: &Space) {
    base.config
        .set_space_information(&space.guid, &space.name, space.allow_ssh);
}

fn display_target_table(base: &BaseCommand<'_>, user: &str) {
    let bin = base.config.binary_name();
    let org = base.config.targeted_organization();
    let space = base.config.targeted_space();

    let mut rows = vec![
        vec!["api endpoint:".to_string(), base.config.target()],
        vec!["api version:".to_string(), base.config.api_version()],
        vec!["user:".to_string(), user.to_string()],
    ];
    if !org.is_empty() {
        rows.push(vec!["org:".to_string(), org.name.clone()]);
    }
    if !space.is_empty() {
        rows.push(vec!["space:".to_string(), space.name]);
    }
    base.ui.display_key_value_table("", rows, 3);

    if org.is_empty() {
        base.ui.display_newline();
        base.ui.display_text(
            Message::new("No org or space targeted, use '{{ bin }} target -o ORG -s SPACE'")
                .arg("bin", &bin),
        );
    } else if base.config.targeted_space().is_empty() {
        base.ui.display_newline();
        base.ui.display_text(
            Message::new("No space targeted, use '{{ bin }} target -s SPACE'").arg("bin", &bin),
        );
    }
}

impl Command for TargetCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        base.shared_actor.check_target(false, false)?;
        let user = base.actor.get_current_user()?;

        let org_guid = match &self.organization {
            Some(name) => Some(self.target_organization(base, name)?.guid),
            None => None,
        };

        if let Some(space) = &self.space {
            let org_guid = match org_guid {
                Some(guid) => guid,
                None => {
                    let targeted = base.config.targeted_organization();
                    if targeted.is_empty() {
                        return Err(ActorError::NoOrganizationTargeted {
                            binary_name: base.config.binary_name(),
                        }
                        .into());
                    }
                    targeted.guid
                }
            };
            self.target_space(base, space, &org_guid)?;
        }

        display_target_table(base, &user.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Reply;
    use crate::config::Config;
    use crate::test_utils::{space, TestEnv};

    fn target(org: Option<&str>, space: Option<&str>) -> TargetCommand {
        TargetCommand {
            organization: org.map(str::to_string),
            space: space.map(str::to_string),
        }
    }

    #[test]
    fn test_not_logged_in() {
        let env = TestEnv::new();
        env.shared.check_target.returns(|_| {
            Err(ActorError::NotLoggedIn {
                binary_name: "cf".to_string(),
            })
        });
        let err = target(None, None).execute(&env.base()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not logged in. Use 'cf auth USERNAME PASSWORD' to log in."
        );
        assert_eq!(env.shared.check_target.last_call(), Some((false, false)));
    }

    #[test]
    fn test_show_full_target() {
        let env = TestEnv::new();
        target(None, None).execute(&env.base()).unwrap();
        assert_eq!(
            env.out(),
            "api endpoint:   https://api.example.com\n\
             api version:    3.140.0\n\
             user:           steve\n\
             org:            some-org\n\
             space:          some-space\n"
        );
    }

    #[test]
    fn test_show_without_org() {
        let env = TestEnv::new();
        env.config.unset_organization_and_space_information();
        target(None, None).execute(&env.base()).unwrap();
        assert!(env
            .out()
            .ends_with("user:           steve\n\nNo org or space targeted, use 'cf target -o ORG -s SPACE'\n"));
    }

    #[test]
    fn test_show_without_space() {
        let env = TestEnv::new();
        env.config.unset_space_information();
        target(None, None).execute(&env.base()).unwrap();
        assert!(env.out().contains("org:            some-org\n"));
        assert!(env
            .out()
            .ends_with("\nNo space targeted, use 'cf target -s SPACE'\n"));
    }

    #[test]
    fn test_space_in_targeted_org() {
        let env = TestEnv::new();
        target(None, Some("dev")).execute(&env.base()).unwrap();
        assert_eq!(
            env.actor.get_space_by_name_and_organization.last_call(),
            Some(("dev".to_string(), "some-org-guid".to_string()))
        );
        assert_eq!(env.config.targeted_space().name, "dev");
        assert_eq!(env.config.targeted_space().guid, "dev-guid");
    }

    #[test]
    fn test_space_not_found_keeps_config() {
        let env = TestEnv::new();
        env.actor
            .get_space_by_name_and_organization
            .returns(|(name, _)| {
                Reply::err(ActorError::SpaceNotFound { name: name.clone() }, Vec::new())
            });
        let err = target(None, Some("nope")).execute(&env.base()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CliError::Actor(ActorError::SpaceNotFound { .. })
        ));
        assert_eq!(env.config.targeted_organization().name, "some-org");
        assert_eq!(env.config.targeted_space().name, "some-space");
    }

    #[test]
    fn test_space_without_targeted_org() {
        let env = TestEnv::new();
        env.config.unset_organization_and_space_information();
        let err = target(None, Some("dev")).execute(&env.base()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No org targeted, use 'cf target -o ORG' to target an org."
        );
        assert_eq!(env.actor.get_space_by_name_and_organization.call_count(), 0);
    }

    #[test]
    fn test_org_not_found_clears_targets() {
        let env = TestEnv::new();
        env.actor.get_organization_by_name.returns(|name| {
            Reply::err(
                ActorError::OrganizationNotFound { name: name.clone() },
                vec!["warning-1".to_string(), "warning-2".to_string()],
            )
        });
        let err = target(Some("ghost"), None).execute(&env.base()).unwrap_err();
        assert_eq!(err.to_string(), "Organization 'ghost' not found.");
        assert_eq!(env.err(), "warning-1\nwarning-2\n");
        assert!(env.config.targeted_organization().is_empty());
        assert!(env.config.targeted_space().is_empty());
    }

    #[test]
    fn test_org_with_one_space_targets_it() {
        let env = TestEnv::new();
        env.actor
            .get_organization_spaces
            .returns(|org| Reply::ok(vec![space("only", org)], vec!["warning-3".to_string()]));
        target(Some("other"), None).execute(&env.base()).unwrap();
        assert_eq!(env.config.targeted_organization().guid, "other-guid");
        assert_eq!(env.config.targeted_space().name, "only");
        assert_eq!(env.err(), "warning-3\n");
    }

    #[test]
    fn test_org_with_many_spaces_clears_space() {
        let env = TestEnv::new();
        env.actor.get_organization_spaces.returns(|org| {
            Reply::ok(vec![space("a", org), space("b", org)], Vec::new())
        });
        target(Some("other"), None).execute(&env.base()).unwrap();
        assert_eq!(env.config.targeted_organization().name, "other");
        assert!(env.config.targeted_space().is_empty());
        assert!(env.out().ends_with("No space targeted, use 'cf target -s SPACE'\n"));
    }

    #[test]
    fn test_listing_spaces_fails_clears_targets() {
        let env = TestEnv::new();
        env.actor.get_organization_spaces.returns(|_| {
            Reply::err(
                ActorError::Persistence("boom".to_string()),
                vec!["warning-1".to_string()],
            )
        });
        assert!(target(Some("other"), None).execute(&env.base()).is_err());
        assert!(env.config.targeted_organization().is_empty());
        assert_eq!(env.err(), "warning-1\n");
    }

    #[test]
    fn test_org_and_space() {
        let env = TestEnv::new();
        target(Some("other"), Some("dev")).execute(&env.base()).unwrap();
        assert_eq!(env.actor.get_organization_spaces.call_count(), 0);
        assert_eq!(
            env.actor.get_space_by_name_and_organization.last_call(),
            Some(("dev".to_string(), "other-guid".to_string()))
        );
        assert_eq!(env.config.targeted_organization().name, "other");
        assert_eq!(env.config.targeted_space().name, "dev");
    }

    #[test]
    fn test_org_and_missing_space_clears_targets() {
        let env = TestEnv::new();
        env.actor
            .get_space_by_name_and_organization
            .returns(|(name, _)| {
                Reply::err(ActorError::SpaceNotFound { name: name.clone() }, Vec::new())
            });
        assert!(target(Some("other"), Some("dev")).execute(&env.base()).is_err());
        assert!(env.config.targeted_organization().is_empty());
        assert!(env.config.targeted_space().is_empty());
    }
}
