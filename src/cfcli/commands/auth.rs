use super::{BaseCommand, Command};
use crate::actor::model::{Credentials, GrantType};
use crate::error::{CliError, Result};
use crate::ui::Message;
use clap::Args;
use tracing::debug;

/// Oldest controller API this client is tested against.
pub const MINIMUM_API_VERSION: &str = "3.84.0";

#[derive(Args, Debug, Clone, Default)]
pub struct AuthCommand {
    /// Username, or client ID with --client-credentials
    #[arg(value_name = "USERNAME", env = "CF_USERNAME")]
    pub username: Option<String>,

    /// Password, or client secret with --client-credentials
    #[arg(value_name = "PASSWORD", env = "CF_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Use (non-user) service account (also called client credentials)
    #[arg(long = "client-credentials")]
    pub client_credentials: bool,

    /// Indicates the identity provider to be used for authentication
    #[arg(long, value_name = "ORIGIN")]
    pub origin: Option<String>,
}

fn parse_version(version: &str) -> Option<Vec<u64>> {
    version
        .trim()
        .split('.')
        .map(|part| part.parse().ok())
        .collect()
}

/// `Some(true)` when `version` is older than `minimum`, `None` when it can't
/// be compared.
pub fn version_below(version: &str, minimum: &str) -> Option<bool> {
    let version = parse_version(version)?;
    let minimum = parse_version(minimum)?;
    Some(version < minimum)
}

impl AuthCommand {
    fn credentials(&self) -> Result<Credentials> {
        if self.client_credentials && self.origin.is_some() {
            return Err(CliError::ArgumentCombination {
                args: vec!["--client-credentials".to_string(), "--origin".to_string()],
            });
        }

        let username = self.username.clone().filter(|u| !u.is_empty());
        let password = self.password.clone().filter(|p| !p.is_empty());
        match (username, password) {
            (Some(username), Some(secret)) => Ok(Credentials {
                username,
                secret,
                origin: self.origin.clone(),
                grant_type: if self.client_credentials {
                    GrantType::ClientCredentials
                } else {
                    GrantType::Password
                },
            }),
            (username, password) => Err(CliError::MissingCredentials {
                username: username.is_none(),
                password: password.is_none(),
            }),
        }
    }

    fn warn_about_api_version(&self, base: &BaseCommand<'_>) {
        let version = base.config.api_version();
        match version_below(&version, MINIMUM_API_VERSION) {
            None => base.ui.display_warning(
                "Warning: unable to determine whether targeted API's version meets minimum supported."
                    .into(),
            ),
            Some(true) => base.ui.display_warning(
                Message::new(
                    "Warning: Your targeted API's version ({{ version }}) is less than the minimum supported API version ({{ minimum }}). Some commands may not function correctly.",
                )
                .arg("version", &version)
                .arg("minimum", MINIMUM_API_VERSION),
            ),
            Some(false) => {}
        }
    }
}

impl Command for AuthCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        let credentials = self.credentials()?;

        let binary_name = base.config.binary_name();
        if credentials.grant_type == GrantType::Password
            && base.config.uaa_grant_type() == GrantType::ClientCredentials.as_str()
        {
            return Err(CliError::PasswordGrantTypeLogoutRequired { binary_name });
        }

        let target = base.config.target();
        if target.is_empty() {
            return Err(CliError::NoApiSet { binary_name });
        }

        base.ui
            .display_text(Message::new("API endpoint: {{ target }}").arg("target", &target));
        self.warn_about_api_version(base);
        base.ui.display_text("Authenticating...".into());

        debug!(username = %credentials.username, grant_type = credentials.grant_type.as_str(), "authenticating");
        let tokens = base.actor.authenticate(&credentials)?;
        base.config.set_token_information(
            &tokens.access_token,
            &tokens.refresh_token,
            credentials.grant_type.as_str(),
        );
        base.config.set_current_user(&tokens.user.name);
        base.config.unset_organization_and_space_information();

        base.ui.display_ok();
        base.ui.display_text(
            Message::new("Use '{{ bin }} target' to view or set your target org and space.")
                .arg("bin", binary_name),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorError;
    use crate::config::{CliConfig, Config};
    use crate::test_utils::TestEnv;

    fn auth(username: Option<&str>, password: Option<&str>) -> AuthCommand {
        AuthCommand {
            username: username.map(str::to_string),
            password: password.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_version_below() {
        assert_eq!(version_below("3.83.0", "3.84.0"), Some(true));
        assert_eq!(version_below("3.84.0", "3.84.0"), Some(false));
        assert_eq!(version_below("3.100.1", "3.84.0"), Some(false));
        assert_eq!(version_below("", "3.84.0"), None);
        assert_eq!(version_below("three", "3.84.0"), None);
    }

    #[test]
    fn test_client_credentials_with_origin() {
        let env = TestEnv::new();
        let command = AuthCommand {
            client_credentials: true,
            origin: Some("ldap".to_string()),
            ..auth(Some("id"), Some("secret"))
        };
        let err = command.execute(&env.base()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Incorrect Usage: The following arguments cannot be used together: --client-credentials, --origin"
        );
    }

    #[test]
    fn test_missing_credentials() {
        let env = TestEnv::new();
        let err = auth(None, None).execute(&env.base()).unwrap_err();
        assert!(matches!(
            err,
            CliError::MissingCredentials {
                username: true,
                password: true
            }
        ));

        let err = auth(Some("myuser"), None).execute(&env.base()).unwrap_err();
        assert!(matches!(
            err,
            CliError::MissingCredentials {
                username: false,
                password: true
            }
        ));
        assert_eq!(env.actor.authenticate.call_count(), 0);
    }

    #[test]
    fn test_no_api_set() {
        let mut env = TestEnv::new();
        env.config = CliConfig::default();
        let err = auth(Some("u"), Some("p")).execute(&env.base()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No API endpoint set. Use 'cf api' to set an endpoint"
        );
    }

    #[test]
    fn test_service_account_must_log_out_first() {
        let env = TestEnv::new();
        env.config
            .set_token_information("a", "r", GrantType::ClientCredentials.as_str());
        let err = auth(Some("u"), Some("p")).execute(&env.base()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Service account currently logged in. Use 'cf logout' to log out service account and try again."
        );

        let client = AuthCommand {
            client_credentials: true,
            ..auth(Some("id"), Some("secret"))
        };
        client.execute(&env.base()).unwrap();
    }

    #[test]
    fn test_successful_auth() {
        let env = TestEnv::new();
        auth(Some("admin"), Some("pw")).execute(&env.base()).unwrap();

        let credentials = env.actor.authenticate.last_call().unwrap();
        assert_eq!(credentials.username, "admin");
        assert_eq!(credentials.secret, "pw");
        assert_eq!(credentials.origin, None);
        assert_eq!(credentials.grant_type, GrantType::Password);

        assert_eq!(env.config.access_token(), "bearer access");
        assert_eq!(env.config.current_user().as_deref(), Some("admin"));
        assert!(env.config.targeted_organization().is_empty());
        assert!(env.config.targeted_space().is_empty());
        assert_eq!(
            env.out(),
            "API endpoint: https://api.example.com\nAuthenticating...\nOK\n\
             Use 'cf target' to view or set your target org and space.\n"
        );
        assert_eq!(env.err(), "");
    }

    #[test]
    fn test_old_api_version_warns() {
        let env = TestEnv::new();
        env.config
            .set_target_information("https://api.example.com", "3.83.0");
        auth(Some("u"), Some("p")).execute(&env.base()).unwrap();
        assert_eq!(
            env.err(),
            "Warning: Your targeted API's version (3.83.0) is less than the minimum supported API version (3.84.0). Some commands may not function correctly.\n"
        );
    }

    #[test]
    fn test_unknown_api_version_warns() {
        let env = TestEnv::new();
        env.config.set_target_information("https://api.example.com", "");
        auth(Some("u"), Some("p")).execute(&env.base()).unwrap();
        assert!(env
            .err()
            .contains("unable to determine whether targeted API's version meets minimum supported"));
    }

    #[test]
    fn test_auth_error_leaves_session_alone() {
        let env = TestEnv::new();
        env.actor
            .authenticate
            .returns(|_| Err(ActorError::InvalidCredentials));
        let err = auth(Some("u"), Some("bad")).execute(&env.base()).unwrap_err();
        assert!(matches!(err, CliError::Actor(ActorError::InvalidCredentials)));
        assert_eq!(env.config.current_user().as_deref(), Some("steve"));
        assert!(!env.out().contains("OK"));
    }
}
