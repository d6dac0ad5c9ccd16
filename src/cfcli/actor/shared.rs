use super::{ActorError, SharedActor};
use crate::config::Config;

/// Login and target checks answered from configuration.
pub struct TargetChecker<'a> {
    config: &'a dyn Config,
}

impl<'a> TargetChecker<'a> {
    pub fn new(config: &'a dyn Config) -> Self {
        Self { config }
    }
}

impl SharedActor for TargetChecker<'_> {
    fn check_target(&self, require_org: bool, require_space: bool) -> Result<(), ActorError> {
        let binary_name = self.config.binary_name();
        if !self.is_logged_in() {
            return Err(ActorError::NotLoggedIn { binary_name });
        }
        if require_org && self.config.targeted_organization().is_empty() {
            return Err(ActorError::NoOrganizationTargeted { binary_name });
        }
        if require_space && self.config.targeted_space().is_empty() {
            return Err(ActorError::NoSpaceTargeted { binary_name });
        }
        Ok(())
    }

    fn is_logged_in(&self) -> bool {
        !self.config.access_token().is_empty() || !self.config.refresh_token().is_empty()
    }
}
