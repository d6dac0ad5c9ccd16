//! # Actor Layer
//!
//! The actor layer is where platform operations happen. Commands never talk to
//! the control plane directly: they ask an [`Actor`] to do the work and then
//! decide how to present what came back.
//!
//! ## Replies
//!
//! Every actor call that can produce advisory output returns a [`Reply`]: the
//! result *and* the warnings gathered while producing it. Warnings travel
//! alongside errors too, because the platform often explains a failure with a
//! warning before returning it. Commands display warnings first, then look at
//! the result.
//!
//! ## Long-Running Operations
//!
//! Operations that may outlive the request return `Reply<Option<JobStream>>`.
//! `None` means the platform finished synchronously; `Some(stream)` hands the
//! command a [`job::JobStream`] to drain (see [`crate::commands::wait`]).
//!
//! ## Errors
//!
//! [`ActorError`] is a closed set. Some variants are *sentinels* that commands
//! treat as a benign outcome (deleting something that is already gone); the
//! rest are failures. Commands classify them with an exhaustive `match`.
//!
//! ## Implementations
//!
//! - [`sandbox::SandboxActor`]: a local platform persisted as JSON, used by
//!   the `cf` binary
//! - `test_utils::FakeActor`: scriptable stubs for command tests
//! - [`shared::TargetChecker`]: the [`SharedActor`] backed by configuration

use serde_json::Value;
use thiserror::Error;

pub mod job;
pub mod model;
pub mod platform;
pub mod sandbox;
pub mod shared;

use job::JobStream;
use model::{
    Application, ApplicationSummary, AuthTokens, Credentials, DetailedApplicationSummary,
    Organization, ServiceBroker, ServiceCredentialBinding, ServiceInstanceDetails,
    ServiceInstanceSummary, Space, User,
};

/// Advisory strings from the platform, in the order they were produced.
pub type Warnings = Vec<String>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActorError {
    #[error("Not logged in. Use '{binary_name} auth USERNAME PASSWORD' to log in.")]
    NotLoggedIn { binary_name: String },

    #[error("No org targeted, use '{binary_name} target -o ORG' to target an org.")]
    NoOrganizationTargeted { binary_name: String },

    #[error("No space targeted, use '{binary_name} target -s SPACE' to target a space.")]
    NoSpaceTargeted { binary_name: String },

    #[error("Credentials were rejected, please try again.")]
    InvalidCredentials,

    #[error("Organization '{name}' not found.")]
    OrganizationNotFound { name: String },

    #[error("Space '{name}' not found.")]
    SpaceNotFound { name: String },

    #[error("App '{name}' not found.")]
    ApplicationNotFound { name: String },

    #[error("Service instance '{name}' not found.")]
    ServiceInstanceNotFound { name: String },

    #[error("The plan {plan} could not be found for service offering {offering}.")]
    ServicePlanNotFound { plan: String, offering: String },

    #[error("Service offering '{name}' not found.")]
    ServiceOfferingNotFound { name: String },

    #[error("Service '{name}' is provided by multiple service brokers: {}. Specify a broker by using the '-b' flag.", .brokers.join(", "))]
    DuplicateServiceOffering { name: String, brokers: Vec<String> },

    #[error("Service broker '{name}' not found.")]
    ServiceBrokerNotFound { name: String },

    #[error("No service key {key} found for service instance {instance}.")]
    ServiceKeyNotFound { key: String, instance: String },

    #[error("Binding between {instance} and {app} does not exist.")]
    ServiceBindingNotFound { app: String, instance: String },

    #[error("Service credential binding '{guid}' not found.")]
    ServiceBindingGuidNotFound { guid: String },

    #[error("Can not remove brokers that have associated service instances: {}", .instances.join(", "))]
    ServiceBrokerInUse { name: String, instances: Vec<String> },

    #[error("Service instance {instance} is not shared with space {space} in organization {org}.")]
    ServiceInstanceNotShared {
        instance: String,
        org: String,
        space: String,
    },

    #[error("{0}")]
    ResourceAlreadyExists(String),

    #[error("No upgrade is available.")]
    UpgradeNotAvailable,

    #[error("{0}")]
    JobFailed(String),

    #[error("Timed out waiting for the operation to complete.")]
    JobTimeout,

    #[error("Unable to save platform state: {0}")]
    Persistence(String),
}

/// An actor result paired with the warnings produced along the way.
#[must_use]
#[derive(Debug)]
pub struct Reply<T> {
    pub result: Result<T, ActorError>,
    pub warnings: Warnings,
}

impl<T> Reply<T> {
    pub fn ok(value: T, warnings: Warnings) -> Self {
        Self {
            result: Ok(value),
            warnings,
        }
    }

    pub fn err(err: ActorError, warnings: Warnings) -> Self {
        Self {
            result: Err(err),
            warnings,
        }
    }

    pub fn into_parts(self) -> (Result<T, ActorError>, Warnings) {
        (self.result, self.warnings)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        Reply {
            result: self.result.map(f),
            warnings: self.warnings,
        }
    }
}

impl<T> From<Result<T, ActorError>> for Reply<T> {
    fn from(result: Result<T, ActorError>) -> Self {
        Self {
            result,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateServiceInstanceParams {
    pub offering_name: String,
    pub plan_name: String,
    pub broker_name: Option<String>,
    pub instance_name: String,
    pub space_guid: String,
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateBindingParams {
    pub app_name: String,
    pub instance_name: String,
    pub binding_name: Option<String>,
    pub space_guid: String,
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListBindingParams {
    pub app_name: String,
    pub instance_name: String,
    pub space_guid: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShareParams {
    pub instance_name: String,
    /// Space that owns the instance.
    pub space_guid: String,
    pub org_name: String,
    pub space_name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateServiceKeyParams {
    pub instance_name: String,
    pub key_name: String,
    pub space_guid: String,
    pub parameters: Option<Value>,
}

/// Platform operations available to commands.
pub trait Actor {
    fn cloud_controller_api_version(&self) -> String;

    fn authenticate(&self, credentials: &Credentials) -> Result<AuthTokens, ActorError>;

    fn get_current_user(&self) -> Result<User, ActorError>;

    /// Ends the session behind `access_token`. Unknown tokens are ignored.
    fn revoke_session(&self, access_token: &str) -> Result<(), ActorError>;

    fn create_organization(&self, name: &str) -> Reply<Organization>;

    fn get_organization_by_name(&self, name: &str) -> Reply<Organization>;

    fn rename_organization(&self, old_name: &str, new_name: &str) -> Reply<Organization>;

    fn get_organization_spaces(&self, org_guid: &str) -> Reply<Vec<Space>>;

    fn create_space(&self, name: &str, org_guid: &str) -> Reply<Space>;

    fn get_space_by_name_and_organization(&self, name: &str, org_guid: &str) -> Reply<Space>;

    fn create_application_in_space(&self, name: &str, space_guid: &str) -> Reply<Application>;

    fn get_application_by_name_and_space(&self, name: &str, space_guid: &str)
        -> Reply<Application>;

    fn get_app_summaries_for_space(
        &self,
        space_guid: &str,
        label_selector: Option<&str>,
    ) -> Reply<Vec<ApplicationSummary>>;

    fn get_detailed_app_summary(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<DetailedApplicationSummary>;

    fn delete_application_by_name_and_space(
        &self,
        name: &str,
        space_guid: &str,
        delete_routes: bool,
    ) -> Reply<()>;

    fn create_managed_service_instance(
        &self,
        params: &CreateServiceInstanceParams,
    ) -> Reply<Option<JobStream>>;

    fn delete_service_instance(&self, name: &str, space_guid: &str) -> Reply<Option<JobStream>>;

    /// Instances owned by or shared into the space, ordered by name.
    fn get_service_instances_for_space(
        &self,
        space_guid: &str,
    ) -> Reply<Vec<ServiceInstanceSummary>>;

    fn get_service_instance_details(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<ServiceInstanceDetails>;

    fn upgrade_managed_service_instance(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<Option<JobStream>>;

    fn create_service_app_binding(&self, params: &CreateBindingParams)
        -> Reply<Option<JobStream>>;

    fn list_service_app_bindings(
        &self,
        params: &ListBindingParams,
    ) -> Reply<Vec<ServiceCredentialBinding>>;

    fn delete_service_app_binding(&self, binding_guid: &str) -> Reply<Option<JobStream>>;

    fn share_service_instance(&self, params: &ShareParams) -> Reply<()>;

    fn unshare_service_instance(&self, params: &ShareParams) -> Reply<()>;

    fn create_service_key(&self, params: &CreateServiceKeyParams) -> Reply<Option<JobStream>>;

    fn delete_service_key_by_service_instance_and_name(
        &self,
        instance_name: &str,
        key_name: &str,
        space_guid: &str,
    ) -> Reply<Option<JobStream>>;

    fn get_service_broker_by_name(&self, name: &str) -> Reply<ServiceBroker>;

    fn delete_service_broker(&self, guid: &str) -> Reply<()>;

    fn purge_service_offering_by_name_and_broker(
        &self,
        offering_name: &str,
        broker_name: Option<&str>,
    ) -> Reply<()>;
}

/// Login and target preconditions shared by every command.
pub trait SharedActor {
    /// Fails with the first unmet precondition: logged in, then org, then space.
    fn check_target(&self, require_org: bool, require_space: bool) -> Result<(), ActorError>;

    fn is_logged_in(&self) -> bool;
}
