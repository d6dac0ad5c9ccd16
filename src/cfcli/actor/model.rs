use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub guid: String,
    pub origin: String,
    pub is_client: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantType {
    Password,
    ClientCredentials,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Password => "password",
            GrantType::ClientCredentials => "client_credentials",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
    pub origin: Option<String>,
    pub grant_type: GrantType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,
    pub organization_guid: String,
    #[serde(default)]
    pub allow_ssh: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppState {
    Started,
    Stopped,
}

impl AppState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Started => "started",
            AppState::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub guid: String,
    pub name: String,
    pub space_guid: String,
    pub state: AppState,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub process_type: String,
    pub instances: u32,
    pub running: u32,
    pub memory_mb: u64,
    pub disk_mb: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSummary {
    pub application: Application,
    pub processes: Vec<Process>,
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedApplicationSummary {
    pub summary: ApplicationSummary,
    pub stack: String,
    pub buildpacks: Vec<String>,
    pub last_uploaded: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastOperationState {
    InProgress,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOperation {
    #[serde(rename = "type")]
    pub kind: String,
    pub state: LastOperationState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub guid: String,
    pub name: String,
    pub space_guid: String,
    pub offering_name: String,
    pub plan_name: String,
    #[serde(default)]
    pub maintenance_version: u32,
    #[serde(default)]
    pub shared_with: Vec<String>,
    pub last_operation: LastOperation,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

impl LastOperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl LastOperation {
    /// Rendered as `create succeeded`.
    pub fn status(&self) -> String {
        format!("{} {}", self.kind, self.state.as_str())
    }
}

/// An app bound to a service instance, as seen from one space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundApp {
    pub app_name: String,
    pub binding_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstanceSummary {
    pub instance: ServiceInstance,
    pub broker_name: String,
    pub bound_apps: Vec<BoundApp>,
    pub upgrade_available: bool,
}

/// A space an instance is shared into, with the bindings made from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedSpace {
    pub org_name: String,
    pub space_name: String,
    pub bindings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstanceDetails {
    pub summary: ServiceInstanceSummary,
    /// Owning org and space when the instance is shared into the asking space.
    pub shared_from: Option<(String, String)>,
    pub shared_with: Vec<SharedSpace>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCredentialBinding {
    pub guid: String,
    pub name: Option<String>,
    pub app_guid: String,
    pub service_instance_guid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceKey {
    pub guid: String,
    pub name: String,
    pub service_instance_guid: String,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlan {
    pub name: String,
    /// Latest maintenance version an instance on this plan can upgrade to.
    #[serde(default)]
    pub maintenance_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub guid: String,
    pub name: String,
    pub broker_name: String,
    /// Operations on asynchronous offerings report through a job stream.
    pub asynchronous: bool,
    pub plans: Vec<ServicePlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBroker {
    pub guid: String,
    pub name: String,
    pub url: String,
}
