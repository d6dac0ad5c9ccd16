//! # Sandbox Platform Document
//!
//! The whole state of the local platform lives in one [`Platform`] value:
//! accounts, sessions, orgs, spaces, apps, and the service catalog with its
//! instances, bindings, and keys. [`PlatformStore`] loads it from and saves it
//! to `sandbox.json`, or keeps it in memory when it has no path.
//!
//! ## Storage Layout
//!
//! ```text
//! $CF_HOME/.cf/
//! ├── config.json     # CLI configuration
//! └── sandbox.json    # Platform document
//! ```
//!
//! Saves write a temporary file next to the document and rename it into
//! place, so an interrupted save never leaves a truncated document.

use super::model::{
    Application, Organization, Process, ServiceBroker, ServiceCredentialBinding, ServiceInstance,
    ServiceKey, ServiceOffering, ServicePlan, Space,
};
use super::ActorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const PLATFORM_FILENAME: &str = "sandbox.json";
pub const DEFAULT_API_VERSION: &str = "3.140.0";
pub const DEFAULT_JOB_POLL_INTERVAL_MILLIS: u64 = 100;

/// A user or client the platform can authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    pub guid: String,
    pub name: String,
    pub secret: String,
    pub origin: String,
    #[serde(default)]
    pub is_client: bool,
}

/// An application together with what `app` reports about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppRecord {
    pub application: Application,
    #[serde(default)]
    pub processes: Vec<Process>,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(default)]
    pub stack: String,
    #[serde(default)]
    pub buildpacks: Vec<String>,
    #[serde(default)]
    pub last_uploaded: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Platform {
    #[serde(rename = "APIVersion")]
    pub api_version: String,
    pub job_poll_interval_millis: u64,
    pub accounts: Vec<Account>,
    /// Access token to account guid.
    pub sessions: BTreeMap<String, String>,
    pub organizations: Vec<Organization>,
    pub spaces: Vec<Space>,
    pub apps: Vec<AppRecord>,
    pub service_brokers: Vec<ServiceBroker>,
    pub service_offerings: Vec<ServiceOffering>,
    pub service_instances: Vec<ServiceInstance>,
    pub bindings: Vec<ServiceCredentialBinding>,
    pub service_keys: Vec<ServiceKey>,
}

impl Default for Platform {
    fn default() -> Self {
        let broker = ServiceBroker {
            guid: new_guid(),
            name: "sandbox-broker".to_string(),
            url: "https://sandbox-broker.example.com".to_string(),
        };
        let plan = |name: &str, maintenance_version| ServicePlan {
            name: name.to_string(),
            maintenance_version,
        };

        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            job_poll_interval_millis: DEFAULT_JOB_POLL_INTERVAL_MILLIS,
            accounts: vec![
                Account {
                    guid: new_guid(),
                    name: "admin".to_string(),
                    secret: "admin".to_string(),
                    origin: "uaa".to_string(),
                    is_client: false,
                },
                Account {
                    guid: new_guid(),
                    name: "admin".to_string(),
                    secret: "admin-secret".to_string(),
                    origin: "uaa".to_string(),
                    is_client: true,
                },
            ],
            sessions: BTreeMap::new(),
            organizations: Vec::new(),
            spaces: Vec::new(),
            apps: Vec::new(),
            service_offerings: vec![
                ServiceOffering {
                    guid: new_guid(),
                    name: "sandbox-db".to_string(),
                    broker_name: broker.name.clone(),
                    asynchronous: true,
                    plans: vec![plan("small", 2), plan("large", 2)],
                },
                ServiceOffering {
                    guid: new_guid(),
                    name: "sandbox-cache".to_string(),
                    broker_name: broker.name.clone(),
                    asynchronous: false,
                    plans: vec![plan("default", 1)],
                },
            ],
            service_brokers: vec![broker],
            service_instances: Vec::new(),
            bindings: Vec::new(),
            service_keys: Vec::new(),
        }
    }
}

pub fn new_guid() -> String {
    Uuid::new_v4().to_string()
}

impl Platform {
    pub fn organization_by_name(&self, name: &str) -> Result<&Organization, ActorError> {
        self.organizations
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| ActorError::OrganizationNotFound {
                name: name.to_string(),
            })
    }

    pub fn organization_by_guid(&self, guid: &str) -> Option<&Organization> {
        self.organizations.iter().find(|o| o.guid == guid)
    }

    pub fn space_by_name(&self, name: &str, org_guid: &str) -> Result<&Space, ActorError> {
        self.spaces
            .iter()
            .find(|s| s.name == name && s.organization_guid == org_guid)
            .ok_or_else(|| ActorError::SpaceNotFound {
                name: name.to_string(),
            })
    }

    pub fn space_by_guid(&self, guid: &str) -> Option<&Space> {
        self.spaces.iter().find(|s| s.guid == guid)
    }

    pub fn app_by_name(&self, name: &str, space_guid: &str) -> Result<&AppRecord, ActorError> {
        self.apps
            .iter()
            .find(|a| a.application.name == name && a.application.space_guid == space_guid)
            .ok_or_else(|| ActorError::ApplicationNotFound {
                name: name.to_string(),
            })
    }

    /// An instance visible from the space: owned by it or shared into it.
    pub fn instance_by_name(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Result<&ServiceInstance, ActorError> {
        self.service_instances
            .iter()
            .find(|i| {
                i.name == name
                    && (i.space_guid == space_guid || i.shared_with.iter().any(|s| s == space_guid))
            })
            .ok_or_else(|| ActorError::ServiceInstanceNotFound {
                name: name.to_string(),
            })
    }

    pub fn instance_index(&self, guid: &str) -> Option<usize> {
        self.service_instances.iter().position(|i| i.guid == guid)
    }

    /// Resolves an offering by name, narrowed to one broker when given.
    pub fn offering(
        &self,
        name: &str,
        broker: Option<&str>,
    ) -> Result<&ServiceOffering, ActorError> {
        let matches: Vec<&ServiceOffering> = self
            .service_offerings
            .iter()
            .filter(|o| o.name == name && broker.map_or(true, |b| o.broker_name == b))
            .collect();
        match matches.as_slice() {
            [] => Err(ActorError::ServiceOfferingNotFound {
                name: name.to_string(),
            }),
            [only] => Ok(*only),
            many => Err(ActorError::DuplicateServiceOffering {
                name: name.to_string(),
                brokers: many.iter().map(|o| o.broker_name.clone()).collect(),
            }),
        }
    }

    pub fn offering_for_instance(&self, instance: &ServiceInstance) -> Option<&ServiceOffering> {
        self.service_offerings
            .iter()
            .find(|o| o.name == instance.offering_name)
    }

    /// Latest maintenance version the instance's plan offers.
    pub fn available_maintenance_version(&self, instance: &ServiceInstance) -> u32 {
        self.offering_for_instance(instance)
            .and_then(|o| o.plans.iter().find(|p| p.name == instance.plan_name))
            .map(|p| p.maintenance_version)
            .unwrap_or(0)
    }

    /// Drops an instance and everything hanging off it.
    pub fn remove_instance(&mut self, guid: &str) {
        self.service_instances.retain(|i| i.guid != guid);
        self.bindings.retain(|b| b.service_instance_guid != guid);
        self.service_keys.retain(|k| k.service_instance_guid != guid);
    }
}

/// Where a [`Platform`] document is kept.
#[derive(Debug, Clone, Default)]
pub struct PlatformStore {
    path: Option<PathBuf>,
}

impl PlatformStore {
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// A store at `<dir>/sandbox.json`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: Some(dir.as_ref().join(PLATFORM_FILENAME)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The saved document, or a freshly seeded one.
    pub fn load(&self) -> Result<Platform, ActorError> {
        let Some(path) = &self.path else {
            return Ok(Platform::default());
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "seeding sandbox platform");
            return Ok(Platform::default());
        }
        let content = fs::read_to_string(path).map_err(persistence)?;
        serde_json::from_str(&content)
            .map_err(|e| ActorError::Persistence(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, platform: &Platform) -> Result<(), ActorError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(persistence)?;

        let content = serde_json::to_string_pretty(platform).map_err(persistence)?;
        let tmp = dir.join(format!(".sandbox-{}.tmp", Uuid::new_v4()));
        let written = fs::write(&tmp, content).and_then(|()| fs::rename(&tmp, path));
        if let Err(err) = written {
            // The temp file may exist even when the write itself failed.
            let _ = fs::remove_file(&tmp);
            return Err(persistence(err));
        }
        tracing::trace!(path = %path.display(), "saved sandbox platform");
        Ok(())
    }
}

fn persistence(err: impl std::fmt::Display) -> ActorError {
    ActorError::Persistence(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_seeded_catalog() {
        let platform = Platform::default();
        assert_eq!(platform.service_brokers.len(), 1);
        let db = platform.offering("sandbox-db", None).unwrap();
        assert!(db.asynchronous);
        assert_eq!(db.plans.len(), 2);
        let cache = platform
            .offering("sandbox-cache", Some("sandbox-broker"))
            .unwrap();
        assert!(!cache.asynchronous);
    }

    #[test]
    fn test_offering_lookup_errors() {
        let mut platform = Platform::default();
        assert!(matches!(
            platform.offering("nope", None),
            Err(ActorError::ServiceOfferingNotFound { .. })
        ));
        assert!(matches!(
            platform.offering("sandbox-db", Some("other-broker")),
            Err(ActorError::ServiceOfferingNotFound { .. })
        ));

        let mut copy = platform.service_offerings[0].clone();
        copy.broker_name = "other-broker".to_string();
        platform.service_offerings.push(copy);
        match platform.offering("sandbox-db", None) {
            Err(ActorError::DuplicateServiceOffering { brokers, .. }) => {
                assert_eq!(brokers, vec!["sandbox-broker", "other-broker"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(platform.offering("sandbox-db", Some("other-broker")).is_ok());
    }

    #[test]
    fn test_missing_file_seeds_defaults() {
        let dir = tempdir().unwrap();
        let store = PlatformStore::in_dir(dir.path());
        let platform = store.load().unwrap();
        assert_eq!(platform.api_version, DEFAULT_API_VERSION);
        assert!(!dir.path().join(PLATFORM_FILENAME).exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = PlatformStore::in_dir(dir.path().join(".cf"));
        let mut platform = Platform::default();
        platform.organizations.push(Organization {
            guid: "org-guid".to_string(),
            name: "my-org".to_string(),
        });
        platform.job_poll_interval_millis = 0;
        store.save(&platform).unwrap();

        let raw = fs::read_to_string(dir.path().join(".cf").join(PLATFORM_FILENAME)).unwrap();
        assert!(raw.contains("\"JobPollIntervalMillis\": 0"));
        assert!(raw.contains("\"APIVersion\""));

        let loaded = store.load().unwrap();
        assert_eq!(loaded, platform);
        let leftovers = fs::read_dir(dir.path().join(".cf")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join(PLATFORM_FILENAME);
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), "x").unwrap();

        let err = PlatformStore::in_dir(dir.path())
            .save(&Platform::default())
            .unwrap_err();
        assert!(matches!(err, ActorError::Persistence(_)));
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![PLATFORM_FILENAME.to_string()]);
    }

    #[test]
    fn test_corrupt_document_is_persistence_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PLATFORM_FILENAME), "{not json").unwrap();
        let err = PlatformStore::in_dir(dir.path()).load().unwrap_err();
        assert!(matches!(err, ActorError::Persistence(_)));
    }

    #[test]
    fn test_shared_instance_visible_from_other_space() {
        let mut platform = Platform::default();
        platform.service_instances.push(ServiceInstance {
            guid: "si-guid".to_string(),
            name: "db".to_string(),
            space_guid: "owner".to_string(),
            offering_name: "sandbox-db".to_string(),
            plan_name: "small".to_string(),
            maintenance_version: 1,
            shared_with: vec!["guest".to_string()],
            last_operation: crate::actor::model::LastOperation {
                kind: "create".to_string(),
                state: crate::actor::model::LastOperationState::Succeeded,
            },
            parameters: None,
        });
        assert!(platform.instance_by_name("db", "guest").is_ok());
        assert!(platform.instance_by_name("db", "stranger").is_err());
    }
}
