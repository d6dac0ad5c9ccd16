//! # Sandbox Actor
//!
//! [`SandboxActor`] answers every [`Actor`] call from a local [`Platform`]
//! document instead of a remote control plane. Each mutation runs against a
//! draft copy that replaces the live document only once it has been saved, so
//! a failed save leaves both the file and the in-process state untouched.
//!
//! Operations on asynchronous service offerings still apply immediately, but
//! hand back a job stream produced by [`spawn_job`] so commands exercise the
//! same waiting path they would against a real platform.

use super::job::{spawn_job, JobStream};
use super::model::{
    AppState, Application, ApplicationSummary, AuthTokens, Credentials,
    BoundApp, DetailedApplicationSummary, GrantType, LastOperation, LastOperationState,
    Organization, Process, ServiceBroker, ServiceCredentialBinding, ServiceInstance,
    ServiceInstanceDetails, ServiceInstanceSummary, ServiceKey, SharedSpace, Space, User,
};
use super::platform::{new_guid, AppRecord, Platform, PlatformStore};
use super::{
    Actor, ActorError, CreateBindingParams, CreateServiceInstanceParams, CreateServiceKeyParams,
    ListBindingParams, Reply, ShareParams, Warnings,
};
use crate::config::Config;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

pub struct SandboxActor<'a> {
    store: PlatformStore,
    platform: Mutex<Platform>,
    config: &'a dyn Config,
}

impl<'a> SandboxActor<'a> {
    /// Loads the platform from `store`, seeding it on first use.
    pub fn open(store: PlatformStore, config: &'a dyn Config) -> Result<Self, ActorError> {
        let platform = store.load()?;
        Ok(Self {
            store,
            platform: Mutex::new(platform),
            config,
        })
    }

    /// A sandbox that never touches the filesystem.
    pub fn in_memory(platform: Platform, config: &'a dyn Config) -> Self {
        Self {
            store: PlatformStore::in_memory(),
            platform: Mutex::new(platform),
            config,
        }
    }

    /// A copy of the current document.
    pub fn snapshot(&self) -> Platform {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Platform> {
        self.platform.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read<T>(&self, f: impl FnOnce(&Platform) -> Result<T, ActorError>) -> Reply<T> {
        Reply::from(f(&self.lock()))
    }

    fn update<T>(
        &self,
        f: impl FnOnce(&mut Platform, &mut Warnings) -> Result<T, ActorError>,
    ) -> Reply<T> {
        let mut platform = self.lock();
        let mut draft = platform.clone();
        let mut warnings = Vec::new();

        let result = f(&mut draft, &mut warnings).and_then(|value| {
            self.store.save(&draft)?;
            Ok(value)
        });
        if result.is_ok() {
            *platform = draft;
        }
        Reply { result, warnings }
    }

    /// Like [`Self::update`] for operations that may run as a job. The closure
    /// reports whether the affected offering is asynchronous.
    fn update_job(
        &self,
        f: impl FnOnce(&mut Platform, &mut Warnings) -> Result<bool, ActorError>,
    ) -> Reply<Option<JobStream>> {
        self.update(|platform, warnings| {
            let asynchronous = f(platform, warnings)?;
            Ok(asynchronous.then(|| Duration::from_millis(platform.job_poll_interval_millis)))
        })
        .map(|interval| {
            interval.map(|interval| {
                debug!(?interval, "starting sandbox job");
                spawn_job(interval, Vec::new())
            })
        })
    }
}

fn already_exists(message: String) -> ActorError {
    ActorError::ResourceAlreadyExists(message)
}

fn operation(kind: &str) -> LastOperation {
    LastOperation {
        kind: kind.to_string(),
        state: LastOperationState::Succeeded,
    }
}

/// Bindings of `instance` made by apps in `space_guid`, ordered by app name.
fn bound_apps(platform: &Platform, instance: &ServiceInstance, space_guid: &str) -> Vec<BoundApp> {
    let mut apps: Vec<BoundApp> = platform
        .bindings
        .iter()
        .filter(|b| b.service_instance_guid == instance.guid)
        .filter_map(|b| {
            platform
                .apps
                .iter()
                .find(|r| r.application.guid == b.app_guid && r.application.space_guid == space_guid)
                .map(|r| BoundApp {
                    app_name: r.application.name.clone(),
                    binding_name: b.name.clone(),
                })
        })
        .collect();
    apps.sort_by(|a, b| a.app_name.cmp(&b.app_name));
    apps
}

fn instance_summary(
    platform: &Platform,
    instance: &ServiceInstance,
    space_guid: &str,
) -> ServiceInstanceSummary {
    ServiceInstanceSummary {
        instance: instance.clone(),
        broker_name: platform
            .offering_for_instance(instance)
            .map(|o| o.broker_name.clone())
            .unwrap_or_default(),
        bound_apps: bound_apps(platform, instance, space_guid),
        upgrade_available: platform.available_maintenance_version(instance)
            > instance.maintenance_version,
    }
}

/// Org and space names for a space guid.
fn space_names(platform: &Platform, space_guid: &str) -> (String, String) {
    let space = platform.space_by_guid(space_guid);
    let org = space.and_then(|s| platform.organization_by_guid(&s.organization_guid));
    (
        org.map(|o| o.name.clone()).unwrap_or_default(),
        space.map(|s| s.name.clone()).unwrap_or_default(),
    )
}

fn is_async(platform: &Platform, instance: &ServiceInstance) -> bool {
    platform
        .offering_for_instance(instance)
        .is_some_and(|o| o.asynchronous)
}

fn summary(record: &AppRecord) -> ApplicationSummary {
    ApplicationSummary {
        application: record.application.clone(),
        processes: record.processes.clone(),
        routes: record.routes.clone(),
    }
}

/// Matches a comma-separated label selector: `key`, `!key`, `key=value`,
/// `key==value`, and `key!=value` requirements, all of which must hold.
pub fn selector_matches(selector: &str, labels: &BTreeMap<String, String>) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|requirement| !requirement.is_empty())
        .all(|requirement| {
            if let Some((key, value)) = requirement.split_once("!=") {
                labels.get(key.trim()).map(String::as_str) != Some(value.trim())
            } else if let Some((key, value)) = requirement.split_once('=') {
                let value = value.trim_start_matches('=');
                labels.get(key.trim()).map(String::as_str) == Some(value.trim())
            } else if let Some(key) = requirement.strip_prefix('!') {
                !labels.contains_key(key.trim())
            } else {
                labels.contains_key(requirement)
            }
        })
}

impl Actor for SandboxActor<'_> {
    fn cloud_controller_api_version(&self) -> String {
        self.lock().api_version.clone()
    }

    fn authenticate(&self, credentials: &Credentials) -> Result<AuthTokens, ActorError> {
        let wants_client = credentials.grant_type == GrantType::ClientCredentials;
        self.update(|platform, _| {
            let account = platform
                .accounts
                .iter()
                .find(|a| {
                    a.name == credentials.username
                        && a.secret == credentials.secret
                        && a.is_client == wants_client
                        && credentials.origin.as_ref().map_or(true, |o| *o == a.origin)
                })
                .cloned()
                .ok_or(ActorError::InvalidCredentials)?;

            let access_token = format!("bearer {}", new_guid());
            // One live session per account.
            platform.sessions.retain(|_, guid| *guid != account.guid);
            platform
                .sessions
                .insert(access_token.clone(), account.guid.clone());
            Ok(AuthTokens {
                access_token,
                refresh_token: new_guid(),
                user: User {
                    name: account.name,
                    guid: account.guid,
                    origin: account.origin,
                    is_client: account.is_client,
                },
            })
        })
        .result
    }

    fn get_current_user(&self) -> Result<User, ActorError> {
        let not_logged_in = || ActorError::NotLoggedIn {
            binary_name: self.config.binary_name(),
        };
        let token = self.config.access_token();
        let platform = self.lock();
        let guid = platform.sessions.get(&token).ok_or_else(not_logged_in)?;
        let account = platform
            .accounts
            .iter()
            .find(|a| &a.guid == guid)
            .ok_or_else(not_logged_in)?;
        Ok(User {
            name: account.name.clone(),
            guid: account.guid.clone(),
            origin: account.origin.clone(),
            is_client: account.is_client,
        })
    }

    fn revoke_session(&self, access_token: &str) -> Result<(), ActorError> {
        if !self.lock().sessions.contains_key(access_token) {
            return Ok(());
        }
        self.update(|platform, _| {
            platform.sessions.remove(access_token);
            Ok(())
        })
        .result
    }

    fn create_organization(&self, name: &str) -> Reply<Organization> {
        self.update(|platform, _| {
            if platform.organization_by_name(name).is_ok() {
                return Err(already_exists(format!(
                    "Organization '{}' already exists.",
                    name
                )));
            }
            let org = Organization {
                guid: new_guid(),
                name: name.to_string(),
            };
            platform.organizations.push(org.clone());
            Ok(org)
        })
    }

    fn get_organization_by_name(&self, name: &str) -> Reply<Organization> {
        self.read(|platform| platform.organization_by_name(name).cloned())
    }

    fn rename_organization(&self, old_name: &str, new_name: &str) -> Reply<Organization> {
        self.update(|platform, _| {
            let guid = platform.organization_by_name(old_name)?.guid.clone();
            if platform.organization_by_name(new_name).is_ok() {
                return Err(already_exists(format!(
                    "Organization '{}' already exists.",
                    new_name
                )));
            }
            let org = platform
                .organizations
                .iter_mut()
                .find(|o| o.guid == guid)
                .ok_or_else(|| ActorError::OrganizationNotFound {
                    name: old_name.to_string(),
                })?;
            org.name = new_name.to_string();
            Ok(org.clone())
        })
    }

    fn get_organization_spaces(&self, org_guid: &str) -> Reply<Vec<Space>> {
        self.read(|platform| {
            let mut spaces: Vec<Space> = platform
                .spaces
                .iter()
                .filter(|s| s.organization_guid == org_guid)
                .cloned()
                .collect();
            spaces.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(spaces)
        })
    }

    fn create_space(&self, name: &str, org_guid: &str) -> Reply<Space> {
        self.update(|platform, _| {
            if platform.organization_by_guid(org_guid).is_none() {
                return Err(ActorError::OrganizationNotFound {
                    name: org_guid.to_string(),
                });
            }
            if platform.space_by_name(name, org_guid).is_ok() {
                return Err(already_exists(format!("Space '{}' already exists.", name)));
            }
            let space = Space {
                guid: new_guid(),
                name: name.to_string(),
                organization_guid: org_guid.to_string(),
                allow_ssh: true,
            };
            platform.spaces.push(space.clone());
            Ok(space)
        })
    }

    fn get_space_by_name_and_organization(&self, name: &str, org_guid: &str) -> Reply<Space> {
        self.read(|platform| platform.space_by_name(name, org_guid).cloned())
    }

    fn create_application_in_space(&self, name: &str, space_guid: &str) -> Reply<Application> {
        self.update(|platform, _| {
            if platform.app_by_name(name, space_guid).is_ok() {
                return Err(already_exists(format!("App {} already exists", name)));
            }
            let application = Application {
                guid: new_guid(),
                name: name.to_string(),
                space_guid: space_guid.to_string(),
                state: AppState::Stopped,
                labels: BTreeMap::new(),
            };
            platform.apps.push(AppRecord {
                application: application.clone(),
                processes: vec![Process {
                    process_type: "web".to_string(),
                    instances: 1,
                    running: 0,
                    memory_mb: 1024,
                    disk_mb: 1024,
                }],
                routes: vec![format!("{}.sandbox.example.com", name)],
                stack: "cflinuxfs4".to_string(),
                buildpacks: Vec::new(),
                last_uploaded: None,
            });
            Ok(application)
        })
    }

    fn get_application_by_name_and_space(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<Application> {
        self.read(|platform| {
            platform
                .app_by_name(name, space_guid)
                .map(|record| record.application.clone())
        })
    }

    fn get_app_summaries_for_space(
        &self,
        space_guid: &str,
        label_selector: Option<&str>,
    ) -> Reply<Vec<ApplicationSummary>> {
        self.read(|platform| {
            let mut summaries: Vec<ApplicationSummary> = platform
                .apps
                .iter()
                .filter(|r| r.application.space_guid == space_guid)
                .filter(|r| {
                    label_selector.map_or(true, |s| selector_matches(s, &r.application.labels))
                })
                .map(summary)
                .collect();
            summaries.sort_by(|a, b| a.application.name.cmp(&b.application.name));
            Ok(summaries)
        })
    }

    fn get_detailed_app_summary(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<DetailedApplicationSummary> {
        self.read(|platform| {
            let record = platform.app_by_name(name, space_guid)?;
            Ok(DetailedApplicationSummary {
                summary: summary(record),
                stack: record.stack.clone(),
                buildpacks: record.buildpacks.clone(),
                last_uploaded: record.last_uploaded,
            })
        })
    }

    fn delete_application_by_name_and_space(
        &self,
        name: &str,
        space_guid: &str,
        delete_routes: bool,
    ) -> Reply<()> {
        self.update(|platform, warnings| {
            let record = platform.app_by_name(name, space_guid)?.clone();
            let guid = record.application.guid;
            platform.apps.retain(|r| r.application.guid != guid);
            platform.bindings.retain(|b| b.app_guid != guid);
            if !delete_routes && !record.routes.is_empty() {
                warnings.push(format!("Routes for app {} were not deleted.", name));
            }
            Ok(())
        })
    }

    fn create_managed_service_instance(
        &self,
        params: &CreateServiceInstanceParams,
    ) -> Reply<Option<JobStream>> {
        self.update_job(|platform, _| {
            if platform
                .instance_by_name(&params.instance_name, &params.space_guid)
                .is_ok()
            {
                return Err(already_exists(format!(
                    "Service instance {} already exists",
                    params.instance_name
                )));
            }
            let offering = platform.offering(&params.offering_name, params.broker_name.as_deref())?;
            if !offering.plans.iter().any(|p| p.name == params.plan_name) {
                return Err(ActorError::ServicePlanNotFound {
                    plan: params.plan_name.clone(),
                    offering: params.offering_name.clone(),
                });
            }
            let asynchronous = offering.asynchronous;

            platform.service_instances.push(ServiceInstance {
                guid: new_guid(),
                name: params.instance_name.clone(),
                space_guid: params.space_guid.clone(),
                offering_name: params.offering_name.clone(),
                plan_name: params.plan_name.clone(),
                maintenance_version: 1,
                shared_with: Vec::new(),
                last_operation: operation("create"),
                parameters: params.parameters.clone(),
            });
            Ok(asynchronous)
        })
    }

    fn delete_service_instance(&self, name: &str, space_guid: &str) -> Reply<Option<JobStream>> {
        self.update_job(|platform, _| {
            let instance = platform.instance_by_name(name, space_guid)?.clone();
            let asynchronous = is_async(platform, &instance);
            platform.remove_instance(&instance.guid);
            Ok(asynchronous)
        })
    }

    fn get_service_instances_for_space(
        &self,
        space_guid: &str,
    ) -> Reply<Vec<ServiceInstanceSummary>> {
        self.read(|platform| {
            let mut summaries: Vec<ServiceInstanceSummary> = platform
                .service_instances
                .iter()
                .filter(|i| i.space_guid == space_guid || i.shared_with.iter().any(|s| s == space_guid))
                .map(|i| instance_summary(platform, i, space_guid))
                .collect();
            summaries.sort_by(|a, b| a.instance.name.cmp(&b.instance.name));
            Ok(summaries)
        })
    }

    fn get_service_instance_details(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<ServiceInstanceDetails> {
        self.read(|platform| {
            let instance = platform.instance_by_name(name, space_guid)?;
            let summary = instance_summary(platform, instance, space_guid);
            if instance.space_guid != space_guid {
                return Ok(ServiceInstanceDetails {
                    summary,
                    shared_from: Some(space_names(platform, &instance.space_guid)),
                    shared_with: Vec::new(),
                });
            }
            let shared_with = instance
                .shared_with
                .iter()
                .map(|guid| {
                    let (org_name, space_name) = space_names(platform, guid);
                    SharedSpace {
                        org_name,
                        space_name,
                        bindings: bound_apps(platform, instance, guid).len(),
                    }
                })
                .collect();
            Ok(ServiceInstanceDetails {
                summary,
                shared_from: None,
                shared_with,
            })
        })
    }

    fn upgrade_managed_service_instance(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<Option<JobStream>> {
        self.update_job(|platform, _| {
            let instance = platform.instance_by_name(name, space_guid)?.clone();
            let offering = platform.offering_for_instance(&instance).ok_or_else(|| {
                ActorError::ServiceOfferingNotFound {
                    name: instance.offering_name.clone(),
                }
            })?;
            let available = platform.available_maintenance_version(&instance);
            if available <= instance.maintenance_version {
                return Err(ActorError::UpgradeNotAvailable);
            }
            let asynchronous = offering.asynchronous;

            let index = platform
                .instance_index(&instance.guid)
                .ok_or_else(|| ActorError::ServiceInstanceNotFound {
                    name: name.to_string(),
                })?;
            let stored = &mut platform.service_instances[index];
            stored.maintenance_version = available;
            stored.last_operation = operation("update");
            Ok(asynchronous)
        })
    }

    fn create_service_app_binding(
        &self,
        params: &CreateBindingParams,
    ) -> Reply<Option<JobStream>> {
        self.update_job(|platform, _| {
            let app_guid = platform
                .app_by_name(&params.app_name, &params.space_guid)?
                .application
                .guid
                .clone();
            let instance = platform
                .instance_by_name(&params.instance_name, &params.space_guid)?
                .clone();
            if platform
                .bindings
                .iter()
                .any(|b| b.app_guid == app_guid && b.service_instance_guid == instance.guid)
            {
                return Err(already_exists(format!(
                    "App {} is already bound to service instance {}.",
                    params.app_name, params.instance_name
                )));
            }
            platform.bindings.push(ServiceCredentialBinding {
                guid: new_guid(),
                name: params.binding_name.clone(),
                app_guid,
                service_instance_guid: instance.guid.clone(),
            });
            Ok(is_async(platform, &instance))
        })
    }

    fn list_service_app_bindings(
        &self,
        params: &ListBindingParams,
    ) -> Reply<Vec<ServiceCredentialBinding>> {
        self.read(|platform| {
            let app = platform.app_by_name(&params.app_name, &params.space_guid)?;
            let instance = platform.instance_by_name(&params.instance_name, &params.space_guid)?;
            let bindings: Vec<ServiceCredentialBinding> = platform
                .bindings
                .iter()
                .filter(|b| {
                    b.app_guid == app.application.guid && b.service_instance_guid == instance.guid
                })
                .cloned()
                .collect();
            if bindings.is_empty() {
                return Err(ActorError::ServiceBindingNotFound {
                    app: params.app_name.clone(),
                    instance: params.instance_name.clone(),
                });
            }
            Ok(bindings)
        })
    }

    fn delete_service_app_binding(&self, binding_guid: &str) -> Reply<Option<JobStream>> {
        self.update_job(|platform, _| {
            let binding = platform
                .bindings
                .iter()
                .find(|b| b.guid == binding_guid)
                .cloned()
                .ok_or_else(|| ActorError::ServiceBindingGuidNotFound {
                    guid: binding_guid.to_string(),
                })?;
            platform.bindings.retain(|b| b.guid != binding_guid);
            let platform = &*platform;
            let asynchronous = platform
                .instance_index(&binding.service_instance_guid)
                .is_some_and(|i| is_async(platform, &platform.service_instances[i]));
            Ok(asynchronous)
        })
    }

    fn share_service_instance(&self, params: &ShareParams) -> Reply<()> {
        self.update(|platform, _| {
            let (index, target) = share_target(platform, params)?;
            let instance = &mut platform.service_instances[index];
            if instance.space_guid == target || instance.shared_with.contains(&target) {
                return Err(already_exists(format!(
                    "Service instance {} is already shared with that space.",
                    params.instance_name
                )));
            }
            instance.shared_with.push(target);
            Ok(())
        })
    }

    fn unshare_service_instance(&self, params: &ShareParams) -> Reply<()> {
        self.update(|platform, _| {
            let (index, target) = share_target(platform, params)?;
            let instance = &mut platform.service_instances[index];
            if !instance.shared_with.contains(&target) {
                return Err(ActorError::ServiceInstanceNotShared {
                    instance: params.instance_name.clone(),
                    org: params.org_name.clone(),
                    space: params.space_name.clone(),
                });
            }
            instance.shared_with.retain(|s| *s != target);
            let instance_guid = instance.guid.clone();

            let apps_in_target: Vec<String> = platform
                .apps
                .iter()
                .filter(|r| r.application.space_guid == target)
                .map(|r| r.application.guid.clone())
                .collect();
            platform.bindings.retain(|b| {
                b.service_instance_guid != instance_guid || !apps_in_target.contains(&b.app_guid)
            });
            Ok(())
        })
    }

    fn create_service_key(&self, params: &CreateServiceKeyParams) -> Reply<Option<JobStream>> {
        self.update_job(|platform, _| {
            let instance = platform
                .instance_by_name(&params.instance_name, &params.space_guid)?
                .clone();
            if platform
                .service_keys
                .iter()
                .any(|k| k.service_instance_guid == instance.guid && k.name == params.key_name)
            {
                return Err(already_exists(format!(
                    "Service key {} already exists",
                    params.key_name
                )));
            }
            platform.service_keys.push(ServiceKey {
                guid: new_guid(),
                name: params.key_name.clone(),
                service_instance_guid: instance.guid.clone(),
                parameters: params.parameters.clone(),
            });
            Ok(is_async(platform, &instance))
        })
    }

    fn delete_service_key_by_service_instance_and_name(
        &self,
        instance_name: &str,
        key_name: &str,
        space_guid: &str,
    ) -> Reply<Option<JobStream>> {
        self.update_job(|platform, _| {
            let instance = platform.instance_by_name(instance_name, space_guid)?.clone();
            let before = platform.service_keys.len();
            platform
                .service_keys
                .retain(|k| !(k.service_instance_guid == instance.guid && k.name == key_name));
            if platform.service_keys.len() == before {
                return Err(ActorError::ServiceKeyNotFound {
                    key: key_name.to_string(),
                    instance: instance_name.to_string(),
                });
            }
            Ok(is_async(platform, &instance))
        })
    }

    fn get_service_broker_by_name(&self, name: &str) -> Reply<ServiceBroker> {
        self.read(|platform| {
            platform
                .service_brokers
                .iter()
                .find(|b| b.name == name)
                .cloned()
                .ok_or_else(|| ActorError::ServiceBrokerNotFound {
                    name: name.to_string(),
                })
        })
    }

    fn delete_service_broker(&self, guid: &str) -> Reply<()> {
        self.update(|platform, _| {
            let broker = platform
                .service_brokers
                .iter()
                .find(|b| b.guid == guid)
                .cloned()
                .ok_or_else(|| ActorError::ServiceBrokerNotFound {
                    name: guid.to_string(),
                })?;

            let offerings: Vec<String> = platform
                .service_offerings
                .iter()
                .filter(|o| o.broker_name == broker.name)
                .map(|o| o.name.clone())
                .collect();
            let in_use: Vec<String> = platform
                .service_instances
                .iter()
                .filter(|i| offerings.contains(&i.offering_name))
                .map(|i| i.name.clone())
                .collect();
            if !in_use.is_empty() {
                return Err(ActorError::ServiceBrokerInUse {
                    name: broker.name.clone(),
                    instances: in_use,
                });
            }

            platform.service_brokers.retain(|b| b.guid != guid);
            platform
                .service_offerings
                .retain(|o| o.broker_name != broker.name);
            Ok(())
        })
    }

    fn purge_service_offering_by_name_and_broker(
        &self,
        offering_name: &str,
        broker_name: Option<&str>,
    ) -> Reply<()> {
        self.update(|platform, _| {
            let offering = platform.offering(offering_name, broker_name)?.clone();
            let orphans: Vec<String> = platform
                .service_instances
                .iter()
                .filter(|i| i.offering_name == offering.name)
                .map(|i| i.guid.clone())
                .collect();
            for guid in &orphans {
                platform.remove_instance(guid);
            }
            platform.service_offerings.retain(|o| o.guid != offering.guid);
            debug!(offering = offering_name, purged = orphans.len(), "purged service offering");
            Ok(())
        })
    }
}

/// The instance owned by `params.space_guid` and the guid of the space named
/// by `params.org_name` / `params.space_name`.
fn share_target(platform: &Platform, params: &ShareParams) -> Result<(usize, String), ActorError> {
    let index = platform
        .service_instances
        .iter()
        .position(|i| i.name == params.instance_name && i.space_guid == params.space_guid)
        .ok_or_else(|| ActorError::ServiceInstanceNotFound {
            name: params.instance_name.clone(),
        })?;
    let org = platform.organization_by_name(&params.org_name)?;
    let space = platform.space_by_name(&params.space_name, &org.guid)?;
    Ok((index, space.guid.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::job::JobState;
    use crate::config::CliConfig;
    use tempfile::tempdir;

    fn platform() -> Platform {
        Platform {
            job_poll_interval_millis: 0,
            ..Platform::default()
        }
    }

    fn states(stream: JobStream) -> Vec<JobState> {
        stream.map(|e| e.state).collect()
    }

    /// An org with two spaces; returns the guids of `dev` and `prod`.
    fn seed(actor: &SandboxActor<'_>) -> (String, String) {
        let org = actor.create_organization("org").result.unwrap();
        let dev = actor.create_space("dev", &org.guid).result.unwrap();
        let prod = actor.create_space("prod", &org.guid).result.unwrap();
        (dev.guid, prod.guid)
    }

    fn create_instance(
        actor: &SandboxActor<'_>,
        offering: &str,
        plan: &str,
        name: &str,
        space_guid: &str,
    ) -> Reply<Option<JobStream>> {
        actor.create_managed_service_instance(&CreateServiceInstanceParams {
            offering_name: offering.to_string(),
            plan_name: plan.to_string(),
            instance_name: name.to_string(),
            space_guid: space_guid.to_string(),
            ..Default::default()
        })
    }

    fn login(actor: &SandboxActor<'_>, config: &CliConfig, secret: &str, grant: GrantType) {
        let tokens = actor
            .authenticate(&Credentials {
                username: "admin".to_string(),
                secret: secret.to_string(),
                origin: None,
                grant_type: grant,
            })
            .unwrap();
        config.set_token_information(&tokens.access_token, &tokens.refresh_token, "");
    }

    #[test]
    fn test_authenticate_and_current_user() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        assert!(matches!(
            actor.get_current_user(),
            Err(ActorError::NotLoggedIn { .. })
        ));

        login(&actor, &config, "admin", GrantType::Password);
        let user = actor.get_current_user().unwrap();
        assert_eq!(user.name, "admin");
        assert!(!user.is_client);

        login(&actor, &config, "admin-secret", GrantType::ClientCredentials);
        assert!(actor.get_current_user().unwrap().is_client);
    }

    #[test]
    fn test_reauthenticating_replaces_the_account_session() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        login(&actor, &config, "admin", GrantType::Password);
        let first = config.access_token();
        login(&actor, &config, "admin", GrantType::Password);
        let second = config.access_token();

        let sessions = actor.snapshot().sessions;
        assert_eq!(sessions.len(), 1);
        assert!(!sessions.contains_key(&first));
        assert!(sessions.contains_key(&second));
    }

    #[test]
    fn test_revoke_session_logs_out() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        login(&actor, &config, "admin", GrantType::Password);
        actor.revoke_session(&config.access_token()).unwrap();

        assert!(actor.snapshot().sessions.is_empty());
        assert!(matches!(
            actor.get_current_user(),
            Err(ActorError::NotLoggedIn { .. })
        ));
        assert_eq!(actor.revoke_session("bearer unknown"), Ok(()));
    }

    #[test]
    fn test_authenticate_rejects_bad_secret_and_origin() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let attempt = |secret: &str, origin: Option<&str>| {
            actor.authenticate(&Credentials {
                username: "admin".to_string(),
                secret: secret.to_string(),
                origin: origin.map(str::to_string),
                grant_type: GrantType::Password,
            })
        };
        assert_eq!(attempt("wrong", None), Err(ActorError::InvalidCredentials));
        assert_eq!(attempt("admin", Some("ldap")), Err(ActorError::InvalidCredentials));
        assert!(attempt("admin", Some("uaa")).is_ok());
        assert_eq!(
            attempt("admin-secret", None),
            Err(ActorError::InvalidCredentials)
        );
    }

    #[test]
    fn test_orgs_and_spaces() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let org = actor.create_organization("org").result.unwrap();
        assert!(matches!(
            actor.create_organization("org").result,
            Err(ActorError::ResourceAlreadyExists(_))
        ));

        actor.create_space("b", &org.guid).result.unwrap();
        actor.create_space("a", &org.guid).result.unwrap();
        assert!(matches!(
            actor.create_space("a", &org.guid).result,
            Err(ActorError::ResourceAlreadyExists(_))
        ));
        let names: Vec<String> = actor
            .get_organization_spaces(&org.guid)
            .result
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let renamed = actor.rename_organization("org", "new-org").result.unwrap();
        assert_eq!(renamed.guid, org.guid);
        assert!(actor.get_organization_by_name("org").result.is_err());
        assert!(matches!(
            actor.get_space_by_name_and_organization("zzz", &org.guid).result,
            Err(ActorError::SpaceNotFound { .. })
        ));
    }

    #[test]
    fn test_app_lifecycle_and_route_warning() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let (dev, _) = seed(&actor);

        actor.create_application_in_space("web", &dev).result.unwrap();
        actor.create_application_in_space("api", &dev).result.unwrap();
        let names: Vec<String> = actor
            .get_app_summaries_for_space(&dev, None)
            .result
            .unwrap()
            .into_iter()
            .map(|s| s.application.name)
            .collect();
        assert_eq!(names, vec!["api", "web"]);

        let detail = actor.get_detailed_app_summary("web", &dev).result.unwrap();
        assert_eq!(detail.summary.routes, vec!["web.sandbox.example.com"]);

        let reply = actor.delete_application_by_name_and_space("web", &dev, false);
        assert_eq!(reply.warnings, vec!["Routes for app web were not deleted."]);
        assert!(reply.result.is_ok());

        let reply = actor.delete_application_by_name_and_space("api", &dev, true);
        assert!(reply.warnings.is_empty());
        assert!(matches!(
            actor.delete_application_by_name_and_space("api", &dev, true).result,
            Err(ActorError::ApplicationNotFound { .. })
        ));
    }

    #[test]
    fn test_selector_matches() {
        let labels: BTreeMap<String, String> = [("env", "prod"), ("tier", "web")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(selector_matches("env=prod", &labels));
        assert!(selector_matches("env==prod,tier", &labels));
        assert!(selector_matches("env!=dev, !team", &labels));
        assert!(!selector_matches("env=dev", &labels));
        assert!(!selector_matches("team", &labels));
        assert!(selector_matches("", &labels));
    }

    #[test]
    fn test_async_instance_returns_job() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let (dev, _) = seed(&actor);

        let stream = create_instance(&actor, "sandbox-db", "small", "db", &dev)
            .result
            .unwrap()
            .expect("asynchronous offering streams");
        assert_eq!(
            states(stream),
            vec![JobState::Processing, JobState::Polling, JobState::Complete]
        );

        let sync = create_instance(&actor, "sandbox-cache", "default", "cache", &dev);
        assert!(sync.result.unwrap().is_none());

        assert!(matches!(
            create_instance(&actor, "sandbox-db", "small", "db", &dev).result,
            Err(ActorError::ResourceAlreadyExists(_))
        ));
        assert!(matches!(
            create_instance(&actor, "sandbox-db", "huge", "db2", &dev).result,
            Err(ActorError::ServicePlanNotFound { .. })
        ));
    }

    #[test]
    fn test_upgrade_only_once() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let (dev, _) = seed(&actor);
        create_instance(&actor, "sandbox-db", "small", "db", &dev)
            .result
            .unwrap();
        create_instance(&actor, "sandbox-cache", "default", "cache", &dev)
            .result
            .unwrap();

        assert!(actor
            .upgrade_managed_service_instance("db", &dev)
            .result
            .unwrap()
            .is_some());
        assert!(matches!(
            actor.upgrade_managed_service_instance("db", &dev).result,
            Err(ActorError::UpgradeNotAvailable)
        ));
        assert!(matches!(
            actor.upgrade_managed_service_instance("cache", &dev).result,
            Err(ActorError::UpgradeNotAvailable)
        ));
    }

    #[test]
    fn test_bindings() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let (dev, _) = seed(&actor);
        actor.create_application_in_space("web", &dev).result.unwrap();
        create_instance(&actor, "sandbox-cache", "default", "cache", &dev)
            .result
            .unwrap();

        let list = ListBindingParams {
            app_name: "web".to_string(),
            instance_name: "cache".to_string(),
            space_guid: dev.clone(),
        };
        assert!(matches!(
            actor.list_service_app_bindings(&list).result,
            Err(ActorError::ServiceBindingNotFound { .. })
        ));

        let bind = CreateBindingParams {
            app_name: "web".to_string(),
            instance_name: "cache".to_string(),
            space_guid: dev.clone(),
            ..Default::default()
        };
        assert!(actor.create_service_app_binding(&bind).result.unwrap().is_none());
        assert!(matches!(
            actor.create_service_app_binding(&bind).result,
            Err(ActorError::ResourceAlreadyExists(_))
        ));

        let bindings = actor.list_service_app_bindings(&list).result.unwrap();
        assert_eq!(bindings.len(), 1);
        actor
            .delete_service_app_binding(&bindings[0].guid)
            .result
            .unwrap();
        assert!(actor.list_service_app_bindings(&list).result.is_err());
        assert!(matches!(
            actor.delete_service_app_binding(&bindings[0].guid).result,
            Err(ActorError::ServiceBindingGuidNotFound { ref guid }) if *guid == bindings[0].guid
        ));
    }

    #[test]
    fn test_service_instances_for_space() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let (dev, prod) = seed(&actor);
        actor.create_application_in_space("web", &dev).result.unwrap();
        actor.create_application_in_space("api", &prod).result.unwrap();
        create_instance(&actor, "sandbox-cache", "default", "cache", &dev)
            .result
            .unwrap();
        create_instance(&actor, "sandbox-cache", "default", "acme", &prod)
            .result
            .unwrap();
        actor
            .share_service_instance(&ShareParams {
                instance_name: "acme".to_string(),
                space_guid: prod.clone(),
                org_name: "org".to_string(),
                space_name: "dev".to_string(),
            })
            .result
            .unwrap();
        for (app, space) in [("web", &dev), ("api", &prod)] {
            actor
                .create_service_app_binding(&CreateBindingParams {
                    app_name: app.to_string(),
                    instance_name: "acme".to_string(),
                    space_guid: space.clone(),
                    binding_name: Some(format!("{}-binding", app)),
                    ..Default::default()
                })
                .result
                .unwrap();
        }

        let summaries = actor.get_service_instances_for_space(&dev).result.unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.instance.name.as_str()).collect();
        assert_eq!(names, vec!["acme", "cache"]);
        assert_eq!(summaries[0].broker_name, "sandbox-broker");
        assert_eq!(
            summaries[0].bound_apps,
            vec![BoundApp {
                app_name: "web".to_string(),
                binding_name: Some("web-binding".to_string()),
            }]
        );
        assert!(summaries[1].bound_apps.is_empty());
        assert!(!summaries[1].upgrade_available);
        assert_eq!(summaries[1].instance.last_operation.status(), "create succeeded");

        let shared_in = actor.get_service_instance_details("acme", &dev).result.unwrap();
        assert_eq!(
            shared_in.shared_from,
            Some(("org".to_string(), "prod".to_string()))
        );
        assert!(shared_in.shared_with.is_empty());

        let owned = actor.get_service_instance_details("acme", &prod).result.unwrap();
        assert_eq!(owned.shared_from, None);
        assert_eq!(
            owned.shared_with,
            vec![SharedSpace {
                org_name: "org".to_string(),
                space_name: "dev".to_string(),
                bindings: 1,
            }]
        );
        assert!(matches!(
            actor.get_service_instance_details("nope", &dev).result,
            Err(ActorError::ServiceInstanceNotFound { .. })
        ));
    }

    #[test]
    fn test_summary_reports_available_upgrade() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let (dev, _) = seed(&actor);
        create_instance(&actor, "sandbox-db", "small", "db", &dev)
            .result
            .unwrap();

        let summaries = actor.get_service_instances_for_space(&dev).result.unwrap();
        assert!(summaries[0].upgrade_available);
        assert!(actor
            .upgrade_managed_service_instance("db", &dev)
            .result
            .unwrap()
            .is_some());
        let summaries = actor.get_service_instances_for_space(&dev).result.unwrap();
        assert!(!summaries[0].upgrade_available);
        assert_eq!(summaries[0].instance.last_operation.status(), "update succeeded");
    }

    #[test]
    fn test_share_and_unshare() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let (dev, prod) = seed(&actor);
        create_instance(&actor, "sandbox-cache", "default", "cache", &dev)
            .result
            .unwrap();
        let params = ShareParams {
            instance_name: "cache".to_string(),
            space_guid: dev.clone(),
            org_name: "org".to_string(),
            space_name: "prod".to_string(),
        };

        assert!(matches!(
            actor.unshare_service_instance(&params).result,
            Err(ActorError::ServiceInstanceNotShared { .. })
        ));
        actor.share_service_instance(&params).result.unwrap();
        assert!(matches!(
            actor.share_service_instance(&params).result,
            Err(ActorError::ResourceAlreadyExists(_))
        ));

        actor.create_application_in_space("reader", &prod).result.unwrap();
        actor
            .create_service_app_binding(&CreateBindingParams {
                app_name: "reader".to_string(),
                instance_name: "cache".to_string(),
                space_guid: prod.clone(),
                ..Default::default()
            })
            .result
            .unwrap();

        actor.unshare_service_instance(&params).result.unwrap();
        assert!(actor.snapshot().bindings.is_empty());
        assert!(actor.snapshot().service_instances[0].shared_with.is_empty());
    }

    #[test]
    fn test_service_keys() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let (dev, _) = seed(&actor);
        create_instance(&actor, "sandbox-db", "small", "db", &dev)
            .result
            .unwrap();
        let params = CreateServiceKeyParams {
            instance_name: "db".to_string(),
            key_name: "k".to_string(),
            space_guid: dev.clone(),
            parameters: None,
        };

        assert!(actor.create_service_key(&params).result.unwrap().is_some());
        assert!(matches!(
            actor.create_service_key(&params).result,
            Err(ActorError::ResourceAlreadyExists(_))
        ));
        assert!(actor
            .delete_service_key_by_service_instance_and_name("db", "k", &dev)
            .result
            .is_ok());
        assert_eq!(
            actor
                .delete_service_key_by_service_instance_and_name("db", "k", &dev)
                .result
                .err(),
            Some(ActorError::ServiceKeyNotFound {
                key: "k".to_string(),
                instance: "db".to_string()
            })
        );
    }

    #[test]
    fn test_delete_instance_cascades() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let (dev, _) = seed(&actor);
        create_instance(&actor, "sandbox-cache", "default", "cache", &dev)
            .result
            .unwrap();
        actor
            .create_service_key(&CreateServiceKeyParams {
                instance_name: "cache".to_string(),
                key_name: "k".to_string(),
                space_guid: dev.clone(),
                parameters: None,
            })
            .result
            .unwrap();

        assert!(actor
            .delete_service_instance("cache", &dev)
            .result
            .unwrap()
            .is_none());
        assert!(actor.snapshot().service_keys.is_empty());
        assert!(matches!(
            actor.delete_service_instance("cache", &dev).result,
            Err(ActorError::ServiceInstanceNotFound { .. })
        ));
    }

    #[test]
    fn test_broker_delete_refused_while_in_use_then_purge() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let (dev, _) = seed(&actor);
        create_instance(&actor, "sandbox-cache", "default", "cache", &dev)
            .result
            .unwrap();

        let broker = actor
            .get_service_broker_by_name("sandbox-broker")
            .result
            .unwrap();
        assert!(matches!(
            actor.delete_service_broker(&broker.guid).result,
            Err(ActorError::ServiceBrokerInUse { ref instances, .. }) if instances == &["cache".to_string()]
        ));

        actor
            .purge_service_offering_by_name_and_broker("sandbox-cache", None)
            .result
            .unwrap();
        assert!(actor.snapshot().service_instances.is_empty());
        assert!(matches!(
            actor
                .purge_service_offering_by_name_and_broker("sandbox-cache", None)
                .result,
            Err(ActorError::ServiceOfferingNotFound { .. })
        ));

        actor.delete_service_broker(&broker.guid).result.unwrap();
        let snapshot = actor.snapshot();
        assert!(snapshot.service_brokers.is_empty());
        assert!(snapshot.service_offerings.is_empty());
        assert!(matches!(
            actor.get_service_broker_by_name("sandbox-broker").result,
            Err(ActorError::ServiceBrokerNotFound { .. })
        ));
    }

    #[test]
    fn test_mutations_persist_across_opens() {
        let dir = tempdir().unwrap();
        let config = CliConfig::default();
        {
            let actor = SandboxActor::open(PlatformStore::in_dir(dir.path()), &config).unwrap();
            actor.create_organization("kept").result.unwrap();
        }
        let actor = SandboxActor::open(PlatformStore::in_dir(dir.path()), &config).unwrap();
        assert!(actor.get_organization_by_name("kept").result.is_ok());
    }

    #[test]
    fn test_failed_mutation_changes_nothing() {
        let config = CliConfig::default();
        let actor = SandboxActor::in_memory(platform(), &config);
        let before = actor.snapshot();
        assert!(actor.rename_organization("missing", "x").result.is_err());
        assert_eq!(actor.snapshot(), before);
    }
}
