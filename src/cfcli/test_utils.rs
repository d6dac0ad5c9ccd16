//! Test doubles for the command layer.
//!
//! [`FakeActor`] and [`FakeSharedActor`] record every call and answer with
//! whatever the test scripted through [`Stub::returns`], falling back to a
//! plausible success. [`TestEnv`] bundles them with an in-memory config and a
//! [`TestUi`] that captures both output streams.

use crate::actor::job::JobStream;
use crate::actor::model::{
    AppState, Application, ApplicationSummary, AuthTokens, Credentials,
    DetailedApplicationSummary, LastOperation, LastOperationState, Organization, ServiceBroker,
    ServiceCredentialBinding, ServiceInstance, ServiceInstanceDetails, ServiceInstanceSummary,
    Space, User,
};
use crate::actor::{
    Actor, ActorError, CreateBindingParams, CreateServiceInstanceParams, CreateServiceKeyParams,
    ListBindingParams, Reply, ShareParams, SharedActor,
};
use crate::commands::BaseCommand;
use crate::config::{CliConfig, Config};
use crate::ui::TerminalUi;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

/// A cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct CaptureBuffer(Rc<RefCell<Vec<u8>>>);

impl CaptureBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A [`TerminalUi`] reading from a fixed string and capturing its output.
pub struct TestUi {
    pub ui: TerminalUi,
    pub out: CaptureBuffer,
    pub err: CaptureBuffer,
}

impl TestUi {
    pub fn new(input: &str) -> Self {
        let out = CaptureBuffer::default();
        let err = CaptureBuffer::default();
        let ui = TerminalUi::new(
            Box::new(Cursor::new(input.as_bytes().to_vec())),
            Box::new(out.clone()),
            Box::new(err.clone()),
        );
        Self { ui, out, err }
    }
}

/// Records calls of one method and produces its return values.
pub struct Stub<A, R> {
    calls: RefCell<Vec<A>>,
    returns: RefCell<Option<Box<dyn FnMut(&A) -> R>>>,
}

impl<A, R> Default for Stub<A, R> {
    fn default() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            returns: RefCell::new(None),
        }
    }
}

impl<A: Clone, R> Stub<A, R> {
    /// Scripts the return value, computed per call from the arguments.
    pub fn returns(&self, f: impl FnMut(&A) -> R + 'static) {
        *self.returns.borrow_mut() = Some(Box::new(f));
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn calls(&self) -> Vec<A> {
        self.calls.borrow().clone()
    }

    pub fn last_call(&self) -> Option<A> {
        self.calls.borrow().last().cloned()
    }

    fn call(&self, args: A, fallback: impl FnOnce(&A) -> R) -> R {
        let result = match self.returns.borrow_mut().as_mut() {
            Some(f) => f(&args),
            None => fallback(&args),
        };
        self.calls.borrow_mut().push(args);
        result
    }
}

pub fn user(name: &str) -> User {
    User {
        name: name.to_string(),
        guid: format!("{}-guid", name),
        origin: "uaa".to_string(),
        is_client: false,
    }
}

pub fn organization(name: &str) -> Organization {
    Organization {
        guid: format!("{}-guid", name),
        name: name.to_string(),
    }
}

pub fn space(name: &str, org_guid: &str) -> Space {
    Space {
        guid: format!("{}-guid", name),
        name: name.to_string(),
        organization_guid: org_guid.to_string(),
        allow_ssh: true,
    }
}

pub fn application(name: &str, space_guid: &str) -> Application {
    Application {
        guid: format!("{}-guid", name),
        name: name.to_string(),
        space_guid: space_guid.to_string(),
        state: AppState::Started,
        labels: BTreeMap::new(),
    }
}

pub fn service_instance(name: &str, space_guid: &str) -> ServiceInstance {
    ServiceInstance {
        guid: format!("{}-guid", name),
        name: name.to_string(),
        space_guid: space_guid.to_string(),
        offering_name: "sandbox-db".to_string(),
        plan_name: "small".to_string(),
        maintenance_version: 1,
        shared_with: Vec::new(),
        last_operation: LastOperation {
            kind: "create".to_string(),
            state: LastOperationState::Succeeded,
        },
        parameters: None,
    }
}

pub fn instance_summary(name: &str, space_guid: &str) -> ServiceInstanceSummary {
    ServiceInstanceSummary {
        instance: service_instance(name, space_guid),
        broker_name: "sandbox-broker".to_string(),
        bound_apps: Vec::new(),
        upgrade_available: false,
    }
}

fn no_job() -> Reply<Option<JobStream>> {
    Reply::ok(None, Vec::new())
}

#[derive(Default)]
pub struct FakeActor {
    pub api_version: Stub<(), String>,
    pub authenticate: Stub<Credentials, Result<AuthTokens, ActorError>>,
    pub get_current_user: Stub<(), Result<User, ActorError>>,
    pub revoke_session: Stub<String, Result<(), ActorError>>,
    pub create_organization: Stub<String, Reply<Organization>>,
    pub get_organization_by_name: Stub<String, Reply<Organization>>,
    pub rename_organization: Stub<(String, String), Reply<Organization>>,
    pub get_organization_spaces: Stub<String, Reply<Vec<Space>>>,
    pub create_space: Stub<(String, String), Reply<Space>>,
    pub get_space_by_name_and_organization: Stub<(String, String), Reply<Space>>,
    pub create_application_in_space: Stub<(String, String), Reply<Application>>,
    pub get_application_by_name_and_space: Stub<(String, String), Reply<Application>>,
    pub get_app_summaries_for_space: Stub<(String, Option<String>), Reply<Vec<ApplicationSummary>>>,
    pub get_detailed_app_summary: Stub<(String, String), Reply<DetailedApplicationSummary>>,
    pub delete_application_by_name_and_space: Stub<(String, String, bool), Reply<()>>,
    pub create_managed_service_instance:
        Stub<CreateServiceInstanceParams, Reply<Option<JobStream>>>,
    pub delete_service_instance: Stub<(String, String), Reply<Option<JobStream>>>,
    pub get_service_instances_for_space: Stub<String, Reply<Vec<ServiceInstanceSummary>>>,
    pub get_service_instance_details: Stub<(String, String), Reply<ServiceInstanceDetails>>,
    pub upgrade_managed_service_instance: Stub<(String, String), Reply<Option<JobStream>>>,
    pub create_service_app_binding: Stub<CreateBindingParams, Reply<Option<JobStream>>>,
    pub list_service_app_bindings: Stub<ListBindingParams, Reply<Vec<ServiceCredentialBinding>>>,
    pub delete_service_app_binding: Stub<String, Reply<Option<JobStream>>>,
    pub share_service_instance: Stub<ShareParams, Reply<()>>,
    pub unshare_service_instance: Stub<ShareParams, Reply<()>>,
    pub create_service_key: Stub<CreateServiceKeyParams, Reply<Option<JobStream>>>,
    pub delete_service_key_by_service_instance_and_name:
        Stub<(String, String, String), Reply<Option<JobStream>>>,
    pub get_service_broker_by_name: Stub<String, Reply<ServiceBroker>>,
    pub delete_service_broker: Stub<String, Reply<()>>,
    pub purge_service_offering_by_name_and_broker: Stub<(String, Option<String>), Reply<()>>,
}

impl Actor for FakeActor {
    fn cloud_controller_api_version(&self) -> String {
        self.api_version.call((), |_| "3.140.0".to_string())
    }

    fn authenticate(&self, credentials: &Credentials) -> Result<AuthTokens, ActorError> {
        self.authenticate.call(credentials.clone(), |c| {
            Ok(AuthTokens {
                access_token: "bearer access".to_string(),
                refresh_token: "refresh".to_string(),
                user: user(&c.username),
            })
        })
    }

    fn get_current_user(&self) -> Result<User, ActorError> {
        self.get_current_user.call((), |_| Ok(user("steve")))
    }

    fn revoke_session(&self, access_token: &str) -> Result<(), ActorError> {
        self.revoke_session.call(access_token.to_string(), |_| Ok(()))
    }

    fn create_organization(&self, name: &str) -> Reply<Organization> {
        self.create_organization
            .call(name.to_string(), |n| Reply::ok(organization(n), Vec::new()))
    }

    fn get_organization_by_name(&self, name: &str) -> Reply<Organization> {
        self.get_organization_by_name
            .call(name.to_string(), |n| Reply::ok(organization(n), Vec::new()))
    }

    fn rename_organization(&self, old_name: &str, new_name: &str) -> Reply<Organization> {
        self.rename_organization
            .call((old_name.to_string(), new_name.to_string()), |(_, n)| {
                Reply::ok(organization(n), Vec::new())
            })
    }

    fn get_organization_spaces(&self, org_guid: &str) -> Reply<Vec<Space>> {
        self.get_organization_spaces
            .call(org_guid.to_string(), |_| Reply::ok(Vec::new(), Vec::new()))
    }

    fn create_space(&self, name: &str, org_guid: &str) -> Reply<Space> {
        self.create_space
            .call((name.to_string(), org_guid.to_string()), |(n, o)| {
                Reply::ok(space(n, o), Vec::new())
            })
    }

    fn get_space_by_name_and_organization(&self, name: &str, org_guid: &str) -> Reply<Space> {
        self.get_space_by_name_and_organization
            .call((name.to_string(), org_guid.to_string()), |(n, o)| {
                Reply::ok(space(n, o), Vec::new())
            })
    }

    fn create_application_in_space(&self, name: &str, space_guid: &str) -> Reply<Application> {
        self.create_application_in_space
            .call((name.to_string(), space_guid.to_string()), |(n, s)| {
                Reply::ok(application(n, s), Vec::new())
            })
    }

    fn get_application_by_name_and_space(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<Application> {
        self.get_application_by_name_and_space
            .call((name.to_string(), space_guid.to_string()), |(n, s)| {
                Reply::ok(application(n, s), Vec::new())
            })
    }

    fn get_app_summaries_for_space(
        &self,
        space_guid: &str,
        label_selector: Option<&str>,
    ) -> Reply<Vec<ApplicationSummary>> {
        self.get_app_summaries_for_space.call(
            (space_guid.to_string(), label_selector.map(str::to_string)),
            |_| Reply::ok(Vec::new(), Vec::new()),
        )
    }

    fn get_detailed_app_summary(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<DetailedApplicationSummary> {
        self.get_detailed_app_summary
            .call((name.to_string(), space_guid.to_string()), |(n, s)| {
                Reply::ok(
                    DetailedApplicationSummary {
                        summary: ApplicationSummary {
                            application: application(n, s),
                            processes: Vec::new(),
                            routes: Vec::new(),
                        },
                        stack: "cflinuxfs4".to_string(),
                        buildpacks: Vec::new(),
                        last_uploaded: None,
                    },
                    Vec::new(),
                )
            })
    }

    fn delete_application_by_name_and_space(
        &self,
        name: &str,
        space_guid: &str,
        delete_routes: bool,
    ) -> Reply<()> {
        self.delete_application_by_name_and_space.call(
            (name.to_string(), space_guid.to_string(), delete_routes),
            |_| Reply::ok((), Vec::new()),
        )
    }

    fn create_managed_service_instance(
        &self,
        params: &CreateServiceInstanceParams,
    ) -> Reply<Option<JobStream>> {
        self.create_managed_service_instance
            .call(params.clone(), |_| no_job())
    }

    fn delete_service_instance(&self, name: &str, space_guid: &str) -> Reply<Option<JobStream>> {
        self.delete_service_instance
            .call((name.to_string(), space_guid.to_string()), |_| no_job())
    }

    fn get_service_instances_for_space(
        &self,
        space_guid: &str,
    ) -> Reply<Vec<ServiceInstanceSummary>> {
        self.get_service_instances_for_space
            .call(space_guid.to_string(), |_| Reply::ok(Vec::new(), Vec::new()))
    }

    fn get_service_instance_details(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<ServiceInstanceDetails> {
        self.get_service_instance_details
            .call((name.to_string(), space_guid.to_string()), |(n, s)| {
                Reply::ok(
                    ServiceInstanceDetails {
                        summary: instance_summary(n, s),
                        shared_from: None,
                        shared_with: Vec::new(),
                    },
                    Vec::new(),
                )
            })
    }

    fn upgrade_managed_service_instance(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Reply<Option<JobStream>> {
        self.upgrade_managed_service_instance
            .call((name.to_string(), space_guid.to_string()), |_| no_job())
    }

    fn create_service_app_binding(
        &self,
        params: &CreateBindingParams,
    ) -> Reply<Option<JobStream>> {
        self.create_service_app_binding
            .call(params.clone(), |_| no_job())
    }

    fn list_service_app_bindings(
        &self,
        params: &ListBindingParams,
    ) -> Reply<Vec<ServiceCredentialBinding>> {
        self.list_service_app_bindings.call(params.clone(), |p| {
            Reply::ok(
                vec![ServiceCredentialBinding {
                    guid: "binding-guid".to_string(),
                    name: None,
                    app_guid: format!("{}-guid", p.app_name),
                    service_instance_guid: format!("{}-guid", p.instance_name),
                }],
                Vec::new(),
            )
        })
    }

    fn delete_service_app_binding(&self, binding_guid: &str) -> Reply<Option<JobStream>> {
        self.delete_service_app_binding
            .call(binding_guid.to_string(), |_| no_job())
    }

    fn share_service_instance(&self, params: &ShareParams) -> Reply<()> {
        self.share_service_instance
            .call(params.clone(), |_| Reply::ok((), Vec::new()))
    }

    fn unshare_service_instance(&self, params: &ShareParams) -> Reply<()> {
        self.unshare_service_instance
            .call(params.clone(), |_| Reply::ok((), Vec::new()))
    }

    fn create_service_key(&self, params: &CreateServiceKeyParams) -> Reply<Option<JobStream>> {
        self.create_service_key.call(params.clone(), |_| no_job())
    }

    fn delete_service_key_by_service_instance_and_name(
        &self,
        instance_name: &str,
        key_name: &str,
        space_guid: &str,
    ) -> Reply<Option<JobStream>> {
        self.delete_service_key_by_service_instance_and_name.call(
            (
                instance_name.to_string(),
                key_name.to_string(),
                space_guid.to_string(),
            ),
            |_| no_job(),
        )
    }

    fn get_service_broker_by_name(&self, name: &str) -> Reply<ServiceBroker> {
        self.get_service_broker_by_name.call(name.to_string(), |n| {
            Reply::ok(
                ServiceBroker {
                    guid: format!("{}-guid", n),
                    name: n.clone(),
                    url: "https://broker.example.com".to_string(),
                },
                Vec::new(),
            )
        })
    }

    fn delete_service_broker(&self, guid: &str) -> Reply<()> {
        self.delete_service_broker
            .call(guid.to_string(), |_| Reply::ok((), Vec::new()))
    }

    fn purge_service_offering_by_name_and_broker(
        &self,
        offering_name: &str,
        broker_name: Option<&str>,
    ) -> Reply<()> {
        self.purge_service_offering_by_name_and_broker.call(
            (offering_name.to_string(), broker_name.map(str::to_string)),
            |_| Reply::ok((), Vec::new()),
        )
    }
}

#[derive(Default)]
pub struct FakeSharedActor {
    pub check_target: Stub<(bool, bool), Result<(), ActorError>>,
    pub is_logged_in: Stub<(), bool>,
}

impl SharedActor for FakeSharedActor {
    fn check_target(&self, require_org: bool, require_space: bool) -> Result<(), ActorError> {
        self.check_target
            .call((require_org, require_space), |_| Ok(()))
    }

    fn is_logged_in(&self) -> bool {
        self.is_logged_in.call((), |_| true)
    }
}

/// A logged-in, fully targeted configuration.
pub fn targeted_config() -> CliConfig {
    let config = CliConfig::default();
    config.set_target_information("https://api.example.com", "3.140.0");
    config.set_token_information("bearer access", "refresh", "");
    config.set_current_user("steve");
    config.set_organization_information("some-org-guid", "some-org");
    config.set_space_information("some-space-guid", "some-space", true);
    config
}

/// Everything a command needs, with fakes behind every seam.
pub struct TestEnv {
    pub ui: TestUi,
    pub config: CliConfig,
    pub shared: FakeSharedActor,
    pub actor: FakeActor,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_input("")
    }

    /// An environment whose prompts read from `input`.
    pub fn with_input(input: &str) -> Self {
        Self {
            ui: TestUi::new(input),
            config: targeted_config(),
            shared: FakeSharedActor::default(),
            actor: FakeActor::default(),
        }
    }

    pub fn base(&self) -> BaseCommand<'_> {
        BaseCommand {
            ui: &self.ui.ui,
            config: &self.config,
            shared_actor: &self.shared,
            actor: &self.actor,
        }
    }

    /// Makes the target check fail as if nobody were logged in.
    pub fn fail_target_check(&self) {
        self.shared.check_target.returns(|_| {
            Err(ActorError::NotLoggedIn {
                binary_name: "cf".to_string(),
            })
        });
    }

    pub fn out(&self) -> String {
        self.ui.out.contents()
    }

    pub fn err(&self) -> String {
        self.ui.err.contents()
    }
}
