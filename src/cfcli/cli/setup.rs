use cfcli::commands::api::ApiCommand;
use cfcli::commands::apps::{AppCommand, AppsCommand, CreateAppCommand, DeleteCommand};
use cfcli::commands::auth::AuthCommand;
use cfcli::commands::bind_service::BindServiceCommand;
use cfcli::commands::create_service::CreateServiceCommand;
use cfcli::commands::delete_service::DeleteServiceCommand;
use cfcli::commands::logout::LogoutCommand;
use cfcli::commands::orgs::{CreateOrgCommand, RenameOrgCommand};
use cfcli::commands::service_broker::{DeleteServiceBrokerCommand, PurgeServiceOfferingCommand};
use cfcli::commands::service_key::{CreateServiceKeyCommand, DeleteServiceKeyCommand};
use cfcli::commands::services::{ServiceCommand, ServicesCommand};
use cfcli::commands::share_service::{ShareServiceCommand, UnshareServiceCommand};
use cfcli::commands::spaces::CreateSpaceCommand;
use cfcli::commands::target::TargetCommand;
use cfcli::commands::unbind_service::UnbindServiceCommand;
use cfcli::commands::upgrade_service::UpgradeServiceCommand;
use cfcli::commands::Command;
use cfcli::ui::table::format_rows;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format for releases: "v0.3.0"
/// Format for dev builds: "v0.3.0\ndev: abc1234 2024-01-15"
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" {
            format!("v{}", VERSION)
        } else {
            format!("v{}\ndev: {} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "cf",
    bin_name = "cf",
    version = get_version(),
    disable_help_subcommand = true
)]
#[command(about = "A command line tool to interact with Cloud Foundry", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Help sections, in display order, with the commands each one lists.
pub const COMMAND_GROUPS: &[(&str, &[&str])] = &[
    ("GETTING STARTED", &["help", "api", "auth", "logout", "target"]),
    ("APPS", &["apps", "app", "create-app", "delete"]),
    (
        "SERVICES",
        &[
            "services",
            "service",
            "create-service",
            "upgrade-service",
            "delete-service",
            "create-service-key",
            "delete-service-key",
            "bind-service",
            "unbind-service",
            "share-service",
            "unshare-service",
        ],
    ),
    ("ORGS", &["create-org", "rename-org"]),
    ("SPACES", &["create-space"]),
    (
        "SERVICE ADMIN",
        &["delete-service-broker", "purge-service-offering"],
    ),
];

/// Root help: commands listed by group instead of clap's flat list.
pub fn render_grouped_help(cmd: &clap::Command) -> String {
    let name = cmd.get_name();
    let mut out = String::new();
    if let Some(about) = cmd.get_about() {
        out.push_str(&format!("{} - {}\n\n", name, about));
    }
    out.push_str(&format!("USAGE:\n  {} [command] [arguments...] [command options]\n", name));

    for (title, names) in COMMAND_GROUPS {
        let rows: Vec<Vec<String>> = names
            .iter()
            .filter_map(|n| cmd.find_subcommand(n))
            .map(|sub| {
                vec![
                    sub.get_name().to_string(),
                    sub.get_about().map(|a| a.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        out.push_str(&format!("\n{}:\n", title));
        for line in format_rows("  ", &rows, 3) {
            out.push_str(&line);
            out.push('\n');
        }
    }

    out.push_str(&format!(
        "\nUse '{} help COMMAND' for details on a command.\n",
        name
    ));
    out
}

/// The clap command with the grouped root help installed.
pub fn build_command() -> clap::Command {
    let cmd = Cli::command();
    let help = render_grouped_help(&cmd);
    cmd.override_help(help)
}

/// Parses the process arguments, exiting with clap's usage error on failure.
pub fn parse_cli() -> Cli {
    let matches = build_command().get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

/// Help for one subcommand, or `None` when no such command exists.
pub fn subcommand_help(name: &str) -> Option<String> {
    let mut cmd = build_command();
    cmd.build();
    cmd.find_subcommand_mut(name)
        .map(|sub| sub.render_long_help().to_string())
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    GettingStarted(GettingStartedCommands),

    #[command(flatten)]
    Apps(AppCommands),

    #[command(flatten)]
    Services(ServiceCommands),

    #[command(flatten)]
    OrgsAndSpaces(OrgSpaceCommands),
}

#[derive(Subcommand, Debug)]
pub enum GettingStartedCommands {
    /// Show help
    #[command(display_order = 1)]
    Help {
        /// Command to describe
        #[arg(value_name = "COMMAND")]
        command: Option<String>,
    },

    /// Set or view target api url
    #[command(display_order = 2)]
    Api(ApiCommand),

    /// Authenticate non-interactively
    #[command(display_order = 3)]
    Auth(AuthCommand),

    /// Log user out
    #[command(alias = "lo", display_order = 4)]
    Logout(LogoutCommand),

    /// Set or view the targeted org or space
    #[command(alias = "t", display_order = 5)]
    Target(TargetCommand),
}

#[derive(Subcommand, Debug)]
pub enum AppCommands {
    /// List all apps in the target space
    #[command(alias = "a", display_order = 10)]
    Apps(AppsCommand),

    /// Display health and status for an app
    #[command(display_order = 11)]
    App(AppCommand),

    /// Create an app
    #[command(display_order = 12)]
    CreateApp(CreateAppCommand),

    /// Delete an app
    #[command(alias = "d", display_order = 13)]
    Delete(DeleteCommand),
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommands {
    /// List all service instances in the target space
    #[command(alias = "s", display_order = 18)]
    Services(ServicesCommand),

    /// Show service instance info
    #[command(display_order = 19)]
    Service(ServiceCommand),

    /// Create a service instance
    #[command(alias = "cs", display_order = 20)]
    CreateService(CreateServiceCommand),

    /// Upgrade a service instance to the latest available version of its current service plan
    #[command(display_order = 21)]
    UpgradeService(UpgradeServiceCommand),

    /// Delete a service instance
    #[command(alias = "ds", display_order = 22)]
    DeleteService(DeleteServiceCommand),

    /// Create key for a service instance
    #[command(alias = "csk", display_order = 23)]
    CreateServiceKey(CreateServiceKeyCommand),

    /// Delete a service key
    #[command(alias = "dsk", display_order = 24)]
    DeleteServiceKey(DeleteServiceKeyCommand),

    /// Bind a service instance to an app
    #[command(alias = "bs", display_order = 25)]
    BindService(BindServiceCommand),

    /// Unbind a service instance from an app
    #[command(alias = "us", display_order = 26)]
    UnbindService(UnbindServiceCommand),

    /// Share a service instance with another space
    #[command(display_order = 27)]
    ShareService(ShareServiceCommand),

    /// Unshare a shared service instance from a space
    #[command(display_order = 28)]
    UnshareService(UnshareServiceCommand),

    /// Delete a service broker
    #[command(display_order = 29)]
    DeleteServiceBroker(DeleteServiceBrokerCommand),

    /// Recursively remove a service offering and child objects from Cloud Foundry database without making requests to a service broker
    #[command(display_order = 30)]
    PurgeServiceOffering(PurgeServiceOfferingCommand),
}

#[derive(Subcommand, Debug)]
pub enum OrgSpaceCommands {
    /// Create an org
    #[command(alias = "co", display_order = 40)]
    CreateOrg(CreateOrgCommand),

    /// Rename an org
    #[command(display_order = 41)]
    RenameOrg(RenameOrgCommand),

    /// Create a space
    #[command(display_order = 42)]
    CreateSpace(CreateSpaceCommand),
}

impl Commands {
    /// The command to execute, or `None` for `help`.
    pub fn as_command(&self) -> Option<&dyn Command> {
        let command: &dyn Command = match self {
            Commands::GettingStarted(cmd) => match cmd {
                GettingStartedCommands::Help { .. } => return None,
                GettingStartedCommands::Api(c) => c,
                GettingStartedCommands::Auth(c) => c,
                GettingStartedCommands::Logout(c) => c,
                GettingStartedCommands::Target(c) => c,
            },
            Commands::Apps(cmd) => match cmd {
                AppCommands::Apps(c) => c,
                AppCommands::App(c) => c,
                AppCommands::CreateApp(c) => c,
                AppCommands::Delete(c) => c,
            },
            Commands::Services(cmd) => match cmd {
                ServiceCommands::Services(c) => c,
                ServiceCommands::Service(c) => c,
                ServiceCommands::CreateService(c) => c,
                ServiceCommands::UpgradeService(c) => c,
                ServiceCommands::DeleteService(c) => c,
                ServiceCommands::CreateServiceKey(c) => c,
                ServiceCommands::DeleteServiceKey(c) => c,
                ServiceCommands::BindService(c) => c,
                ServiceCommands::UnbindService(c) => c,
                ServiceCommands::ShareService(c) => c,
                ServiceCommands::UnshareService(c) => c,
                ServiceCommands::DeleteServiceBroker(c) => c,
                ServiceCommands::PurgeServiceOffering(c) => c,
            },
            Commands::OrgsAndSpaces(cmd) => match cmd {
                OrgSpaceCommands::CreateOrg(c) => c,
                OrgSpaceCommands::RenameOrg(c) => c,
                OrgSpaceCommands::CreateSpace(c) => c,
            },
        };
        Some(command)
    }
}
