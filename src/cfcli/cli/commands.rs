use super::setup::{
    build_command, parse_cli, render_grouped_help, subcommand_help, Commands,
    GettingStartedCommands,
};
use cfcli::actor::platform::PlatformStore;
use cfcli::actor::sandbox::SandboxActor;
use cfcli::actor::shared::TargetChecker;
use cfcli::commands::BaseCommand;
use cfcli::config::{CliConfig, Config};
use cfcli::error::{CliError, Result};
use cfcli::i18n::Translator;
use cfcli::logging;
use cfcli::ui::{TerminalUi, Ui};
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;

/// Name the binary was invoked as, used in hints such as `cf target -o ORG`.
fn binary_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_stem)
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("cf")
        .to_string()
}

fn translator(config: &CliConfig) -> Translator {
    let Some(dir) = config.config_dir() else {
        return Translator::identity();
    };
    match Translator::load(&dir, &config.locale()) {
        Ok(translator) => translator,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable message catalog");
            Translator::identity()
        }
    }
}

fn build_ui(config: &CliConfig) -> TerminalUi {
    TerminalUi::stdio()
        .with_color(config.color_enabled() && console::colors_enabled())
        .with_translator(translator(config))
}

pub fn run() -> ExitCode {
    let cli = parse_cli();
    logging::init();

    let config = match CliConfig::from_env() {
        Ok(config) => config.with_binary_name(binary_name()),
        Err(err) => {
            let ui = TerminalUi::stdio().with_color(console::colors_enabled());
            ui.display_error(&err);
            return ExitCode::FAILURE;
        }
    };
    let ui = build_ui(&config);

    match dispatch(cli.command, &config, &ui) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            ui.display_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Option<Commands>, config: &CliConfig, ui: &TerminalUi) -> Result<()> {
    let command = match command {
        None => return help(None, config),
        Some(Commands::GettingStarted(GettingStartedCommands::Help { command: name })) => {
            return help(name.as_deref(), config)
        }
        Some(command) => command,
    };
    let Some(runnable) = command.as_command() else {
        return Ok(());
    };

    let store = match config.config_dir() {
        Some(dir) => PlatformStore::in_dir(dir),
        None => PlatformStore::in_memory(),
    };
    let actor = SandboxActor::open(store, config)?;
    let shared_actor = TargetChecker::new(config);
    let base = BaseCommand {
        ui,
        config,
        shared_actor: &shared_actor,
        actor: &actor,
    };

    let result = runnable.execute(&base);
    // Target changes made before a failure still stick.
    config.write()?;
    result
}

fn help(name: Option<&str>, config: &CliConfig) -> Result<()> {
    match name {
        None => {
            print!("{}", render_grouped_help(&build_command()));
            Ok(())
        }
        Some(name) => match subcommand_help(name) {
            Some(text) => {
                print!("{}", text);
                Ok(())
            }
            None => Err(CliError::UnknownCommand {
                name: name.to_string(),
                binary_name: config.binary_name(),
            }),
        },
    }
}
