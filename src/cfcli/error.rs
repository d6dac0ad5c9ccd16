use crate::actor::ActorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Actor(#[from] ActorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Prompt(String),

    #[error("Incorrect Usage: {}", missing_credentials(.username, .password))]
    MissingCredentials { username: bool, password: bool },

    #[error("Incorrect Usage: The following arguments cannot be used together: {}", .args.join(", "))]
    ArgumentCombination { args: Vec<String> },

    #[error("Invalid configuration provided for -c flag. Please provide a valid JSON object or path to a file containing a valid JSON object.")]
    InvalidJson,

    #[error("No API endpoint set. Use '{binary_name} api' to set an endpoint")]
    NoApiSet { binary_name: String },

    #[error("'{name}' is not a registered command. See '{binary_name} help'")]
    UnknownCommand { name: String, binary_name: String },

    #[error("Service account currently logged in. Use '{binary_name} logout' to log out service account and try again.")]
    PasswordGrantTypeLogoutRequired { binary_name: String },
}

fn missing_credentials(username: &bool, password: &bool) -> String {
    match (*username, *password) {
        (true, true) => {
            "the required arguments `USERNAME` and `PASSWORD` were not provided".to_string()
        }
        (true, false) => "the required argument `USERNAME` was not provided".to_string(),
        _ => "the required argument `PASSWORD` was not provided".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
