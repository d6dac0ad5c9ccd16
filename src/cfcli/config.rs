//! # Configuration
//!
//! Login and target state lives in a single JSON document, `config.json`,
//! under `$CF_HOME/.cf/` (`CF_HOME` defaults to the user's home directory).
//!
//! ## Format
//!
//! Keys are PascalCase and every key is optional; a missing file means a
//! fresh, untargeted, logged-out client.
//!
//! ```json
//! {
//!   "ConfigVersion": 3,
//!   "Target": "https://api.sandbox.local",
//!   "APIVersion": "3.140.0",
//!   "AccessToken": "bearer ...",
//!   "RefreshToken": "...",
//!   "UAAGrantType": "",
//!   "CurrentUser": "admin",
//!   "OrganizationFields": { "GUID": "...", "Name": "acme" },
//!   "SpaceFields": { "GUID": "...", "Name": "dev", "AllowSSH": true },
//!   "AsyncTimeout": 0,
//!   "ColorEnabled": true,
//!   "Locale": ""
//! }
//! ```
//!
//! ## Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `CF_HOME` | Directory holding `.cf/` |
//! | `CF_COLOR` | `true`/`false`, overrides `ColorEnabled` |
//!
//! ## Mutation
//!
//! Commands receive configuration as `&dyn Config` and mutate it through
//! `&self` setters; the binary calls [`Config::write`] once the command
//! returns, whatever the outcome.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

const CONFIG_DIR: &str = ".cf";
const CONFIG_FILENAME: &str = "config.json";
const CURRENT_CONFIG_VERSION: u32 = 3;
const DEFAULT_POLLING_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_BINARY_NAME: &str = "cf";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OrganizationFields {
    #[serde(rename = "GUID")]
    pub guid: String,
    pub name: String,
}

impl OrganizationFields {
    pub fn is_empty(&self) -> bool {
        self.guid.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SpaceFields {
    #[serde(rename = "GUID")]
    pub guid: String,
    pub name: String,
    #[serde(rename = "AllowSSH")]
    pub allow_ssh: bool,
}

impl SpaceFields {
    pub fn is_empty(&self) -> bool {
        self.guid.is_empty()
    }
}

/// The persisted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ConfigFile {
    pub config_version: u32,
    pub target: String,
    #[serde(rename = "APIVersion")]
    pub api_version: String,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(rename = "UAAGrantType")]
    pub uaa_grant_type: String,
    pub current_user: Option<String>,
    pub organization_fields: OrganizationFields,
    pub space_fields: SpaceFields,
    /// Minutes to wait for asynchronous operations; zero means the default.
    pub async_timeout: u64,
    pub color_enabled: Option<bool>,
    pub locale: String,
}

/// Read and write access to login and target state.
pub trait Config {
    /// Name the user invoked us by, used in hints like `cf target -o ORG`.
    fn binary_name(&self) -> String;
    fn target(&self) -> String;
    fn api_version(&self) -> String;
    fn access_token(&self) -> String;
    fn refresh_token(&self) -> String;
    fn uaa_grant_type(&self) -> String;
    fn current_user(&self) -> Option<String>;
    fn targeted_organization(&self) -> OrganizationFields;
    fn targeted_space(&self) -> SpaceFields;
    /// Upper bound on how long to wait for a job stream.
    fn polling_timeout(&self) -> Duration;
    fn color_enabled(&self) -> bool;
    fn locale(&self) -> String;
    /// Directory holding the configuration file, when it is file-backed.
    fn config_dir(&self) -> Option<PathBuf>;

    fn set_target_information(&self, target: &str, api_version: &str);
    fn set_token_information(&self, access_token: &str, refresh_token: &str, grant_type: &str);
    fn set_current_user(&self, name: &str);
    fn set_organization_information(&self, guid: &str, name: &str);
    fn set_space_information(&self, guid: &str, name: &str, allow_ssh: bool);
    fn unset_space_information(&self);
    fn unset_organization_and_space_information(&self);
    /// Drops tokens, the current user, and any targeted org and space.
    fn unset_user_information(&self);
    fn write(&self) -> Result<()>;
}

/// JSON-file backed configuration.
#[derive(Debug)]
pub struct CliConfig {
    path: Option<PathBuf>,
    file: RwLock<ConfigFile>,
    color_override: Option<bool>,
    binary_name: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::in_memory(ConfigFile::default())
    }
}

impl CliConfig {
    /// Configuration that is never persisted.
    pub fn in_memory(file: ConfigFile) -> Self {
        Self {
            path: None,
            file: RwLock::new(file),
            color_override: None,
            binary_name: DEFAULT_BINARY_NAME.to_string(),
        }
    }

    /// Loads `<home>/.cf/config.json`, or defaults when it does not exist.
    pub fn load<P: AsRef<Path>>(home: P) -> Result<Self> {
        let path = home.as_ref().join(CONFIG_DIR).join(CONFIG_FILENAME);
        let file = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)
                .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            ConfigFile::default()
        };
        tracing::debug!(path = %path.display(), "loaded configuration");

        Ok(Self {
            path: Some(path),
            file: RwLock::new(file),
            color_override: None,
            binary_name: DEFAULT_BINARY_NAME.to_string(),
        })
    }

    /// Resolves `CF_HOME` (or the home directory) and loads from there,
    /// applying environment overrides.
    pub fn from_env() -> Result<Self> {
        let home = match std::env::var_os("CF_HOME") {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => directories::BaseDirs::new()
                .map(|dirs| dirs.home_dir().to_path_buf())
                .ok_or_else(|| {
                    CliError::Config("could not determine home directory".to_string())
                })?,
        };

        let mut config = Self::load(home)?;
        config.color_override = std::env::var("CF_COLOR")
            .ok()
            .and_then(|v| parse_bool(&v));
        Ok(config)
    }

    pub fn with_binary_name(mut self, name: impl Into<String>) -> Self {
        self.binary_name = name.into();
        self
    }

    pub fn with_color_override(mut self, color: Option<bool>) -> Self {
        self.color_override = color;
        self
    }

    /// A copy of the current document.
    pub fn snapshot(&self) -> ConfigFile {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, ConfigFile> {
        self.file.read().unwrap_or_else(|e| e.into_inner())
    }

    fn modify(&self) -> RwLockWriteGuard<'_, ConfigFile> {
        self.file.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

impl Config for CliConfig {
    fn binary_name(&self) -> String {
        self.binary_name.clone()
    }

    fn target(&self) -> String {
        self.read().target.clone()
    }

    fn api_version(&self) -> String {
        self.read().api_version.clone()
    }

    fn access_token(&self) -> String {
        self.read().access_token.clone()
    }

    fn refresh_token(&self) -> String {
        self.read().refresh_token.clone()
    }

    fn uaa_grant_type(&self) -> String {
        self.read().uaa_grant_type.clone()
    }

    fn current_user(&self) -> Option<String> {
        self.read().current_user.clone()
    }

    fn targeted_organization(&self) -> OrganizationFields {
        self.read().organization_fields.clone()
    }

    fn targeted_space(&self) -> SpaceFields {
        self.read().space_fields.clone()
    }

    fn polling_timeout(&self) -> Duration {
        match self.read().async_timeout {
            0 => DEFAULT_POLLING_TIMEOUT,
            minutes => Duration::from_secs(minutes.saturating_mul(60)),
        }
    }

    fn color_enabled(&self) -> bool {
        self.color_override
            .or(self.read().color_enabled)
            .unwrap_or(true)
    }

    fn locale(&self) -> String {
        self.read().locale.clone()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.path
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
    }

    fn set_target_information(&self, target: &str, api_version: &str) {
        let mut file = self.modify();
        file.target = target.to_string();
        file.api_version = api_version.to_string();
    }

    fn set_token_information(&self, access_token: &str, refresh_token: &str, grant_type: &str) {
        let mut file = self.modify();
        file.access_token = access_token.to_string();
        file.refresh_token = refresh_token.to_string();
        file.uaa_grant_type = grant_type.to_string();
    }

    fn set_current_user(&self, name: &str) {
        self.modify().current_user = Some(name.to_string());
    }

    fn set_organization_information(&self, guid: &str, name: &str) {
        self.modify().organization_fields = OrganizationFields {
            guid: guid.to_string(),
            name: name.to_string(),
        };
    }

    fn set_space_information(&self, guid: &str, name: &str, allow_ssh: bool) {
        self.modify().space_fields = SpaceFields {
            guid: guid.to_string(),
            name: name.to_string(),
            allow_ssh,
        };
    }

    fn unset_space_information(&self) {
        self.modify().space_fields = SpaceFields::default();
    }

    fn unset_organization_and_space_information(&self) {
        let mut file = self.modify();
        file.organization_fields = OrganizationFields::default();
        file.space_fields = SpaceFields::default();
    }

    fn unset_user_information(&self) {
        let mut file = self.modify();
        file.access_token.clear();
        file.refresh_token.clear();
        file.uaa_grant_type.clear();
        file.current_user = None;
        file.organization_fields = OrganizationFields::default();
        file.space_fields = SpaceFields::default();
    }

    fn write(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut file = self.snapshot();
        file.config_version = CURRENT_CONFIG_VERSION;
        let content = serde_json::to_string_pretty(&file)?;
        fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "saved configuration");
        Ok(())
    }
}
