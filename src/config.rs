//! Layered configuration: defaults, then `config.json` in the data
//! directory, then `TIMETALLY_*` environment variables, then command-line flags.

use crate::domain::{parse_hms, StatsFilter};
use crate::error::ValidationError;
use crate::persistence::{config_file, default_data_dir};
use anyhow::{Context, Result};
use chrono::Duration;
use config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const ENV_PREFIX: &str = "TIMETALLY";

/// Keys shared by every layer. `TIMETALLY_USER` and `TIMETALLY_DIR` land on these.
const KEY_USER: &str = "user";
const KEY_DIR: &str = "dir";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "user", default = "default_user_id")]
    pub user_id: String,
    #[serde(rename = "dir", default)]
    pub data_dir: Option<PathBuf>,
    /// Pre-filled expected time of the add-task form
    #[serde(default = "default_expected")]
    pub default_expected: String,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub default_filter: StatsFilter,
}

fn default_user_id() -> String {
    "default_user".to_string()
}
fn default_expected() -> String {
    "00:30:00".to_string()
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            data_dir: None,
            default_expected: default_expected(),
            notifications: default_true(),
            log_level: default_log_level(),
            default_filter: StatsFilter::default(),
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Resolve against the real environment and filesystem
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::load_with(overrides, None, default_data_dir)
    }

    /// `env` replaces the process environment when given
    pub fn load_with(
        overrides: &Overrides,
        env: Option<Map<String, String>>,
        discover: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<Self> {
        let environment = Environment::with_prefix(ENV_PREFIX).source(env);

        // The directory holding config.json comes from the outer layers
        let env_dir = Config::builder()
            .add_source(environment.clone())
            .build()
            .context("Failed to read environment configuration")?
            .get_string(KEY_DIR)
            .ok()
            .map(PathBuf::from);
        let dir = match overrides.data_dir.clone().or(env_dir) {
            Some(dir) => dir,
            None => discover()?,
        };
        let path = config_file(&dir);

        let builder = Config::builder()
            .set_default(KEY_DIR, path_value(&dir))?
            .add_source(File::from(path.clone()).format(FileFormat::Json).required(false))
            .add_source(environment)
            .set_override_option(KEY_USER, overrides.user.clone())?
            .set_override_option(KEY_DIR, overrides.data_dir.as_deref().map(path_value))?;
        let config: Self = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        validate_user_id(&config.user_id)?;
        Ok(config)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::persistence::files::LOCAL_DIR_NAME))
    }

    /// Default task budget; an invalid configured value falls back to 30 minutes
    pub fn default_expected_duration(&self) -> Duration {
        match parse_hms(&self.default_expected) {
            Ok(duration) => duration,
            Err(e) => {
                warn!(error = %e, "invalid default_expected in config");
                Duration::minutes(30)
            }
        }
    }
}

/// User ids become file names, so only `[A-Za-z0-9_-]` is allowed
pub fn validate_user_id(user_id: &str) -> Result<(), ValidationError> {
    let valid = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidUserId(user_id.to_string()))
    }
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
