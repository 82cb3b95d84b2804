use std::path::Path;
use std::path::PathBuf;

use config::Config;
use config::ConfigError as ExternalConfigError;
use config::Environment;
use config::File;
use config::FileFormat;
use config::Map;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const CONFIG_FILE_NAME: &str = "ideals.toml";
const ENV_PREFIX: &str = "IDEALS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
    #[error("Invalid value for `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    pub cache: CacheSettings,
    pub worker: WorkerSettings,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    /// Release an archive once the last document using it closes.
    pub evict_on_close: bool,
    /// Most archive levels one virtual path may traverse.
    pub max_nesting_depth: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            evict_on_close: true,
            max_nesting_depth: 10,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkerSettings {
    /// Pending content requests the worker queue holds.
    pub queue_capacity: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self { queue_capacity: 32 }
    }
}

impl Settings {
    pub fn new(project_root: &Path) -> Result<Self, ConfigError> {
        Self::load_from_paths(project_root, user_config_file().as_deref(), None)
    }

    /// `env` replaces the process environment when given.
    fn load_from_paths(
        project_root: &Path,
        user_config_path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder = builder.add_source(
            File::from(project_root.join(format!(".{CONFIG_FILE_NAME}")))
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join(CONFIG_FILE_NAME))
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid {
                key: "cache.max_nesting_depth",
                reason: "must be at least 1",
            });
        }
        if self.worker.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "worker.queue_capacity",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Per-user settings file, if the platform has a config directory.
#[must_use]
pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("org", "ideals", "ideals")
        .map(|proj_dirs| proj_dirs.config_dir().join(CONFIG_FILE_NAME))
}
