use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cleaner::StageConfig;
use crate::error::{ConfigError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stages run when none are named on the command line
    pub stages: StageConfig,
    pub targets: TargetsConfig,
    pub recycle_bin: RecycleBinConfig,
    pub artifacts: ArtifactsConfig,
    pub update: UpdateConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    /// Directories to purge (empty = platform defaults)
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecycleBinConfig {
    /// Volume root of the Windows recycle bin
    pub drive: String,
    /// Freedesktop trash directory override
    pub trash_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Installation root (default: directory of the executable)
    pub install_root: Option<PathBuf>,
    /// Power profile, relative to the installation root
    pub power_plan: PathBuf,
    /// Command that imports the power profile
    pub power_plan_command: Vec<String>,
    /// Service reduction script, relative to the installation root
    pub services_script: PathBuf,
    /// Command that runs the service reduction script
    pub services_command: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Release feed returning the latest version descriptor
    pub feed_url: Option<String>,
    /// Where installers are downloaded (default: OS temp dir)
    pub staging_dir: Option<PathBuf>,
    /// Execute the installer after download
    pub run_installer: bool,
    /// Prefer the asset whose filename ends with this suffix
    pub asset_suffix: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stages: StageConfig::temp_only(),
            targets: TargetsConfig::default(),
            recycle_bin: RecycleBinConfig::default(),
            artifacts: ArtifactsConfig::default(),
            update: UpdateConfig::default(),
        }
    }
}

impl Default for RecycleBinConfig {
    fn default() -> Self {
        let drive = std::env::var("SystemDrive")
            .map(|d| format!("{}\\", d))
            .unwrap_or_else(|_| "C:\\".to_string());
        Self {
            drive,
            trash_dir: None,
        }
    }
}

impl Default for ArtifactsConfig {
    #[cfg(windows)]
    fn default() -> Self {
        Self {
            install_root: None,
            power_plan: PathBuf::from("assets").join("PowerPlan.pow"),
            power_plan_command: vec!["powercfg".to_string(), "/import".to_string()],
            services_script: PathBuf::from("assets").join("reduce_services.bat"),
            services_command: vec!["cmd".to_string(), "/C".to_string()],
        }
    }

    #[cfg(not(windows))]
    fn default() -> Self {
        Self {
            install_root: None,
            power_plan: PathBuf::from("assets").join("power-profile.sh"),
            power_plan_command: vec!["sh".to_string()],
            services_script: PathBuf::from("assets").join("reduce-services.sh"),
            services_command: vec!["sh".to_string()],
        }
    }
}

impl ArtifactsConfig {
    /// Configured installation root, else the executable's directory.
    pub fn resolve_root(&self) -> PathBuf {
        self.install_root
            .clone()
            .or_else(|| {
                std::env::current_exe()
                    .ok()
                    .and_then(|exe| exe.parent().map(Path::to_path_buf))
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn power_plan_path(&self) -> PathBuf {
        self.resolve_root().join(&self.power_plan)
    }

    pub fn services_script_path(&self) -> PathBuf {
        self.resolve_root().join(&self.services_script)
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rusty-janitor").join("config.toml"))
    }

    /// Load from `path`, else from the default location if it exists, else
    /// fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;

        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.clone(),
            source,
        })?;

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let artifacts = &self.artifacts;
        if artifacts.power_plan.as_os_str().is_empty()
            || artifacts.services_script.as_os_str().is_empty()
        {
            return Err(ConfigError::Invalid(
                "artifact file names must not be empty".to_string(),
            ));
        }
        if artifacts.power_plan_command.is_empty() || artifacts.services_command.is_empty() {
            return Err(ConfigError::Invalid(
                "artifact commands must not be empty".to_string(),
            ));
        }

        if let Some(url) = &self.update.feed_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "feed_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }

        Ok(())
    }
}
