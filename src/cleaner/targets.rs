//! Resolution of the directories swept by the temp purge stage.
//!
//! Paths are derived from the environment each time they are resolved, never
//! embedded as literals for one machine.

use std::path::{Path, PathBuf};

use crate::config::TargetsConfig;

/// A directory whose children are purged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeTarget {
    pub label: String,
    pub path: PathBuf,
}

impl PurgeTarget {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// Ordered list of purge targets. Order only affects reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeTargets {
    targets: Vec<PurgeTarget>,
}

impl PurgeTargets {
    pub fn new(targets: Vec<PurgeTarget>) -> Self {
        Self { targets }
    }

    /// Explicit directories, labeled by position.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::new(
            paths
                .into_iter()
                .enumerate()
                .map(|(i, p)| PurgeTarget::new(format!("target {}", i + 1), p.as_ref()))
                .collect(),
        )
    }

    /// Configured paths, or the platform defaults when none are configured.
    pub fn resolve(config: &TargetsConfig) -> Self {
        if config.paths.is_empty() {
            Self::from_environment()
        } else {
            Self::from_paths(&config.paths)
        }
    }

    /// User temp, system temp, prefetch, and per-user local temp.
    #[cfg(windows)]
    pub fn from_environment() -> Self {
        let system_root = std::env::var_os("SystemRoot")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Windows"));
        let local_temp = dirs::data_local_dir()
            .map(|d| d.join("Temp"))
            .unwrap_or_else(std::env::temp_dir);

        Self::new(vec![
            PurgeTarget::new("User temp", std::env::temp_dir()),
            PurgeTarget::new("System temp", system_root.join("Temp")),
            PurgeTarget::new("Prefetch", system_root.join("Prefetch")),
            PurgeTarget::new("Local temp", local_temp),
        ])
    }

    /// User temp, system temp, thumbnail cache, and per-user local temp.
    #[cfg(not(windows))]
    pub fn from_environment() -> Self {
        let cache = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("/tmp/.cache"));
        let local_temp = dirs::home_dir()
            .map(|h| h.join(".local/tmp"))
            .unwrap_or_else(|| cache.join("tmp"));

        Self::new(vec![
            PurgeTarget::new("User temp", std::env::temp_dir()),
            PurgeTarget::new("System temp", "/var/tmp"),
            PurgeTarget::new("Thumbnail cache", cache.join("thumbnails")),
            PurgeTarget::new("Local temp", local_temp),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PurgeTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
