use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use reqwest::blocking::Client;

use super::checker::{ReleaseAsset, VersionDescriptor};
use crate::error::{JanitorError, Result};

/// Fetches a release installer into a staging directory and optionally runs it.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    staging_dir: PathBuf,
    run_installer: bool,
    asset_suffix: Option<String>,
}

impl Downloader {
    /// Create a downloader staging into `staging_dir`, or the OS temp dir.
    pub fn new(client: Client, staging_dir: Option<PathBuf>) -> Self {
        Self {
            client,
            staging_dir: staging_dir.unwrap_or_else(std::env::temp_dir),
            run_installer: false,
            asset_suffix: None,
        }
    }

    pub fn run_installer(mut self, run: bool) -> Self {
        self.run_installer = run;
        self
    }

    pub fn asset_suffix(mut self, suffix: Option<String>) -> Self {
        self.asset_suffix = suffix;
        self
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Pick the asset to install: the first one matching the suffix, else the
    /// first one listed.
    pub fn select_asset<'a>(&self, descriptor: &'a VersionDescriptor) -> Result<&'a ReleaseAsset> {
        let preferred = self.asset_suffix.as_deref().and_then(|suffix| {
            descriptor
                .assets
                .iter()
                .find(|a| a.filename.ends_with(suffix))
        });

        preferred
            .or_else(|| descriptor.assets.first())
            .ok_or_else(|| {
                JanitorError::Download(format!("release {} has no assets", descriptor.tag))
            })
    }

    /// Download the selected asset and, if configured, launch it.
    pub fn fetch_and_run(&self, descriptor: &VersionDescriptor) -> Result<PathBuf> {
        let asset = self.select_asset(descriptor)?;
        let path = self.download(asset)?;

        if self.run_installer {
            launch(&path)?;
        }

        Ok(path)
    }

    /// Stream `asset` to `<staging_dir>/<filename>`.
    pub fn download(&self, asset: &ReleaseAsset) -> Result<PathBuf> {
        let name = Path::new(&asset.filename)
            .file_name()
            .ok_or_else(|| {
                JanitorError::Download(format!("invalid asset filename '{}'", asset.filename))
            })?
            .to_os_string();

        fs::create_dir_all(&self.staging_dir)
            .map_err(|e| JanitorError::io(&self.staging_dir, e))?;

        let dest = self.staging_dir.join(&name);
        let mut partial_name = name;
        partial_name.push(".part");
        let partial = self.staging_dir.join(partial_name);

        tracing::info!("Downloading {} to {}", asset.url, dest.display());

        let result = self.stream_to(&asset.url, &partial);
        let written = match result {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&partial, &dest) {
            let _ = fs::remove_file(&partial);
            return Err(JanitorError::io(&dest, e));
        }
        tracing::info!(
            "Downloaded {} ({})",
            dest.display(),
            humansize::format_size(written, humansize::BINARY)
        );
        Ok(dest)
    }

    fn stream_to(&self, url: &str, path: &Path) -> Result<u64> {
        let mut response = self.client.get(url).send()?.error_for_status()?;

        let mut file = File::create(path).map_err(|e| JanitorError::io(path, e))?;
        let written = response.copy_to(&mut file)?;
        file.flush().map_err(|e| JanitorError::io(path, e))?;

        Ok(written)
    }
}

/// Start the installer without waiting for it.
fn launch(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .map_err(|e| JanitorError::io(path, e))?;
    }

    tracing::info!("Launching installer {}", path.display());
    Command::new(path)
        .spawn()
        .map_err(|e| JanitorError::io(path, e))?;
    Ok(())
}
