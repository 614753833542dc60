use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseAsset {
    pub url: String,
    pub filename: String,
}

/// Latest release as published by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDescriptor {
    pub tag: String,
    pub assets: Vec<ReleaseAsset>,
}

// Accepts both the plain feed shape ({tag, assets: [{url, filename}]}) and
// the GitHub releases shape ({tag_name, assets: [{name, browser_download_url}]}).
#[derive(Debug, Deserialize)]
struct FeedRelease {
    #[serde(alias = "tag_name")]
    tag: String,
    #[serde(default)]
    assets: Vec<FeedAsset>,
}

#[derive(Debug, Deserialize)]
struct FeedAsset {
    browser_download_url: Option<String>,
    url: Option<String>,
    name: Option<String>,
    filename: Option<String>,
}

impl From<FeedRelease> for VersionDescriptor {
    fn from(release: FeedRelease) -> Self {
        let assets = release
            .assets
            .into_iter()
            .filter_map(|a| {
                Some(ReleaseAsset {
                    url: a.browser_download_url.or(a.url)?,
                    filename: a.filename.or(a.name)?,
                })
            })
            .collect();

        Self {
            tag: release.tag,
            assets,
        }
    }
}

impl VersionDescriptor {
    /// Parse a feed document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<FeedRelease>(json).map(Self::from)
    }
}

/// Queries the release feed for a version other than the running one.
#[derive(Debug, Clone)]
pub struct UpdateChecker {
    client: Client,
    feed_url: String,
}

impl UpdateChecker {
    pub fn new(client: Client, feed_url: impl Into<String>) -> Self {
        Self {
            client,
            feed_url: feed_url.into(),
        }
    }

    /// Fetch the current descriptor from the feed.
    pub fn fetch(&self) -> Result<VersionDescriptor> {
        tracing::debug!("Fetching release feed {}", self.feed_url);
        let release: FeedRelease = self
            .client
            .get(&self.feed_url)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(release.into())
    }

    /// Compare the feed tag with `current_version`. Any different tag,
    /// older ones included, counts as an update.
    pub fn try_check(&self, current_version: &str) -> Result<Option<VersionDescriptor>> {
        let descriptor = self.fetch()?;
        if descriptor.tag == current_version {
            tracing::info!("Already up to date ({})", current_version);
            Ok(None)
        } else {
            tracing::info!("Update available: {} -> {}", current_version, descriptor.tag);
            Ok(Some(descriptor))
        }
    }

    /// Like [`try_check`](Self::try_check), reporting feed failures as "no update".
    pub fn check(&self, current_version: &str) -> Option<VersionDescriptor> {
        match self.try_check(current_version) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!("Update check failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_feed() {
        let json = r#"{
            "tag": "2.0",
            "assets": [{"url": "https://dl.example.com/setup.exe", "filename": "setup.exe"}]
        }"#;

        let descriptor = VersionDescriptor::from_json(json).unwrap();

        assert_eq!(descriptor.tag, "2.0");
        assert_eq!(
            descriptor.assets,
            vec![ReleaseAsset {
                url: "https://dl.example.com/setup.exe".into(),
                filename: "setup.exe".into(),
            }]
        );
    }

    #[test]
    fn test_parse_github_release() {
        let json = r#"{
            "tag_name": "v1.2.0",
            "draft": false,
            "assets": [{
                "url": "https://api.github.com/repos/o/r/releases/assets/1",
                "name": "janitor-setup.exe",
                "browser_download_url": "https://github.com/o/r/releases/download/v1.2.0/janitor-setup.exe"
            }]
        }"#;

        let descriptor = VersionDescriptor::from_json(json).unwrap();

        assert_eq!(descriptor.tag, "v1.2.0");
        assert_eq!(descriptor.assets[0].filename, "janitor-setup.exe");
        assert!(descriptor.assets[0].url.contains("/download/"));
    }

    #[test]
    fn test_parse_without_assets() {
        let descriptor = VersionDescriptor::from_json(r#"{"tag": "3.1"}"#).unwrap();
        assert!(descriptor.assets.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_tag() {
        assert!(VersionDescriptor::from_json(r#"{"assets": []}"#).is_err());
    }
}
