//! Release feed checking and installer download.

mod checker;
mod downloader;

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::Result;

pub use checker::{ReleaseAsset, UpdateChecker, VersionDescriptor};
pub use downloader::Downloader;

/// User agent sent with every request; release APIs reject anonymous clients.
pub const USER_AGENT: &str = concat!("rusty-janitor/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by the checker and the downloader.
pub fn http_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(15))
        .build()?;
    Ok(client)
}
