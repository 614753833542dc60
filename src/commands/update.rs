//! Update command implementation.

use anyhow::{Context, Result};

use crate::cli::UpdateArgs;
use crate::config::Config;
use crate::update::{http_client, Downloader, UpdateChecker};

/// Run the update command. Feed and download failures are reported but do
/// not fail the command.
pub fn run(args: UpdateArgs, config: &Config) -> Result<()> {
    let feed = args
        .feed
        .or_else(|| config.update.feed_url.clone())
        .context("No release feed configured; pass --feed or set update.feed_url")?;

    let client = http_client()?;
    let checker = UpdateChecker::new(client.clone(), feed);

    let descriptor = match checker.try_check(&args.current) {
        Ok(Some(descriptor)) => descriptor,
        Ok(None) => {
            println!("Already up to date ({}).", args.current);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Update check failed: {}", e);
            println!("No update available.");
            return Ok(());
        }
    };

    println!("Update available: {} -> {}", args.current, descriptor.tag);
    if args.check_only {
        return Ok(());
    }

    let run_installer = args.run || config.update.run_installer;
    let downloader = Downloader::new(
        client,
        args.staging_dir.or_else(|| config.update.staging_dir.clone()),
    )
    .run_installer(run_installer)
    .asset_suffix(config.update.asset_suffix.clone());

    match downloader.fetch_and_run(&descriptor) {
        Ok(path) if run_installer => println!("Installer started: {}", path.display()),
        Ok(path) => println!("Installer saved to {}", path.display()),
        Err(e) => eprintln!("Update download failed: {}", e),
    }

    Ok(())
}
