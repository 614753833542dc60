//! Release feed and installer download against a local mock server.

use assert_cmd::Command;
use predicates::prelude::*;
use rusty_janitor::update::{http_client, Downloader, ReleaseAsset, UpdateChecker};
use std::fs;
use tempfile::TempDir;

fn rusty_janitor() -> Command {
    Command::cargo_bin("rusty-janitor").unwrap()
}

fn feed_body(server_url: &str, tag: &str) -> String {
    format!(
        r#"{{"tag": "{tag}", "assets": [{{"url": "{server_url}/download/janitor-setup.bin", "filename": "janitor-setup.bin"}}]}}"#
    )
}

fn checker(server: &mockito::ServerGuard) -> UpdateChecker {
    UpdateChecker::new(http_client().unwrap(), format!("{}/latest", server.url()))
}

#[test]
fn same_tag_means_no_update() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/latest")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(feed_body(&server.url(), "1.0"))
        .create();

    assert!(checker(&server).check("1.0").is_none());
    mock.assert();
}

#[test]
fn newer_tag_is_an_update() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/latest")
        .with_status(200)
        .with_body(feed_body(&server.url(), "2.0"))
        .create();

    let descriptor = checker(&server).check("1.0").unwrap();
    assert_eq!(descriptor.tag, "2.0");
    assert_eq!(descriptor.assets[0].filename, "janitor-setup.bin");
}

#[test]
fn older_tag_is_also_an_update() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/latest")
        .with_status(200)
        .with_body(feed_body(&server.url(), "0.9"))
        .create();

    assert!(checker(&server).check("1.0").is_some());
}

#[test]
fn server_error_reports_no_update() {
    let mut server = mockito::Server::new();
    let _mock = server.mock("GET", "/latest").with_status(500).create();

    let checker = checker(&server);
    assert!(checker.try_check("1.0").is_err());
    assert!(checker.check("1.0").is_none());
}

#[test]
fn malformed_feed_reports_no_update() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/latest")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create();

    assert!(checker(&server).check("1.0").is_none());
}

#[test]
fn unreachable_feed_reports_no_update() {
    let checker = UpdateChecker::new(http_client().unwrap(), "http://127.0.0.1:9/latest");
    assert!(checker.check("1.0").is_none());
}

#[test]
fn requests_carry_user_agent() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/latest")
        .match_header(
            "user-agent",
            mockito::Matcher::Regex("^rusty-janitor/".to_string()),
        )
        .with_status(200)
        .with_body(feed_body(&server.url(), "1.0"))
        .create();

    checker(&server).check("1.0");
    mock.assert();
}

#[test]
fn download_writes_installer_to_staging_dir() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/download/janitor-setup.bin")
        .with_status(200)
        .with_body("installer-bytes")
        .create();
    let staging = TempDir::new().unwrap();

    let downloader = Downloader::new(http_client().unwrap(), Some(staging.path().to_path_buf()));
    let path = downloader
        .download(&ReleaseAsset {
            url: format!("{}/download/janitor-setup.bin", server.url()),
            filename: "janitor-setup.bin".to_string(),
        })
        .unwrap();

    assert_eq!(path, staging.path().join("janitor-setup.bin"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "installer-bytes");
    assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 1);
}

#[test]
fn failed_download_leaves_nothing_behind() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/download/janitor-setup.bin")
        .with_status(404)
        .create();
    let staging = TempDir::new().unwrap();

    let downloader = Downloader::new(http_client().unwrap(), Some(staging.path().to_path_buf()));
    let result = downloader.download(&ReleaseAsset {
        url: format!("{}/download/janitor-setup.bin", server.url()),
        filename: "janitor-setup.bin".to_string(),
    });

    assert!(result.is_err());
    assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[test]
fn asset_filename_cannot_escape_staging_dir() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/download/evil")
        .with_status(200)
        .with_body("payload")
        .create();
    let staging = TempDir::new().unwrap();

    let downloader = Downloader::new(http_client().unwrap(), Some(staging.path().to_path_buf()));
    let path = downloader
        .download(&ReleaseAsset {
            url: format!("{}/download/evil", server.url()),
            filename: "../../evil.sh".to_string(),
        })
        .unwrap();

    assert_eq!(path, staging.path().join("evil.sh"));
}

#[test]
fn cli_check_only_reports_update() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/latest")
        .with_status(200)
        .with_body(feed_body(&server.url(), "2.0"))
        .create();
    let home = TempDir::new().unwrap();

    rusty_janitor()
        .env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .args(["update", "--current", "1.0", "--check-only", "--feed"])
        .arg(format!("{}/latest", server.url()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Update available: 1.0 -> 2.0"));
}

#[test]
fn cli_downloads_installer() {
    let mut server = mockito::Server::new();
    let _feed = server
        .mock("GET", "/latest")
        .with_status(200)
        .with_body(feed_body(&server.url(), "2.0"))
        .create();
    let _asset = server
        .mock("GET", "/download/janitor-setup.bin")
        .with_status(200)
        .with_body("installer-bytes")
        .create();
    let home = TempDir::new().unwrap();
    let staging = home.path().join("staging");

    rusty_janitor()
        .env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .args(["update", "--current", "1.0", "--feed"])
        .arg(format!("{}/latest", server.url()))
        .arg("--staging-dir")
        .arg(&staging)
        .assert()
        .success()
        .stdout(predicate::str::contains("Installer saved to"));

    assert!(staging.join("janitor-setup.bin").exists());
}

#[test]
fn cli_up_to_date() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/latest")
        .with_status(200)
        .with_body(feed_body(&server.url(), "1.0"))
        .create();
    let home = TempDir::new().unwrap();

    rusty_janitor()
        .env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .args(["update", "--current", "1.0", "--feed"])
        .arg(format!("{}/latest", server.url()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Already up to date (1.0)."));
}

#[test]
fn cli_unreachable_feed_is_not_fatal() {
    let home = TempDir::new().unwrap();

    rusty_janitor()
        .env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .args([
            "update",
            "--current",
            "1.0",
            "--feed",
            "http://127.0.0.1:9/latest",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No update available."))
        .stderr(predicate::str::contains("Update check failed"));
}

#[test]
fn rename_failure_leaves_no_partial_file() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/download/janitor-setup.bin")
        .with_status(200)
        .with_body("installer-bytes")
        .create();
    let staging = TempDir::new().unwrap();
    // A non-empty directory in the way makes the final rename fail
    let blocker = staging.path().join("janitor-setup.bin");
    fs::create_dir(&blocker).unwrap();
    fs::write(blocker.join("keep"), "x").unwrap();

    let downloader = Downloader::new(http_client().unwrap(), Some(staging.path().to_path_buf()));
    let result = downloader.download(&ReleaseAsset {
        url: format!("{}/download/janitor-setup.bin", server.url()),
        filename: "janitor-setup.bin".to_string(),
    });

    assert!(result.is_err());
    assert!(!staging.path().join("janitor-setup.bin.part").exists());
    assert!(blocker.join("keep").exists());
}

#[cfg(unix)]
fn wait_for(path: &std::path::Path) -> bool {
    for _ in 0..100 {
        if path.exists() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    false
}

#[cfg(unix)]
fn installer_script(marker: &std::path::Path) -> String {
    format!("#!/bin/sh\ntouch '{}'\n", marker.display())
}

#[cfg(unix)]
#[test]
fn fetch_and_run_launches_installer() {
    let home = TempDir::new().unwrap();
    let marker = home.path().join("installed");
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/download/setup.sh")
        .with_status(200)
        .with_body(installer_script(&marker))
        .create();
    let staging = home.path().join("staging");

    let descriptor = rusty_janitor::update::VersionDescriptor {
        tag: "2.0".to_string(),
        assets: vec![ReleaseAsset {
            url: format!("{}/download/setup.sh", server.url()),
            filename: "setup.sh".to_string(),
        }],
    };
    let path = Downloader::new(http_client().unwrap(), Some(staging.clone()))
        .run_installer(true)
        .fetch_and_run(&descriptor)
        .unwrap();

    assert_eq!(path, staging.join("setup.sh"));
    assert!(wait_for(&marker), "installer did not run");
}

#[cfg(unix)]
#[test]
fn cli_run_starts_installer() {
    let home = TempDir::new().unwrap();
    let marker = home.path().join("installed");
    let mut server = mockito::Server::new();
    let feed = format!(
        r#"{{"tag": "2.0", "assets": [{{"url": "{}/download/setup.sh", "filename": "setup.sh"}}]}}"#,
        server.url()
    );
    let _feed = server
        .mock("GET", "/latest")
        .with_status(200)
        .with_body(feed)
        .create();
    let _asset = server
        .mock("GET", "/download/setup.sh")
        .with_status(200)
        .with_body(installer_script(&marker))
        .create();
    let staging = home.path().join("staging");

    rusty_janitor()
        .env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .args(["update", "--current", "1.0", "--run", "--feed"])
        .arg(format!("{}/latest", server.url()))
        .arg("--staging-dir")
        .arg(&staging)
        .assert()
        .success()
        .stdout(predicate::str::contains("Installer started:"));

    assert!(wait_for(&marker), "installer did not run");
}
