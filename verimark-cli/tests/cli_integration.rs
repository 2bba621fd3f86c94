//! CLI integration tests for verimark-cli.
//!
//! These tests verify the CLI behavior by running the actual binary
//! and checking outputs, exit codes, and file artifacts.

use assert_cmd::Command;
use image::{DynamicImage, Rgb, RgbImage};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a Command for the verimark binary, isolated from the caller's env.
fn verimark() -> Command {
    let mut cmd = Command::cargo_bin("verimark").unwrap();
    for var in [
        "ALGOD_URL",
        "ALGOD_TOKEN",
        "REGISTRY_APP_ID",
        "REGISTRY_BOX_PREFIX",
        "PLAGIARISM_THRESHOLD",
        "ZOOM_FACTORS",
        "ZOOM_MIRROR",
        "DERIVATIVE_BYTE_CHECK",
        "ASSET_STORE_URL",
        "ASSET_STORE_TOKEN",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn artwork() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(120, 90, |x, y| {
        if x < 40 && y < 30 {
            Rgb([230, 30, 30])
        } else if x > 80 {
            Rgb([10, 60, 200])
        } else {
            Rgb([(x * 2) as u8, (y * 2) as u8, 100])
        }
    }))
}

fn write_png(dir: &Path, name: &str, image: &DynamicImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

/// Hash a file through the CLI and return the hex string.
fn hash_of(path: &Path) -> String {
    let output = verimark()
        .args(["hash", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    stdout
        .split_whitespace()
        .find(|w| w.len() == 16 && w.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap()
        .to_string()
}

fn write_registry(dir: &Path, hash: &str, owner: &str) -> PathBuf {
    let path = dir.join("registry.json");
    fs::write(
        &path,
        format!(r#"[{{"hash": "{hash}", "owner": "{owner}"}}]"#),
    )
    .unwrap();
    path
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    verimark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Perceptual fingerprinting"))
        .stdout(predicate::str::contains("hash"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("registry"));
}

#[test]
fn test_version_displays_version() {
    verimark()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("verimark"));
}

#[test]
fn test_help_shows_exit_codes() {
    verimark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("66"))
        .stdout(predicate::str::contains("69"));
}

#[test]
fn test_verify_help_shows_options() {
    verimark()
        .args(["verify", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--registry-file"))
        .stdout(predicate::str::contains("--threshold"))
        .stdout(predicate::str::contains("--zoom"))
        .stdout(predicate::str::contains("--fail-on-match"));
}

// ============================================================================
// Exit Code Tests
// ============================================================================

#[test]
fn test_missing_file_returns_input_error() {
    // Exit code 66 = EX_NOINPUT
    verimark()
        .args(["hash", "nonexistent_file.png"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_undecodable_file_returns_input_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("fake.png");
    fs::write(&file, b"definitely not an image").unwrap();

    verimark()
        .args(["hash", file.to_str().unwrap()])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Invalid image"));
}

#[test]
fn test_invalid_threshold_returns_config_error() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());
    let registry = write_registry(temp.path(), "0000000000000000", "alice");

    // Exit code 78 = EX_CONFIG
    verimark()
        .args([
            "verify",
            "--registry-file",
            registry.to_str().unwrap(),
            "--threshold",
            "99",
            image.to_str().unwrap(),
        ])
        .assert()
        .code(78);
}

#[test]
fn test_store_without_asset_store_is_config_error() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());

    verimark()
        .args(["hash", "--store", image.to_str().unwrap()])
        .assert()
        .code(78)
        .stderr(predicate::str::contains("ASSET_STORE_URL"));
}

#[test]
fn test_unreachable_registry_returns_network_error() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());

    // Exit code 69 = EX_UNAVAILABLE
    verimark()
        .args([
            "verify",
            "--algod-url",
            "http://127.0.0.1:9",
            image.to_str().unwrap(),
        ])
        .assert()
        .code(69)
        .stdout(predicate::str::contains("NO REGISTRY"));
}

// ============================================================================
// Hash and Analyze
// ============================================================================

#[test]
fn test_hash_prints_sixteen_hex_digits() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());

    let first = hash_of(&image);
    let second = hash_of(&image);
    assert_eq!(first, second);
    assert_eq!(first, first.to_lowercase());
}

#[test]
fn test_hash_json_output() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());

    let output = verimark()
        .args(["--format", "json", "hash", image.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["hash"].as_str().unwrap().len(), 16);
    assert_eq!(json["asset_stored"], false);
}

#[test]
fn test_analyze_exports_samples() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());
    let out_dir = temp.path().join("samples");

    verimark()
        .args([
            "analyze",
            "--export",
            out_dir.to_str().unwrap(),
            image.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Median:"))
        .stdout(predicate::str::contains("Bitmask"));

    let denoised = image::open(out_dir.join("gray_denoised.png")).unwrap();
    assert_eq!((denoised.width(), denoised.height()), (32, 32));
    assert!(out_dir.join("gray_original.png").exists());
}

#[test]
fn test_analyze_export_to_unwritable_path() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, b"a file, not a directory").unwrap();

    verimark()
        .args([
            "analyze",
            "--export",
            blocker.join("samples").to_str().unwrap(),
            image.to_str().unwrap(),
        ])
        .assert()
        .code(73)
        .stderr(predicate::str::contains("Cannot write"));
}

#[test]
fn test_analyze_json_matches_hash() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());
    let hash = hash_of(&image);

    let output = verimark()
        .args(["-f", "json", "analyze", image.to_str().unwrap()])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["hash"], hash.as_str());
    assert_eq!(json["binary"].as_str().unwrap().len(), 64);
    assert_eq!(json["gray_denoised"].as_array().unwrap().len(), 1024);
}

// ============================================================================
// Verify Against an Offline Registry
// ============================================================================

#[test]
fn test_verify_original() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());
    let registry = write_registry(temp.path(), &hash_of(&image), "alice");

    verimark()
        .args([
            "verify",
            "--registry-file",
            registry.to_str().unwrap(),
            image.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ORIGINAL MATCH"))
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("Detected via Original"));
}

#[test]
fn test_verify_rotated_copy_reports_variant() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());
    let rotated = write_png(temp.path(), "rotated.png", &artwork().rotate90());
    let registry = write_registry(temp.path(), &hash_of(&image), "alice");

    let output = verimark()
        .args([
            "--format",
            "json",
            "verify",
            "--registry-file",
            registry.to_str().unwrap(),
            rotated.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["verdict"], "original");
    assert_eq!(json["score"], 0);
    assert_eq!(json["variant"], "Rot90");
}

#[test]
fn test_fail_on_match_returns_match_found() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());
    let registry = write_registry(temp.path(), &hash_of(&image), "alice");

    // Exit code 65 = EX_DATAERR
    verimark()
        .args([
            "verify",
            "--fail-on-match",
            "--registry-file",
            registry.to_str().unwrap(),
            image.to_str().unwrap(),
        ])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Match found"));
}

#[test]
fn test_verify_clear() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());
    let hash = hash_of(&image);
    let inverted = format!("{:016x}", !u64::from_str_radix(&hash, 16).unwrap());
    let registry = write_registry(temp.path(), &inverted, "bob");

    verimark()
        .args([
            "verify",
            "--fail-on-match",
            "--registry-file",
            registry.to_str().unwrap(),
            image.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("CLEAR"))
        .stdout(predicate::str::contains("variants tested"));
}

#[test]
fn test_registry_list_offline() {
    let temp = TempDir::new().unwrap();
    let registry = write_registry(temp.path(), "c3f1a2b4d5e6f708", "alice");

    verimark()
        .args([
            "registry",
            "list",
            "--registry-file",
            registry.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("c3f1a2b4..."))
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("1 entries"));
}

#[test]
fn test_missing_registry_file_returns_input_error() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());

    verimark()
        .args([
            "verify",
            "--registry-file",
            "/nonexistent/registry.json",
            image.to_str().unwrap(),
        ])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read registry file"));
}

#[test]
fn test_quiet_suppresses_output() {
    let temp = TempDir::new().unwrap();
    let image = write_png(temp.path(), "art.png", &artwork());

    verimark()
        .args(["--quiet", "hash", image.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
