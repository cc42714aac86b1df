//! End-to-end tests of the `propview` binary.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;

use support::config::{write_temp_config, OFFLINE_CONFIG};

fn propview() -> Command {
    let mut cmd = Command::cargo_bin("propview").unwrap();
    cmd.env_remove("PROPVIEW_BASE_URL")
        .env_remove("PROPVIEW_VIDEO_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn config_validate_accepts_good_file() {
    let file = write_temp_config(OFFLINE_CONFIG);
    propview()
        .arg("-c")
        .arg(file.path())
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn config_validate_rejects_bad_file() {
    let file = write_temp_config("[region_cache]\nmax_entries = 0\n");
    propview()
        .arg("-c")
        .arg(file.path())
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_entries"));
}

#[test]
fn config_show_json_reflects_file_and_hides_token() {
    let file = write_temp_config(OFFLINE_CONFIG);
    propview()
        .env("PROPVIEW_VIDEO_TOKEN", "super-secret")
        .arg("-c")
        .arg(file.path())
        .args(["--json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://127.0.0.1:9"))
        .stdout(predicate::str::contains("super-secret").not());
}

#[test]
fn base_url_override_wins_over_file() {
    let file = write_temp_config(OFFLINE_CONFIG);
    propview()
        .env("PROPVIEW_BASE_URL", "http://127.0.0.1:19")
        .arg("-c")
        .arg(file.path())
        .args(["--json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://127.0.0.1:19"));
}

#[test]
fn video_rejects_non_numeric_id() {
    let file = write_temp_config(OFFLINE_CONFIG);
    propview()
        .arg("-c")
        .arg(file.path())
        .args(["video", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid video id"));
}

#[test]
fn viewport_rejects_inverted_bounds() {
    let file = write_temp_config(OFFLINE_CONFIG);
    propview()
        .arg("-c")
        .arg(file.path())
        .args([
            "viewport", "--north", "19.40", "--south", "19.45", "--east", "-99.10", "--west",
            "-99.20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid bounds"));
}

#[test]
fn viewport_against_unreachable_backend_fails() {
    let file = write_temp_config(OFFLINE_CONFIG);
    propview()
        .arg("-c")
        .arg(file.path())
        .args([
            "viewport", "--north", "19.45", "--south", "19.40", "--east", "-99.10", "--west",
            "-99.20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("viewport fetch failed"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    propview().assert().failure().code(2);
}
