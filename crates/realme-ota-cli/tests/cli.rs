use assert_cmd::Command;
use mockito::{Mock, Server, ServerGuard};
use predicates::prelude::*;
use realme_ota::{CipherScheme, PayloadCodec, ProtocolConfig};
use serde_json::{json, Map, Value};
use std::path::Path;
use tempfile::TempDir;

const OTA_VERSION: &str = "RMX1801_11.A.01_0100_202001010000";
const NEW_VERSION: &str = "RMX1801_11.A.02_0200_202003010000";

fn realme_ota() -> Command {
    let mut cmd = Command::cargo_bin("realme-ota").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Config file routing V3 requests to the mock server
fn write_config(dir: &Path, base_url: &str) -> std::path::PathBuf {
    let path = dir.join("realme-ota.toml");
    std::fs::write(
        &path,
        format!(
            r#"
timeout_secs = 5

[v3.endpoints]
IN = "{base_url}/update/v3"
"#
        ),
    )
    .unwrap();
    path
}

fn update_reply() -> String {
    let codec = PayloadCodec::new(&ProtocolConfig::default().keys).unwrap();
    let payload = codec
        .encrypt(
            CipherScheme::Ctr,
            &json!({ "realOtaVersion": NEW_VERSION, "versionTypeId": "STABLE" }),
        )
        .unwrap();
    let mut reply = Map::new();
    reply.insert("body".to_string(), Value::String(payload));
    Value::Object(reply).to_string()
}

fn mock_update(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/update/v3")
        .match_header("version", "3")
        .match_header("otaVersion", OTA_VERSION)
        .match_header("infVersion", "1")
        .with_status(200)
        .with_body(update_reply())
        .create()
}

#[test]
fn test_rejects_unknown_rui_version() {
    realme_ota()
        .args(["RMX1801", OTA_VERSION, "4"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_rejects_unknown_region() {
    realme_ota()
        .args(["RMX1801", OTA_VERSION, "2", "-r", "US"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_rejects_malformed_ota_version() {
    realme_ota()
        .args(["RMX1801", "RMX1801_11", "2", "-s"])
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_missing_config_file() {
    realme_ota()
        .args(["RMX1801", OTA_VERSION, "2", "--config", "/nonexistent/realme-ota.toml"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_silent_still_reports_errors() {
    realme_ota()
        .args(["RMX1801", OTA_VERSION, "2", "-s", "--config", "/nonexistent/realme-ota.toml"])
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_silent_hides_progress() {
    let mut server = Server::new();
    let _mock = mock_update(&mut server);
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.url());

    realme_ota()
        .args(["RMX1801", OTA_VERSION, "3", "-s", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("RealmeUI").not());
}

#[test]
fn test_rejects_zero_timeout() {
    realme_ota()
        .args(["RMX1801", OTA_VERSION, "2", "-t", "0"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("timeout"));
}

#[test]
fn test_prints_decrypted_response() {
    let mut server = Server::new();
    let mock = mock_update(&mut server);
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.url());

    realme_ota()
        .args(["RMX1801", OTA_VERSION, "3", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "    \"realOtaVersion\": \"{NEW_VERSION}\""
        )))
        .stderr(predicate::str::contains("RealmeUI V3 RMX1801"));

    mock.assert();
}

#[test]
fn test_only_prints_selected_field() {
    let mut server = Server::new();
    let _mock = mock_update(&mut server);
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.url());

    realme_ota()
        .args(["RMX1801", OTA_VERSION, "3", "-s", "-o", "realOtaVersion", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(format!("\"{NEW_VERSION}\"\n"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_missing_field_exit_code() {
    let mut server = Server::new();
    let _mock = mock_update(&mut server);
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.url());

    realme_ota()
        .args(["RMX1801", OTA_VERSION, "3", "-o", "changelog", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(7)
        .stderr(predicate::str::contains("changelog"));
}

#[test]
fn test_rejection_exit_code() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/update/v3")
        .with_status(200)
        .with_body(r#"{"responseCode": 2004, "errMsg": "no modify"}"#)
        .create();
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.url());

    realme_ota()
        .args(["RMX1801", OTA_VERSION, "3", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("no modify"));
}

#[test]
fn test_dump_writes_file() {
    let mut server = Server::new();
    let _mock = mock_update(&mut server);
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.url());
    let dump = dir.path().join("response.json");

    realme_ota()
        .args(["RMX1801", OTA_VERSION, "3", "-s", "--config"])
        .arg(&config)
        .arg("--dump")
        .arg(&dump)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&dump).unwrap()).unwrap();
    assert_eq!(saved["realOtaVersion"], NEW_VERSION);
}

#[test]
fn test_dump_failure_is_not_fatal() {
    let mut server = Server::new();
    let _mock = mock_update(&mut server);
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.url());
    let dump = dir.path().join("missing").join("response.json");

    realme_ota()
        .args(["RMX1801", OTA_VERSION, "3", "--config"])
        .arg(&config)
        .arg("--dump")
        .arg(&dump)
        .assert()
        .success()
        .stderr(predicate::str::contains("Failed to write response"));

    assert!(!dump.exists());
}
