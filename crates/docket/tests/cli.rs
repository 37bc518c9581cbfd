//! Integration tests for the docket binary.
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const INSPECT: &str = r#"{
    "Id": "9c1e0d3b7a5f2e4d6c8b0a1f3e5d7c9b",
    "Name": "/busybox",
    "Path": "sh",
    "Args": ["-c", "sleep 60"],
    "Config": {"Hostname": "builder", "User": "0:0", "Env": null, "Tty": true},
    "HostConfig": {"NetworkMode": "host", "SecurityOpt": ["seccomp=unconfined"]},
    "Mounts": null
}"#;

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("inspect.json"), INSPECT).unwrap();
    dir
}

fn docket(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("docket").unwrap();
    cmd.env_remove("DOCKET_BUNDLE")
        .arg("--input")
        .arg(dir.path().join("inspect.json"))
        .arg("--bundle")
        .arg(dir.path());
    cmd
}

#[test]
fn writes_config_into_bundle() {
    let dir = setup();

    docket(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json has been saved."));

    let config: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("config.json")).unwrap()).unwrap();
    assert_eq!(config["hostname"], "builder");
    assert_eq!(config["root"]["path"], "rootfs");
    assert_eq!(config["process"]["terminal"], true);
    assert_eq!(config["process"]["args"][0], "sh");
    assert!(config["linux"].get("seccomp").is_none());
}

#[test]
fn refuses_to_overwrite_without_force() {
    let dir = setup();

    docket(&dir).assert().success();
    docket(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("exists"));
    docket(&dir).arg("--force").assert().success();
}

#[test]
fn custom_rootfs_is_recorded() {
    let dir = setup();

    docket(&dir).args(["--rootfs", "/var/lib/images/busybox"]).assert().success();

    let config: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("config.json")).unwrap()).unwrap();
    assert_eq!(config["root"]["path"], "/var/lib/images/busybox");
}

#[test]
fn rejects_unknown_hook_stage() {
    let dir = setup();

    docket(&dir)
        .args(["--hook", "prestop:true"])
        .assert()
        .failure();
    assert!(!dir.path().join("config.json").exists());
}

#[test]
fn requires_container_or_input() {
    Command::cargo_bin("docket").unwrap().assert().failure();
}

#[test]
fn non_unix_docker_host_is_rejected() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("docket")
        .unwrap()
        .env("DOCKER_HOST", "tcp://10.0.0.5:2375")
        .arg("--bundle")
        .arg(dir.path())
        .arg("web")
        .assert()
        .failure()
        .stderr(predicate::str::contains("only unix:// engine addresses are supported"));
    assert!(!dir.path().join("config.json").exists());
}
