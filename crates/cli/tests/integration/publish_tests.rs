//! Publish command integration tests.

use predicates::prelude::*;

use super::common::{PLATFORM_KEYS, TestEnv};

#[test]
fn publish_first_release() {
  let env = TestEnv::project();

  env
    .ship_cmd()
    .args(["publish", "1.0.0", "--summary", "Initial release"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Published 1.0.0"))
    .stdout(predicate::str::contains("Binaries uploaded: 5"))
    .stdout(predicate::str::contains("https://dl.example.com/releases/v1.0.0/"));

  for key in PLATFORM_KEYS {
    assert_eq!(
      env.read_store(&format!("releases/v1.0.0/tool-{}", key)),
      format!("v1:{}", key)
    );
  }
  assert_eq!(env.read_store("latest-version.txt"), "1.0.0");
  assert_eq!(env.read_store("install.sh"), "#!/bin/sh\necho installing\n");

  let metadata = env.read_json("releases/v1.0.0/metadata.json");
  assert_eq!(metadata["version"], "1.0.0");
  assert_eq!(metadata["release_summary"], "Initial release");
  assert_eq!(
    metadata["binaries"]["linux-amd64"]["url"],
    "https://dl.example.com/releases/v1.0.0/tool-linux-amd64"
  );
  assert_eq!(metadata["binaries"]["linux-amd64"]["newly_built"], true);

  let mapping = env.read_json("binary-mapping.json");
  assert_eq!(mapping["latest_version"], "1.0.0");
  assert_eq!(mapping["binary_sources"]["windows-amd64.exe"], "1.0.0");
}

#[test]
fn unchanged_release_reuses_binaries() {
  let env = TestEnv::project();
  env.publish("1.0.0");
  env.remove_binaries();
  env.write_file("project/README.md", "docs change only");

  env
    .ship_cmd()
    .args(["publish", "1.0.1"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Binaries uploaded: 0"));

  assert!(!env.store_file("releases/v1.0.1/tool-linux-amd64").exists());
  let metadata = env.read_json("releases/v1.0.1/metadata.json");
  assert_eq!(metadata["binaries"]["darwin-arm64"]["reused_from"], "1.0.0");
  assert_eq!(
    metadata["binaries"]["darwin-arm64"]["url"],
    "https://dl.example.com/releases/v1.0.0/tool-darwin-arm64"
  );
  assert_eq!(env.read_store("latest-version.txt"), "1.0.1");
  assert_eq!(env.read_json("binary-mapping.json")["binary_sources"]["darwin-arm64"], "1.0.0");
}

#[test]
fn changed_release_builds_again() {
  let env = TestEnv::project();
  env.publish("1.0.0");
  env.write_file("project/main.go", "package main // v2\n");
  env.write_binaries("v2");

  env.publish("1.1.0");

  assert_eq!(env.read_store("releases/v1.1.0/tool-linux-arm64"), "v2:linux-arm64");
  assert_eq!(env.read_json("binary-mapping.json")["binary_sources"]["linux-arm64"], "1.1.0");
}

#[test]
fn stale_mapping_is_repaired() {
  let env = TestEnv::project();
  env.publish("1.0.0");
  std::fs::remove_file(env.store_file("releases/v1.0.0/tool-linux-amd64")).unwrap();
  env.write_file(
    "bucket/releases/v0.9.0/tool-linux-amd64",
    "old:linux-amd64",
  );

  env
    .ship_cmd()
    .args(["publish", "1.0.1"])
    .assert()
    .success()
    .stderr(predicate::str::contains("Mapping entries corrected: 1"));

  let mapping = env.read_json("binary-mapping.json");
  assert_eq!(mapping["binary_sources"]["linux-amd64"], "0.9.0");
  assert_eq!(mapping["binary_sources"]["linux-arm64"], "1.0.0");
}

#[test]
fn missing_artifact_aborts_without_writes() {
  let env = TestEnv::project();
  std::fs::remove_file(env.project_path().join("bin/tool-windows-amd64.exe")).unwrap();

  env
    .ship_cmd()
    .args(["publish", "1.0.0"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("windows-amd64.exe"));

  assert_eq!(std::fs::read_dir(env.store_path()).unwrap().count(), 0);
}

#[test]
fn republishing_a_version_fails() {
  let env = TestEnv::project();
  env.publish("1.0.0");

  env
    .ship_cmd()
    .args(["publish", "1.0.0"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("already been published"));
}

#[test]
fn malformed_version_fails() {
  let env = TestEnv::project();

  env
    .ship_cmd()
    .args(["publish", "v1.0"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not a release version"));
}

#[test]
fn mapping_out_writes_local_copy() {
  let env = TestEnv::project();
  let out = env.temp.path().join("mapping.json");

  env
    .ship_cmd()
    .args(["publish", "1.0.0", "--mapping-out"])
    .arg(&out)
    .assert()
    .success();

  let local: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
  assert_eq!(local, env.read_json("binary-mapping.json"));
}

#[test]
fn unknown_mapping_fields_survive_publish() {
  let env = TestEnv::project();
  env.publish("1.0.0");
  let mut mapping = env.read_json("binary-mapping.json");
  mapping["channel"] = serde_json::json!("stable");
  env.write_file("bucket/binary-mapping.json", &mapping.to_string());

  env.publish("1.0.1");

  assert_eq!(env.read_json("binary-mapping.json")["channel"], "stable");
}

#[test]
fn publish_json_output() {
  let env = TestEnv::project();

  let out = env.ship_cmd().args(["publish", "1.0.0", "-o", "json"]).output().unwrap();
  assert!(out.status.success());

  let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(json["version"], "1.0.0");
  assert_eq!(json["uploaded"].as_array().unwrap().len(), 5);
  assert_eq!(json["installer_mirrored"], true);
}

#[test]
fn malformed_latest_pointer_is_treated_as_first_release() {
  let env = TestEnv::project();
  env.write_file("bucket/latest-version.txt", "../../etc");

  env
    .ship_cmd()
    .args(["publish", "1.0.0"])
    .assert()
    .success()
    .stdout(predicate::str::contains("first release"));

  assert_eq!(env.read_store("latest-version.txt"), "1.0.0");
}
