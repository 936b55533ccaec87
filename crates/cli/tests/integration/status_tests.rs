//! Status command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn status_after_publish() {
  let env = TestEnv::project();
  env
    .ship_cmd()
    .args(["publish", "1.2.0", "--summary", "Faster indexing"])
    .assert()
    .success();

  env
    .ship_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("Latest release: 1.2.0"))
    .stdout(predicate::str::contains("Faster indexing"))
    .stdout(predicate::str::contains("linux-amd64"))
    .stdout(predicate::str::contains("(missing)").not());
}

#[test]
fn status_flags_missing_binary() {
  let env = TestEnv::project();
  env.publish("1.0.0");
  std::fs::remove_file(env.store_file("releases/v1.0.0/tool-darwin-amd64")).unwrap();

  env
    .ship_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("(missing)"))
    .stderr(predicate::str::contains("out of sync"));
}

#[test]
fn status_json_reports_each_platform() {
  let env = TestEnv::project();
  env.publish("1.0.0");

  let out = env.ship_cmd().args(["status", "-o", "json"]).output().unwrap();
  assert!(out.status.success());

  let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(json["latest"]["version"], "1.0.0");
  let platforms = json["platforms"].as_array().unwrap();
  assert_eq!(platforms.len(), 5);
  assert!(platforms.iter().all(|p| p["present"] == true));
}

#[test]
fn status_tolerates_non_hex_recorded_hash() {
  let env = TestEnv::project();
  env.publish("1.0.0");
  let mut metadata = env.read_json("releases/v1.0.0/metadata.json");
  metadata["content_hash"] = serde_json::json!("abcdefgé1234");
  env.write_file("bucket/releases/v1.0.0/metadata.json", &metadata.to_string());

  env
    .ship_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("abcdefgé"));
}
