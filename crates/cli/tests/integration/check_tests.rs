//! Check command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn check_first_release_builds_everything() {
  let env = TestEnv::project();

  env
    .ship_cmd()
    .args(["check", "1.0.0"])
    .assert()
    .success()
    .stdout(predicate::str::contains("first release"))
    .stdout(predicate::str::contains("5 platform(s) need a build"));
}

#[test]
fn check_does_not_write() {
  let env = TestEnv::project();

  env.ship_cmd().args(["check", "1.0.0"]).assert().success();

  assert_eq!(std::fs::read_dir(env.store_path()).unwrap().count(), 0);
}

#[test]
fn check_after_release_reuses() {
  let env = TestEnv::project();
  env.publish("1.0.0");

  env
    .ship_cmd()
    .args(["check", "1.0.1"])
    .assert()
    .success()
    .stdout(predicate::str::contains("content unchanged since 1.0.0"))
    .stdout(predicate::str::contains("No builds needed"));
}

#[test]
fn check_json_reports_plan() {
  let env = TestEnv::project();
  env.publish("1.0.0");
  env.write_file("project/main.go", "package main // v2\n");

  let out = env.ship_cmd().args(["-o", "json", "check", "1.1.0"]).output().unwrap();
  assert!(out.status.success());

  let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(json["plan"]["reason"], "content_changed");
  assert_eq!(json["settlement"]["metadata"]["version"], "1.1.0");
}

#[test]
fn check_force_reuse_without_history_fails() {
  let env = TestEnv::project();

  env
    .ship_cmd()
    .args(["check", "1.0.0", "--force-reuse"])
    .assert()
    .failure();
}

#[test]
fn check_reports_changed_content() {
  let env = TestEnv::project();
  env.publish("1.0.0");
  env.write_file("project/main.go", "package main // v2\n");

  env
    .ship_cmd()
    .args(["check", "1.1.0"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Decision: content changed"));
}
