//! Hash command integration tests.

use super::common::TestEnv;

fn hash(env: &TestEnv) -> String {
  let out = env.ship_cmd().arg("hash").output().unwrap();
  assert!(out.status.success());
  String::from_utf8(out.stdout).unwrap().lines().next().unwrap().to_string()
}

#[test]
fn hash_is_stable() {
  let env = TestEnv::project();
  assert_eq!(hash(&env), hash(&env));
}

#[test]
fn hash_ignores_non_source_files() {
  let env = TestEnv::project();
  let before = hash(&env);

  env.write_file("project/README.md", "# docs");
  env.write_file("project/test-files/fixture.go", "package fixture");

  assert_eq!(hash(&env), before);
}

#[test]
fn hash_tracks_sources_and_manifests() {
  let env = TestEnv::project();
  let initial = hash(&env);

  env.write_file("project/main.go", "package main // changed\n");
  let edited = hash(&env);
  assert_ne!(edited, initial);

  env.write_file("project/go.sum", "example.com/dep v1.0.0 h1:abc=\n");
  assert_ne!(hash(&env), edited);
}

#[test]
fn hash_json_lists_files() {
  let env = TestEnv::project();

  let out = env.ship_cmd().args(["hash", "-o", "json"]).output().unwrap();
  assert!(out.status.success());

  let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
  assert_eq!(json["files"], serde_json::json!(["go.mod", "main.go"]));
}
