//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const PLATFORM_KEYS: [&str; 5] = [
  "darwin-amd64",
  "darwin-arm64",
  "linux-amd64",
  "linux-arm64",
  "windows-amd64.exe",
];

const CONFIG: &str = r#"
binary_name = "tool"

[sources]
extensions = ["go"]
exclude_dirs = ["test-files"]
manifests = ["go.mod", "go.sum"]

[store]
public_url = "https://dl.example.com/"

[artifacts]
bin_dir = "bin"
install_script = "install.sh"
"#;

/// Isolated test environment.
///
/// Each test gets a temporary project tree and a separate store directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A Go-style project with a config, sources and a full set of binaries.
  pub fn project() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("project/shipshape.toml", CONFIG);
    env.write_file("project/main.go", "package main\n\nfunc main() {}\n");
    env.write_file("project/go.mod", "module example.com/tool\n");
    env.write_file("project/install.sh", "#!/bin/sh\necho installing\n");
    env.write_binaries("v1");
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Write one binary per platform, tagged so builds can be told apart.
  pub fn write_binaries(&self, tag: &str) {
    for key in PLATFORM_KEYS {
      self.write_file(&format!("project/bin/tool-{}", key), &format!("{}:{}", tag, key));
    }
  }

  pub fn remove_binaries(&self) {
    let bin = self.project_path().join("bin");
    if bin.exists() {
      std::fs::remove_dir_all(bin).unwrap();
    }
  }

  pub fn project_path(&self) -> PathBuf {
    self.temp.path().join("project")
  }

  /// Store path (isolated per test).
  pub fn store_path(&self) -> PathBuf {
    let p = self.temp.path().join("bucket");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn store_file(&self, key: &str) -> PathBuf {
    self.store_path().join(key)
  }

  pub fn read_store(&self, key: &str) -> String {
    std::fs::read_to_string(self.store_file(key)).unwrap_or_else(|e| panic!("missing store object {}: {}", key, e))
  }

  pub fn read_json(&self, key: &str) -> serde_json::Value {
    serde_json::from_str(&self.read_store(key)).unwrap()
  }

  /// Get a pre-configured Command for the ship binary.
  ///
  /// Runs inside the project directory with `SHIPSHAPE_STORE` pointing at
  /// the isolated store.
  pub fn ship_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("ship");
    cmd.current_dir(self.project_path());
    cmd.env("SHIPSHAPE_STORE", self.store_path());
    cmd.env_remove("SHIPSHAPE_PUBLIC_URL");
    cmd.env_remove("RUST_LOG");
    cmd
  }

  pub fn publish(&self, version: &str) {
    self.ship_cmd().args(["publish", version]).assert().success();
  }
}
