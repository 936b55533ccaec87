//! Project configuration.
//!
//! Read from `shipshape.toml`; the store location and public URL can be
//! overridden through `SHIPSHAPE_STORE` and `SHIPSHAPE_PUBLIC_URL`. Relative
//! paths are resolved against the directory holding the config file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::consts::{PUBLIC_URL_ENV, STORE_ENV};
use crate::fingerprint::SourceSet;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {path}")]
  NotFound { path: PathBuf },

  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("no object store location configured (set store.location or SHIPSHAPE_STORE)")]
  MissingStore,

  #[error("invalid binary name '{name}'")]
  InvalidBinaryName { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
  pub root: PathBuf,
  pub extensions: Vec<String>,
  pub exclude_dirs: Vec<String>,
  pub manifests: Vec<String>,
}

impl Default for SourcesConfig {
  fn default() -> Self {
    Self {
      root: PathBuf::from("."),
      extensions: vec!["go".to_string()],
      exclude_dirs: vec!["test-files".to_string()],
      manifests: vec!["go.mod".to_string(), "go.sum".to_string()],
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
  pub location: Option<PathBuf>,
  pub public_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactsConfig {
  pub bin_dir: PathBuf,
  pub install_script: Option<PathBuf>,
}

impl Default for ArtifactsConfig {
  fn default() -> Self {
    Self {
      bin_dir: PathBuf::from("bin"),
      install_script: Some(PathBuf::from("install.sh")),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
  /// Base name of the published binaries (`<binary_name>-<platform>`).
  pub binary_name: String,
  #[serde(default)]
  pub sources: SourcesConfig,
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub artifacts: ArtifactsConfig,
  #[serde(skip)]
  base_dir: PathBuf,
}

impl ReleaseConfig {
  /// Loads `path` and applies environment overrides.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        ConfigError::NotFound {
          path: path.to_path_buf(),
        }
      } else {
        ConfigError::Read {
          path: path.to_path_buf(),
          source: e,
        }
      }
    })?;
    let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    Self::parse(&content, base_dir)
      .map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
      })
      .and_then(Self::validated)
  }

  /// Parses config text; relative paths resolve against `base_dir`.
  pub fn parse(content: &str, base_dir: PathBuf) -> Result<Self, toml::de::Error> {
    let mut config: Self = toml::from_str(content)?;
    config.base_dir = base_dir;
    config.apply_env();
    Ok(config)
  }

  fn apply_env(&mut self) {
    if let Some(location) = non_empty_env(STORE_ENV) {
      self.store.location = Some(PathBuf::from(location));
    }
    if let Some(url) = non_empty_env(PUBLIC_URL_ENV) {
      self.store.public_url = Some(url);
    }
  }

  fn validated(self) -> Result<Self, ConfigError> {
    let name = self.binary_name.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name != self.binary_name {
      return Err(ConfigError::InvalidBinaryName {
        name: self.binary_name,
      });
    }
    Ok(self)
  }

  fn resolve(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.base_dir.join(path)
    }
  }

  /// Directory acting as the object store.
  pub fn store_location(&self) -> Result<PathBuf, ConfigError> {
    self
      .store
      .location
      .as_deref()
      .map(|p| self.resolve(p))
      .ok_or(ConfigError::MissingStore)
  }

  /// Base URL binaries are downloaded from.
  ///
  /// Defaults to a `file://` URL of the store location.
  pub fn public_url(&self) -> Result<String, ConfigError> {
    if let Some(url) = &self.store.public_url {
      return Ok(url.trim_end_matches('/').to_string());
    }
    let location = self.store_location()?;
    let location = dunce::canonicalize(&location).unwrap_or(location);
    let path = location.to_string_lossy().replace('\\', "/");
    let sep = if path.starts_with('/') { "" } else { "/" };
    Ok(format!("file://{}{}", sep, path.trim_end_matches('/')))
  }

  pub fn source_set(&self) -> SourceSet {
    SourceSet {
      root: self.resolve(&self.sources.root),
      extensions: self.sources.extensions.clone(),
      exclude_dirs: self.sources.exclude_dirs.clone(),
      manifests: self.sources.manifests.clone(),
    }
  }

  pub fn bin_dir(&self) -> PathBuf {
    self.resolve(&self.artifacts.bin_dir)
  }

  pub fn install_script(&self) -> Option<PathBuf> {
    self.artifacts.install_script.as_deref().map(|p| self.resolve(p))
  }
}

fn non_empty_env(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
