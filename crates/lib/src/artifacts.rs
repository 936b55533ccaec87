//! Built binaries waiting to be uploaded.
//!
//! Compiling is someone else's job: a build step drops one binary per
//! platform somewhere, and an [`ArtifactSource`] hands them to the publisher.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::platform::PlatformTarget;

#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("no {platform} binary found at {path}")]
  Missing { platform: PlatformTarget, path: PathBuf },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Provides the freshly built binary for a platform.
pub trait ArtifactSource {
  fn artifact(&self, platform: PlatformTarget) -> Result<Vec<u8>, ArtifactError>;
}

impl<T: ArtifactSource + ?Sized> ArtifactSource for &T {
  fn artifact(&self, platform: PlatformTarget) -> Result<Vec<u8>, ArtifactError> {
    (**self).artifact(platform)
  }
}

/// Binaries already built into a directory as `<dir>/<binary>-<platform>`.
#[derive(Debug, Clone)]
pub struct PrebuiltDir {
  dir: PathBuf,
  binary_name: String,
}

impl PrebuiltDir {
  pub fn new(dir: impl Into<PathBuf>, binary_name: impl Into<String>) -> Self {
    Self {
      dir: dir.into(),
      binary_name: binary_name.into(),
    }
  }

  pub fn path_for(&self, platform: PlatformTarget) -> PathBuf {
    self.dir.join(platform.artifact_name(&self.binary_name))
  }
}

impl ArtifactSource for PrebuiltDir {
  fn artifact(&self, platform: PlatformTarget) -> Result<Vec<u8>, ArtifactError> {
    let path = self.path_for(platform);
    fs::read(&path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        ArtifactError::Missing { platform, path }
      } else {
        ArtifactError::Read { path, source: e }
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn reads_named_binaries() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tool-windows-amd64.exe"), b"MZ").unwrap();
    let source = PrebuiltDir::new(temp.path(), "tool");

    assert_eq!(source.artifact(PlatformTarget::WINDOWS_AMD64).unwrap(), b"MZ");
  }

  #[test]
  fn missing_binary_names_the_platform() {
    let temp = TempDir::new().unwrap();
    let source = PrebuiltDir::new(temp.path(), "tool");

    let err = source.artifact(PlatformTarget::LINUX_ARM64).unwrap_err();
    assert!(matches!(
      err,
      ArtifactError::Missing {
        platform: PlatformTarget::LINUX_ARM64,
        ..
      }
    ));
    assert!(err.to_string().contains("linux-arm64"));
  }
}
