//! Object store access.
//!
//! The release pipeline never talks to a network or filesystem directly; all
//! reads and writes go through an [`ObjectStore`]. Calls are blocking and are
//! issued one at a time.
//!
//! # Keyspace
//!
//! ```text
//! <bucket>/
//! ├── releases/
//! │   └── v<version>/
//! │       ├── <binary>-<platform>   # one object per platform per version
//! │       └── metadata.json         # ReleaseMetadata
//! ├── binary-mapping.json           # GlobalBinaryMapping
//! ├── latest-version.txt            # current version pointer
//! └── install.sh                    # mirrored installer script
//! ```

pub mod fs;
pub mod keys;
pub mod memory;

use std::io;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub use fs::FsObjectStore;
pub use memory::MemoryStore;

/// Listing entry returned by [`ObjectStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
  pub key: String,
  pub size: u64,
  pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ObjectStoreError {
  #[error("object not found: {key}")]
  NotFound { key: String },

  #[error("invalid object key: '{key}'")]
  InvalidKey { key: String },

  #[error("transfer failed for '{key}': {source}")]
  Transfer {
    key: String,
    #[source]
    source: io::Error,
  },
}

impl ObjectStoreError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::NotFound { .. })
  }

  pub(crate) fn transfer(key: &str, source: io::Error) -> Self {
    Self::Transfer {
      key: key.to_string(),
      source,
    }
  }
}

/// Client for a flat key/value object store (an S3-style bucket).
pub trait ObjectStore {
  /// Returns whether an object is stored under `key`.
  fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;

  /// Reads the full object. Missing objects are [`ObjectStoreError::NotFound`].
  fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

  /// Writes (or overwrites) the object under `key`.
  fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ObjectStoreError>;

  /// Lists every object whose key starts with `prefix`, sorted by key.
  fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, ObjectStoreError>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
  fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
    (**self).exists(key)
  }

  fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
    (**self).get(key)
  }

  fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ObjectStoreError> {
    (**self).put(key, bytes)
  }

  fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, ObjectStoreError> {
    (**self).list(prefix)
  }
}

impl<T: ObjectStore + ?Sized> ObjectStore for Box<T> {
  fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
    (**self).exists(key)
  }

  fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
    (**self).get(key)
  }

  fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ObjectStoreError> {
    (**self).put(key, bytes)
  }

  fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, ObjectStoreError> {
    (**self).list(prefix)
  }
}
