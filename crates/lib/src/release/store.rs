//! Reading and writing release records in the object store.
//!
//! # Layout
//!
//! ```text
//! latest-version.txt               # plain-text pointer to the current version
//! releases/v<version>/metadata.json
//! ```

use thiserror::Error;
use tracing::{debug, warn};

use super::types::ReleaseMetadata;
use crate::object_store::keys::{LATEST_VERSION_KEY, metadata_key};
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::version::is_release_version;

#[derive(Debug, Error)]
pub enum MetadataError {
  #[error("metadata for version {version} already exists")]
  AlreadyExists { version: String },

  #[error("failed to serialize metadata: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error(transparent)]
  Store(#[from] ObjectStoreError),
}

/// Access to the per-version release records.
///
/// Missing or malformed records read as "no metadata", never as an error;
/// only genuine transfer failures are surfaced.
#[derive(Debug, Clone)]
pub struct MetadataStore<S> {
  store: S,
}

impl<S: ObjectStore> MetadataStore<S> {
  /// Wraps `store`.
  pub fn new(store: S) -> Self {
    Self { store }
  }

  /// Reads `latest-version.txt`.
  ///
  /// Returns `Ok(None)` if the pointer is missing, blank or not a release
  /// version.
  pub fn latest_version(&self) -> Result<Option<String>, MetadataError> {
    let bytes = match self.store.get(LATEST_VERSION_KEY) {
      Ok(bytes) => bytes,
      Err(e) if e.is_not_found() => {
        debug!("no latest version pointer");
        return Ok(None);
      }
      Err(e) => return Err(e.into()),
    };

    let version = String::from_utf8_lossy(&bytes).trim().to_string();
    if version.is_empty() {
      warn!(key = LATEST_VERSION_KEY, "latest version pointer is empty, treating as first release");
      return Ok(None);
    }
    if !is_release_version(&version) {
      warn!(key = LATEST_VERSION_KEY, pointer = %version, "latest version pointer is not a release version, ignoring it");
      return Ok(None);
    }
    Ok(Some(version))
  }

  /// Loads the record the latest-version pointer refers to.
  pub fn latest(&self) -> Result<Option<ReleaseMetadata>, MetadataError> {
    let Some(version) = self.latest_version()? else {
      return Ok(None);
    };
    let Some(mut metadata) = self.get(&version)? else {
      return Ok(None);
    };

    if metadata.version != version {
      warn!(
        pointer = %version,
        recorded = %metadata.version,
        "metadata version disagrees with its folder, using the folder version"
      );
      metadata.version = version;
    }
    Ok(Some(metadata))
  }

  /// Loads the record for `version`.
  pub fn get(&self, version: &str) -> Result<Option<ReleaseMetadata>, MetadataError> {
    let key = metadata_key(version);
    let bytes = match self.store.get(&key) {
      Ok(bytes) => bytes,
      Err(e) if e.is_not_found() => {
        warn!(version = %version, "no metadata recorded for version");
        return Ok(None);
      }
      Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice(&bytes) {
      Ok(metadata) => Ok(Some(metadata)),
      Err(e) => {
        warn!(version = %version, error = %e, "ignoring unparsable metadata");
        Ok(None)
      }
    }
  }

  /// Writes the record for a new release. Existing records are never replaced.
  pub fn put(&self, metadata: &ReleaseMetadata) -> Result<(), MetadataError> {
    let key = metadata_key(&metadata.version);
    if self.store.exists(&key)? {
      return Err(MetadataError::AlreadyExists {
        version: metadata.version.clone(),
      });
    }

    let content = serde_json::to_vec_pretty(metadata).map_err(MetadataError::Serialize)?;
    self.store.put(&key, &content)?;
    debug!(key = %key, "wrote release metadata");
    Ok(())
  }

  /// Points `latest-version.txt` at `version`.
  pub fn set_latest(&self, version: &str) -> Result<(), MetadataError> {
    self.store.put(LATEST_VERSION_KEY, version.as_bytes())?;
    Ok(())
  }
}
