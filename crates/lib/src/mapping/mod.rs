//! The global binary map.
//!
//! `binary-mapping.json` is the single piece of long-lived mutable state: it
//! tells installers which version folder holds each platform's binary. Claims
//! in it can go stale (objects deleted, a crash between writes), so every
//! claim is verified against the store before it is trusted, and stale ones
//! are repaired by searching the published releases.

mod types;

pub use types::GlobalBinaryMapping;

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::object_store::keys::{BINARY_MAPPING_KEY, RELEASES_PREFIX, artifact_key, parse_artifact_key};
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::platform::PlatformTarget;
use crate::version::{is_release_version, sort_descending};

#[derive(Debug, Error)]
pub enum MappingError {
  #[error("failed to serialize binary mapping: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error(transparent)]
  Store(#[from] ObjectStoreError),
}

/// How the authoritative version for a platform was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceOutcome {
  /// The existing claim points at a stored object.
  Verified,
  /// The claim was missing or stale; history search found a stored object.
  Repaired { stale: Option<String> },
  /// Nothing in the store has the object; the fallback version was used.
  Fallback { stale: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceResolution {
  pub version: String,
  pub outcome: SourceOutcome,
}

/// Load, save, verify and repair operations on the global binary map.
#[derive(Debug, Clone)]
pub struct BinaryMap<S> {
  store: S,
  binary_name: String,
}

impl<S: ObjectStore> BinaryMap<S> {
  /// Mapping access for binaries named `binary_name`.
  pub fn new(store: S, binary_name: impl Into<String>) -> Self {
    Self {
      store,
      binary_name: binary_name.into(),
    }
  }

  /// Loads the mapping. A missing or corrupt mapping is an empty one.
  pub fn load(&self) -> Result<GlobalBinaryMapping, MappingError> {
    let bytes = match self.store.get(BINARY_MAPPING_KEY) {
      Ok(bytes) => bytes,
      Err(e) if e.is_not_found() => {
        debug!("no binary mapping yet");
        return Ok(GlobalBinaryMapping::default());
      }
      Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice(&bytes) {
      Ok(mapping) => Ok(mapping),
      Err(e) => {
        warn!(error = %e, "binary mapping is corrupt, starting from an empty mapping");
        Ok(GlobalBinaryMapping::default())
      }
    }
  }

  /// Overwrites the stored mapping. Last writer wins.
  pub fn save(&self, mapping: &GlobalBinaryMapping) -> Result<(), MappingError> {
    let content = serde_json::to_vec_pretty(mapping).map_err(MappingError::Serialize)?;
    self.store.put(BINARY_MAPPING_KEY, &content)?;
    Ok(())
  }

  /// Whether `platform`'s binary is stored under `version`. Anything that is
  /// not a release version is never stored.
  pub fn verify(&self, platform: PlatformTarget, version: &str) -> Result<bool, MappingError> {
    if !is_release_version(version) {
      return Ok(false);
    }
    let key = artifact_key(version, platform, &self.binary_name);
    Ok(self.store.exists(&key)?)
  }

  /// Finds the newest version that actually holds `platform`'s binary.
  ///
  /// Lists every object under `releases/`, keeps keys of the form
  /// `releases/v<version>/<artifact>` and returns the greatest version.
  pub fn repair(&self, platform: PlatformTarget) -> Result<Option<String>, MappingError> {
    let artifact = platform.artifact_name(&self.binary_name);
    let candidates: BTreeSet<String> = self
      .store
      .list(RELEASES_PREFIX)?
      .iter()
      .filter_map(|object| parse_artifact_key(&object.key, &artifact))
      .map(str::to_string)
      .collect();

    let mut candidates: Vec<String> = candidates.into_iter().collect();
    sort_descending(&mut candidates);
    debug!(platform = %platform, candidates = candidates.len(), "searched release history");
    Ok(candidates.into_iter().next())
  }

  /// Decides which version folder is authoritative for `platform`.
  ///
  /// A verified claim is kept even if it is older than `fallback`. A missing
  /// or stale claim is repaired from history; if history has nothing, the
  /// result is `fallback`.
  pub fn resolve_source(
    &self,
    platform: PlatformTarget,
    claim: Option<&str>,
    fallback: &str,
  ) -> Result<SourceResolution, MappingError> {
    if let Some(claimed) = claim {
      if !is_release_version(claimed) {
        warn!(platform = %platform, version = %claimed, "mapped version is malformed, treating it as stale");
      } else if self.verify(platform, claimed)? {
        debug!(platform = %platform, version = %claimed, "mapping claim verified");
        return Ok(SourceResolution {
          version: claimed.to_string(),
          outcome: SourceOutcome::Verified,
        });
      } else {
        warn!(platform = %platform, version = %claimed, "mapped binary is missing from the store");
      }
    }

    let stale = claim.map(str::to_string);
    match self.repair(platform)? {
      Some(found) => {
        info!(platform = %platform, version = %found, "found binary in release history");
        Ok(SourceResolution {
          version: found,
          outcome: SourceOutcome::Repaired { stale },
        })
      }
      None => {
        warn!(
          platform = %platform,
          version = %fallback,
          "no stored binary found for platform, falling back"
        );
        Ok(SourceResolution {
          version: fallback.to_string(),
          outcome: SourceOutcome::Fallback { stale },
        })
      }
    }
  }
}
