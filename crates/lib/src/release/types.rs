use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::ContentFingerprint;
use crate::platform::PlatformTarget;

fn is_false(value: &bool) -> bool {
  !*value
}

/// Where one platform's binary for a release can be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryRef {
  pub url: String,
  /// Release this binary was carried over from. Set exactly when the binary
  /// was not uploaded as part of this release.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reused_from: Option<String>,
  /// Version folder the object physically lives in.
  pub last_updated_version: String,
  #[serde(default, skip_serializing_if = "is_false")]
  pub newly_built: bool,
}

impl BinaryRef {
  /// Reference to a binary uploaded by this release.
  pub fn built(url: String, version: &str) -> Self {
    Self {
      url,
      reused_from: None,
      last_updated_version: version.to_string(),
      newly_built: true,
    }
  }

  /// Reference to a binary carried over from `from`, stored under `location`.
  pub fn reused(url: String, from: &str, location: &str) -> Self {
    Self {
      url,
      reused_from: Some(from.to_string()),
      last_updated_version: location.to_string(),
      newly_built: false,
    }
  }
}

/// The `releases/v<version>/metadata.json` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
  pub version: String,
  pub created_at: DateTime<Utc>,
  pub content_hash: ContentFingerprint,
  pub release_summary: Option<String>,
  pub release_description: Option<String>,
  /// Keyed by [`PlatformTarget::key`].
  #[serde(default)]
  pub binaries: BTreeMap<String, BinaryRef>,
  #[serde(default)]
  pub binary_source_versions: BTreeMap<String, String>,
}

impl ReleaseMetadata {
  pub fn binary(&self, platform: PlatformTarget) -> Option<&BinaryRef> {
    self.binaries.get(&platform.key())
  }

  pub fn source_version(&self, platform: PlatformTarget) -> Option<&str> {
    self.binary_source_versions.get(&platform.key()).map(String::as_str)
  }
}
