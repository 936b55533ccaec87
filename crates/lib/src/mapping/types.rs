use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::PlatformTarget;

/// The `binary-mapping.json` record: which version folder currently holds
/// each platform's authoritative binary.
///
/// Treated as a value: a run loads it, derives the next value with
/// [`GlobalBinaryMapping::advance`] and writes the whole thing back once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalBinaryMapping {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_updated: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub latest_version: Option<String>,
  /// Platform key to version folder.
  #[serde(default)]
  pub binary_sources: BTreeMap<String, String>,
  /// Top-level fields written by other tools, kept as-is.
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GlobalBinaryMapping {
  /// The version currently claimed for `platform`, if any.
  pub fn claim(&self, platform: PlatformTarget) -> Option<&str> {
    self.binary_sources.get(&platform.key()).map(String::as_str)
  }

  /// Next mapping value after publishing `version`.
  ///
  /// Every platform in `sources` is repointed; claims for platforms not in
  /// `sources` are kept.
  pub fn advance(&self, version: &str, sources: &BTreeMap<PlatformTarget, String>, now: DateTime<Utc>) -> Self {
    let mut next = self.clone();
    next.last_updated = Some(now);
    next.latest_version = Some(version.to_string());
    for (platform, source) in sources {
      next.binary_sources.insert(platform.key(), source.clone());
    }
    next
  }
}
