//! Reuse resolution.
//!
//! Decides, for a new release, whether each platform needs a freshly built
//! binary or can reuse one already in the store, then settles which version
//! folder is authoritative for every platform. Settling is read-only: it
//! produces the new release record and the next global mapping, and the
//! caller writes both.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::fingerprint::ContentFingerprint;
use crate::mapping::{BinaryMap, GlobalBinaryMapping, MappingError, SourceOutcome};
use crate::object_store::ObjectStore;
use crate::object_store::keys::{artifact_key, version_dir};
use crate::platform::PlatformTarget;
use crate::release::{BinaryRef, MetadataError, MetadataStore, ReleaseMetadata};

#[derive(Debug, Error)]
pub enum ResolveError {
  /// Reuse was forced but nothing has been published yet.
  #[error("no previous release found to reuse binaries from")]
  NothingToReuse,

  #[error(transparent)]
  Metadata(#[from] MetadataError),

  #[error(transparent)]
  Mapping(#[from] MappingError),
}

/// What happens to one platform's binary in a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "version", rename_all = "snake_case")]
pub enum PlatformAction {
  /// A fresh binary is uploaded under the new version.
  Build,
  /// The binary published for this version is reused.
  ReuseFrom(String),
}

/// Why the plan came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanReason {
  FirstRelease,
  ContentChanged,
  ContentUnchanged,
  Forced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionPlan {
  pub reason: PlanReason,
  /// Release the binaries are reused from, when reusing.
  pub reuse_source: Option<String>,
  pub actions: BTreeMap<PlatformTarget, PlatformAction>,
}

impl ResolutionPlan {
  fn uniform(reason: PlanReason, reuse_source: Option<String>) -> Self {
    let action = match &reuse_source {
      Some(version) => PlatformAction::ReuseFrom(version.clone()),
      None => PlatformAction::Build,
    };
    let actions = PlatformTarget::ALL
      .into_iter()
      .map(|platform| (platform, action.clone()))
      .collect();
    Self {
      reason,
      reuse_source,
      actions,
    }
  }

  pub fn action(&self, platform: PlatformTarget) -> &PlatformAction {
    self.actions.get(&platform).unwrap_or(&PlatformAction::Build)
  }

  /// Platforms whose binaries must be uploaded, in processing order.
  pub fn builds(&self) -> Vec<PlatformTarget> {
    PlatformTarget::ALL
      .into_iter()
      .filter(|p| *self.action(*p) == PlatformAction::Build)
      .collect()
  }

  pub fn needs_build(&self) -> bool {
    !self.builds().is_empty()
  }
}

/// Plans a release from the latest published record and the current
/// fingerprint.
///
/// `force_reuse` means an external diff check established that no
/// build-relevant file changed; it requires a previous release.
pub fn plan(
  latest: Option<&ReleaseMetadata>,
  fingerprint: &ContentFingerprint,
  force_reuse: bool,
) -> Result<ResolutionPlan, ResolveError> {
  match latest {
    Some(latest) if force_reuse => Ok(ResolutionPlan::uniform(PlanReason::Forced, Some(latest.version.clone()))),
    None if force_reuse => Err(ResolveError::NothingToReuse),
    Some(latest) if latest.content_hash == *fingerprint => Ok(ResolutionPlan::uniform(
      PlanReason::ContentUnchanged,
      Some(latest.version.clone()),
    )),
    Some(_) => Ok(ResolutionPlan::uniform(PlanReason::ContentChanged, None)),
    None => Ok(ResolutionPlan::uniform(PlanReason::FirstRelease, None)),
  }
}

/// The release being published.
#[derive(Debug, Clone)]
pub struct NewRelease {
  pub version: String,
  pub fingerprint: ContentFingerprint,
  pub summary: Option<String>,
  pub description: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// How a platform's binary is provided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum Provision {
  /// Uploaded by this release.
  Upload,
  /// Served from an existing object.
  Existing { reused_from: String, outcome: SourceOutcome },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformSettlement {
  pub platform: PlatformTarget,
  /// Version folder holding the binary after this release.
  pub authoritative: String,
  pub provision: Provision,
}

/// Everything a release will write, computed before writing any of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
  pub platforms: Vec<PlatformSettlement>,
  pub metadata: ReleaseMetadata,
  pub mapping: GlobalBinaryMapping,
}

impl Settlement {
  /// Platforms whose mapping claim had to be repaired or fell back.
  pub fn corrections(&self) -> impl Iterator<Item = &PlatformSettlement> {
    self.platforms.iter().filter(|p| {
      matches!(
        p.provision,
        Provision::Existing {
          outcome: SourceOutcome::Repaired { .. } | SourceOutcome::Fallback { .. },
          ..
        }
      )
    })
  }
}

/// Resolves and settles releases against one object store.
#[derive(Debug, Clone)]
pub struct Resolver<S> {
  store: S,
  binary_name: String,
  public_url: String,
}

impl<S: ObjectStore> Resolver<S> {
  /// Resolver publishing `binary_name` with download URLs under `public_url`.
  pub fn new(store: S, binary_name: impl Into<String>, public_url: impl Into<String>) -> Self {
    Self {
      store,
      binary_name: binary_name.into(),
      public_url: public_url.into(),
    }
  }

  /// The underlying object store.
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Base name of the published binaries.
  pub fn binary_name(&self) -> &str {
    &self.binary_name
  }

  /// Release records in this store.
  pub fn releases(&self) -> MetadataStore<&S> {
    MetadataStore::new(&self.store)
  }

  /// The global binary map in this store.
  pub fn binary_map(&self) -> BinaryMap<&S> {
    BinaryMap::new(&self.store, self.binary_name.clone())
  }

  /// Public download URL of `platform`'s binary stored under `version`.
  pub fn artifact_url(&self, version: &str, platform: PlatformTarget) -> String {
    format!(
      "{}/{}",
      self.public_url.trim_end_matches('/'),
      artifact_key(version, platform, &self.binary_name)
    )
  }

  /// Public URL of the folder holding everything published for `version`.
  pub fn release_url(&self, version: &str) -> String {
    format!("{}/{}/", self.public_url.trim_end_matches('/'), version_dir(version))
  }

  /// Plans against the latest published release.
  pub fn resolve(&self, fingerprint: &ContentFingerprint, force_reuse: bool) -> Result<ResolutionPlan, ResolveError> {
    let latest = self.releases().latest()?;
    let plan = plan(latest.as_ref(), fingerprint, force_reuse)?;
    info!(
      reason = ?plan.reason,
      reuse_source = plan.reuse_source.as_deref().unwrap_or("-"),
      "resolved release plan"
    );
    Ok(plan)
  }

  /// Settles the authoritative version of every platform and derives the
  /// new release record and mapping. Nothing is written.
  pub fn settle(&self, plan: &ResolutionPlan, release: &NewRelease) -> Result<Settlement, ResolveError> {
    let map = self.binary_map();
    let current = map.load()?;

    let mut platforms = Vec::with_capacity(PlatformTarget::ALL.len());
    let mut binaries = BTreeMap::new();
    let mut sources = BTreeMap::new();

    for platform in PlatformTarget::ALL {
      let settled = match plan.action(platform) {
        PlatformAction::Build => PlatformSettlement {
          platform,
          authoritative: release.version.clone(),
          provision: Provision::Upload,
        },
        PlatformAction::ReuseFrom(from) => {
          let resolved = map.resolve_source(platform, current.claim(platform), from)?;
          PlatformSettlement {
            platform,
            authoritative: resolved.version,
            provision: Provision::Existing {
              reused_from: from.clone(),
              outcome: resolved.outcome,
            },
          }
        }
      };

      let url = self.artifact_url(&settled.authoritative, platform);
      let binary = match &settled.provision {
        Provision::Upload => BinaryRef::built(url, &settled.authoritative),
        Provision::Existing { reused_from, .. } => BinaryRef::reused(url, reused_from, &settled.authoritative),
      };
      binaries.insert(platform.key(), binary);
      sources.insert(platform, settled.authoritative.clone());
      platforms.push(settled);
    }

    let metadata = ReleaseMetadata {
      version: release.version.clone(),
      created_at: release.created_at,
      content_hash: release.fingerprint.clone(),
      release_summary: release.summary.clone(),
      release_description: release.description.clone(),
      binaries,
      binary_source_versions: sources.iter().map(|(p, v)| (p.key(), v.clone())).collect(),
    };
    let mapping = current.advance(&release.version, &sources, release.created_at);

    Ok(Settlement {
      platforms,
      metadata,
      mapping,
    })
  }
}
