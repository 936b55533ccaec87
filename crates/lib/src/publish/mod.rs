//! The release publishing pipeline.
//!
//! Runs strictly in sequence: fingerprint, resolve, settle, upload fresh
//! binaries, write the release record, write the mapping, move the latest
//! pointer, mirror the installer. The record and mapping writes are
//! independent; a crash between them leaves a mapping that the next run's
//! verification repairs.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::artifacts::{ArtifactError, ArtifactSource, PrebuiltDir};
use crate::config::{ConfigError, ReleaseConfig};
use crate::fingerprint::{ContentFingerprint, SourceSet, fingerprint};
use crate::mapping::{GlobalBinaryMapping, MappingError};
use crate::object_store::keys::{INSTALL_SCRIPT_KEY, artifact_key, metadata_key};
use crate::object_store::{FsObjectStore, ObjectStore, ObjectStoreError};
use crate::platform::PlatformTarget;
use crate::release::{MetadataError, ReleaseMetadata};
use crate::resolve::{NewRelease, ResolutionPlan, ResolveError, Resolver, Settlement};
use crate::version::is_release_version;

#[derive(Debug, Error)]
pub enum PublishError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("'{version}' is not a release version (expected <major>.<minor>.<patch> with an optional letter)")]
  InvalidVersion { version: String },

  #[error("version {version} has already been published")]
  AlreadyPublished { version: String },

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Artifact(#[from] ArtifactError),

  #[error(transparent)]
  Metadata(#[from] MetadataError),

  #[error(transparent)]
  Mapping(#[from] MappingError),

  #[error(transparent)]
  Store(#[from] ObjectStoreError),

  #[error("failed to read installer script {path}: {source}")]
  InstallScript {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Inputs of one release.
#[derive(Debug, Clone)]
pub struct PublishRequest {
  pub version: String,
  pub summary: Option<String>,
  pub description: Option<String>,
  /// Set when an external diff check found no build-relevant changes.
  pub force_reuse: bool,
  pub now: DateTime<Utc>,
}

impl PublishRequest {
  /// Request for `version` with no notes, stamped now.
  pub fn new(version: impl Into<String>) -> Self {
    Self {
      version: version.into(),
      summary: None,
      description: None,
      force_reuse: false,
      now: Utc::now(),
    }
  }
}

/// Result of a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
  pub fingerprint: ContentFingerprint,
  pub plan: ResolutionPlan,
  pub settlement: Settlement,
}

/// Result of a completed release.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
  pub version: String,
  pub fingerprint: ContentFingerprint,
  pub plan: ResolutionPlan,
  pub settlement: Settlement,
  /// Keys of the binaries uploaded by this run.
  pub uploaded: Vec<String>,
  pub installer_mirrored: bool,
  pub release_url: String,
}

impl PublishReport {
  /// The release record that was written.
  pub fn metadata(&self) -> &ReleaseMetadata {
    &self.settlement.metadata
  }

  /// The binary mapping that was written.
  pub fn mapping(&self) -> &GlobalBinaryMapping {
    &self.settlement.mapping
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStatus {
  pub platform: PlatformTarget,
  pub claim: Option<String>,
  /// Whether the claimed object exists. `false` when there is no claim.
  pub present: bool,
}

/// Current state of the store.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
  pub latest: Option<ReleaseMetadata>,
  pub mapping: GlobalBinaryMapping,
  pub platforms: Vec<PlatformStatus>,
}

impl StatusReport {
  /// Whether every platform has a claim that points at a stored binary.
  pub fn is_consistent(&self) -> bool {
    self.platforms.iter().all(|p| p.present)
  }
}

/// Publishes releases to an object store.
#[derive(Debug)]
pub struct Publisher<S, A> {
  resolver: Resolver<S>,
  artifacts: A,
  sources: SourceSet,
  install_script: Option<PathBuf>,
}

impl Publisher<FsObjectStore, PrebuiltDir> {
  /// Publisher for a directory-backed store and a directory of prebuilt binaries.
  pub fn from_config(config: &ReleaseConfig) -> Result<Self, PublishError> {
    let store = FsObjectStore::new(config.store_location()?);
    let resolver = Resolver::new(store, config.binary_name.clone(), config.public_url()?);
    let artifacts = PrebuiltDir::new(config.bin_dir(), config.binary_name.clone());
    Ok(Self::new(resolver, artifacts, config.source_set()).with_install_script(config.install_script()))
  }
}

impl<S: ObjectStore, A: ArtifactSource> Publisher<S, A> {
  /// Publisher without an installer script.
  pub fn new(resolver: Resolver<S>, artifacts: A, sources: SourceSet) -> Self {
    Self {
      resolver,
      artifacts,
      sources,
      install_script: None,
    }
  }

  /// Installer script mirrored to the bucket root on every release.
  pub fn with_install_script(mut self, path: Option<PathBuf>) -> Self {
    self.install_script = path;
    self
  }

  /// The resolver this publisher settles releases with.
  pub fn resolver(&self) -> &Resolver<S> {
    &self.resolver
  }

  /// Fingerprint of the configured source tree as it is now.
  pub fn fingerprint(&self) -> ContentFingerprint {
    fingerprint(&self.sources)
  }

  /// Computes what publishing `request` would do, without writing.
  pub fn check(&self, request: &PublishRequest) -> Result<CheckReport, PublishError> {
    let fingerprint = self.fingerprint();
    let plan = self.resolver.resolve(&fingerprint, request.force_reuse)?;
    let settlement = self.resolver.settle(&plan, &self.new_release(request, &fingerprint))?;
    Ok(CheckReport {
      fingerprint,
      plan,
      settlement,
    })
  }

  /// Publishes `request.version`.
  ///
  /// All fresh binaries are loaded before the first write, so a missing
  /// artifact aborts the run with the store untouched.
  pub fn publish(&self, request: &PublishRequest) -> Result<PublishReport, PublishError> {
    let version = &request.version;
    if !is_release_version(version) {
      return Err(PublishError::InvalidVersion {
        version: version.clone(),
      });
    }
    let store = self.resolver.store();
    if store.exists(&metadata_key(version))? {
      return Err(PublishError::AlreadyPublished {
        version: version.clone(),
      });
    }

    let fingerprint = self.fingerprint();
    info!(version = %version, fingerprint = %fingerprint.short(), "publishing release");

    let plan = self.resolver.resolve(&fingerprint, request.force_reuse)?;
    let settlement = self.resolver.settle(&plan, &self.new_release(request, &fingerprint))?;

    let builds = plan.builds();
    let mut binaries = Vec::with_capacity(builds.len());
    for platform in builds {
      binaries.push((platform, self.artifacts.artifact(platform)?));
    }

    let mut uploaded = Vec::with_capacity(binaries.len());
    for (platform, bytes) in &binaries {
      let key = artifact_key(version, *platform, self.resolver.binary_name());
      store.put(&key, bytes)?;
      info!(key = %key, size = bytes.len(), "uploaded binary");
      uploaded.push(key);
    }

    let releases = self.resolver.releases();
    releases.put(&settlement.metadata)?;
    self.resolver.binary_map().save(&settlement.mapping)?;
    releases.set_latest(version)?;

    let installer_mirrored = self.mirror_install_script()?;

    for corrected in settlement.corrections() {
      info!(
        platform = %corrected.platform,
        version = %corrected.authoritative,
        "mapping entry corrected"
      );
    }
    info!(version = %version, uploads = uploaded.len(), "release published");

    Ok(PublishReport {
      version: version.clone(),
      release_url: self.resolver.release_url(version),
      fingerprint,
      plan,
      settlement,
      uploaded,
      installer_mirrored,
    })
  }

  /// Reports the latest release and whether each mapping claim holds.
  pub fn status(&self) -> Result<StatusReport, PublishError> {
    let latest = self.resolver.releases().latest()?;
    let map = self.resolver.binary_map();
    let mapping = map.load()?;

    let mut platforms = Vec::with_capacity(PlatformTarget::ALL.len());
    for platform in PlatformTarget::ALL {
      let claim = mapping.claim(platform).map(str::to_string);
      let present = match &claim {
        Some(version) => map.verify(platform, version)?,
        None => false,
      };
      platforms.push(PlatformStatus {
        platform,
        claim,
        present,
      });
    }

    Ok(StatusReport {
      latest,
      mapping,
      platforms,
    })
  }

  fn new_release(&self, request: &PublishRequest, fingerprint: &ContentFingerprint) -> NewRelease {
    NewRelease {
      version: request.version.clone(),
      fingerprint: fingerprint.clone(),
      summary: request.summary.clone(),
      description: request.description.clone(),
      created_at: request.now,
    }
  }

  fn mirror_install_script(&self) -> Result<bool, PublishError> {
    let Some(path) = &self.install_script else {
      return Ok(false);
    };
    let bytes = match fs::read(path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        warn!(path = %path.display(), "installer script not found, skipping");
        return Ok(false);
      }
      Err(e) => {
        return Err(PublishError::InstallScript {
          path: path.clone(),
          source: e,
        });
      }
    };
    self.resolver.store().put(INSTALL_SCRIPT_KEY, &bytes)?;
    Ok(true)
  }
}
