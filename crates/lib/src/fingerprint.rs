//! Content fingerprinting of build inputs.
//!
//! A fingerprint is a SHA-256 digest over every file that can change the
//! built binary: source files plus dependency manifest and lock files. It is
//! what lets a release detect that nothing build-relevant changed since the
//! previous one.
//!
//! The digest input is `path ++ content` for each file, with paths relative
//! to the source root, `/`-separated, deduplicated and sorted ascending by
//! bytes. Enumeration order on disk never affects the result. Renaming a file
//! changes the fingerprint.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::consts::SHORT_HASH_LEN;

/// Full 64-character lowercase hex SHA-256 of the build inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(pub String);

impl ContentFingerprint {
  /// The full hex digest.
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Abbreviated form for display: the first few characters.
  ///
  /// Values read back from the store are not guaranteed to be hex, so the
  /// cut is made on a character boundary.
  pub fn short(&self) -> &str {
    match self.0.char_indices().nth(SHORT_HASH_LEN) {
      Some((end, _)) => &self.0[..end],
      None => &self.0,
    }
  }
}

impl fmt::Display for ContentFingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl PartialEq<str> for ContentFingerprint {
  fn eq(&self, other: &str) -> bool {
    self.0 == other
  }
}

/// Describes which files influence the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
  /// Directory all paths are relative to.
  pub root: PathBuf,
  /// Source file extensions, without the dot (e.g. `go`).
  pub extensions: Vec<String>,
  /// Directories (relative to `root`) skipped entirely, such as test fixtures.
  pub exclude_dirs: Vec<String>,
  /// Dependency manifest and lock files (relative to `root`). Missing ones are skipped.
  pub manifests: Vec<String>,
}

impl SourceSet {
  fn relative(&self, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(&self.root).ok()?;
    let parts: Vec<String> = rel
      .components()
      .map(|c| c.as_os_str().to_string_lossy().into_owned())
      .collect();
    Some(parts.join("/"))
  }

  fn is_excluded(&self, rel: &str) -> bool {
    self.exclude_dirs.iter().any(|dir| {
      let dir = dir.trim_matches('/');
      rel == dir || rel.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
    })
  }

  fn is_source(&self, entry: &DirEntry) -> bool {
    entry.file_type().is_file()
      && entry
        .path()
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| self.extensions.iter().any(|want| want == ext))
  }
}

/// Enumerates the build-relevant files of `set`, sorted and deduplicated.
///
/// Directory entries that cannot be read are skipped.
pub fn collect_sources(set: &SourceSet) -> Vec<String> {
  let mut paths: Vec<String> = WalkDir::new(&set.root)
    .into_iter()
    .filter_entry(|e| match set.relative(e.path()) {
      Some(rel) => rel.is_empty() || !set.is_excluded(&rel),
      None => true,
    })
    .filter_map(|e| match e {
      Ok(entry) => Some(entry),
      Err(err) => {
        debug!(error = %err, "skipping unreadable entry");
        None
      }
    })
    .filter(|e| set.is_source(e))
    .filter_map(|e| set.relative(e.path()))
    .collect();

  for manifest in &set.manifests {
    let manifest = manifest.trim_start_matches("./");
    if set.root.join(manifest).is_file() {
      paths.push(manifest.to_string());
    }
  }

  paths.sort();
  paths.dedup();
  paths
}

/// Fingerprints the files described by `set`.
pub fn fingerprint(set: &SourceSet) -> ContentFingerprint {
  fingerprint_files(&set.root, &collect_sources(set))
}

/// Fingerprints already-enumerated `files`, relative to `root`.
///
/// A file that disappears or cannot be read between enumeration and hashing
/// is left out rather than failing the computation.
pub fn fingerprint_files(root: &Path, files: &[String]) -> ContentFingerprint {
  let entries = files.iter().filter_map(|rel| match fs::read(root.join(rel)) {
    Ok(content) => Some((rel.clone(), content)),
    Err(err) => {
      debug!(path = %rel, error = %err, "skipping unreadable file");
      None
    }
  });
  fingerprint_entries(entries)
}

/// Digest over explicit `(relative path, content)` pairs.
///
/// Pairs are sorted by path; when a path repeats, the first occurrence wins.
pub fn fingerprint_entries<I>(entries: I) -> ContentFingerprint
where
  I: IntoIterator<Item = (String, Vec<u8>)>,
{
  let mut ordered: BTreeMap<String, Vec<u8>> = BTreeMap::new();
  for (path, content) in entries {
    ordered.entry(path).or_insert(content);
  }

  let mut hasher = Sha256::new();
  for (path, content) in &ordered {
    hasher.update(path.as_bytes());
    hasher.update(content);
  }
  ContentFingerprint(hex::encode(hasher.finalize()))
}
