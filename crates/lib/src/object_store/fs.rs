//! Directory-backed object store.
//!
//! Treats a local directory (or a mounted bucket) as the object store. Keys
//! map to relative paths; `/` in a key is a directory separator.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::WalkDir;

use super::{ObjectInfo, ObjectStore, ObjectStoreError};

/// Temp files written by [`FsObjectStore::put`] before the final rename.
const TEMP_PREFIX: &str = ".shipshape-tmp";

#[derive(Debug, Clone)]
pub struct FsObjectStore {
  root: PathBuf,
}

impl FsObjectStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
    if !is_valid_key(key) {
      return Err(ObjectStoreError::InvalidKey { key: key.to_string() });
    }
    Ok(self.root.join(key))
  }

  /// Converts an on-disk path back into its object key.
  fn key_for(&self, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(&self.root).ok()?;
    let parts: Vec<&str> = rel
      .components()
      .map(|c| match c {
        Component::Normal(s) => s.to_str(),
        _ => None,
      })
      .collect::<Option<_>>()?;
    Some(parts.join("/"))
  }
}

/// Keys are relative, `/`-separated, with no empty, `.` or `..` segments.
fn is_valid_key(key: &str) -> bool {
  !key.is_empty()
    && !key.contains('\\')
    && key
      .split('/')
      .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

impl ObjectStore for FsObjectStore {
  fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
    let path = self.object_path(key)?;
    Ok(path.is_file())
  }

  fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
    let path = self.object_path(key)?;
    fs::read(&path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        ObjectStoreError::NotFound { key: key.to_string() }
      } else {
        ObjectStoreError::transfer(key, e)
      }
    })
  }

  /// Writes via a temp file in the target directory, then renames into place.
  fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ObjectStoreError> {
    let path = self.object_path(key)?;
    let parent = path.parent().unwrap_or(&self.root);
    fs::create_dir_all(parent).map_err(|e| ObjectStoreError::transfer(key, e))?;

    let mut temp = tempfile::Builder::new()
      .prefix(TEMP_PREFIX)
      .tempfile_in(parent)
      .map_err(|e| ObjectStoreError::transfer(key, e))?;
    temp.write_all(bytes).map_err(|e| ObjectStoreError::transfer(key, e))?;
    temp
      .persist(&path)
      .map_err(|e| ObjectStoreError::transfer(key, e.error))?;

    debug!(key = %key, size = bytes.len(), "stored object");
    Ok(())
  }

  fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, ObjectStoreError> {
    // Only walk the deepest directory the prefix fully names.
    let start = match prefix.rfind('/') {
      Some(idx) => self.root.join(&prefix[..idx]),
      None => self.root.clone(),
    };
    if !start.is_dir() {
      return Ok(Vec::new());
    }

    let mut objects = Vec::new();
    for entry in WalkDir::new(&start).sort_by_file_name() {
      let entry = entry.map_err(|e| ObjectStoreError::transfer(prefix, io::Error::other(e)))?;
      if !entry.file_type().is_file() {
        continue;
      }
      if entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
        continue;
      }
      let Some(key) = self.key_for(entry.path()) else {
        continue;
      };
      if !key.starts_with(prefix) {
        continue;
      }
      let meta = entry
        .metadata()
        .map_err(|e| ObjectStoreError::transfer(&key, io::Error::other(e)))?;
      let last_modified = meta
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));
      objects.push(ObjectInfo {
        key,
        size: meta.len(),
        last_modified,
      });
    }

    objects.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(objects)
  }
}
