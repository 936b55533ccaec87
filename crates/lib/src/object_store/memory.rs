//! In-process object store.
//!
//! Used by tests and for dry runs. Records every key passed to `put` so
//! callers can assert exactly which uploads a run performed.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::{ObjectInfo, ObjectStore, ObjectStoreError};

#[derive(Debug, Clone)]
struct StoredObject {
  bytes: Vec<u8>,
  last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  objects: Mutex<BTreeMap<String, StoredObject>>,
  put_log: Mutex<Vec<String>>,
  failing_prefixes: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
  /// An empty store.
  pub fn new() -> Self {
    Self::default()
  }

  /// Seeds an object without recording it as an upload.
  pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
    lock(&self.objects).insert(
      key.into(),
      StoredObject {
        bytes: bytes.into(),
        last_modified: Utc::now(),
      },
    );
  }

  /// Deletes an object, returning whether it existed.
  pub fn remove(&self, key: &str) -> bool {
    lock(&self.objects).remove(key).is_some()
  }

  /// Every key written through [`ObjectStore::put`], in order.
  pub fn puts(&self) -> Vec<String> {
    lock(&self.put_log).clone()
  }

  /// Makes every subsequent `put` under `prefix` fail with a transfer error.
  pub fn fail_writes_under(&self, prefix: impl Into<String>) {
    lock(&self.failing_prefixes).push(prefix.into());
  }

  /// All stored keys, sorted.
  pub fn keys(&self) -> Vec<String> {
    lock(&self.objects).keys().cloned().collect()
  }
}

impl ObjectStore for MemoryStore {
  fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
    Ok(lock(&self.objects).contains_key(key))
  }

  fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
    lock(&self.objects)
      .get(key)
      .map(|o| o.bytes.clone())
      .ok_or_else(|| ObjectStoreError::NotFound { key: key.to_string() })
  }

  fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ObjectStoreError> {
    if lock(&self.failing_prefixes).iter().any(|p| key.starts_with(p.as_str())) {
      return Err(ObjectStoreError::transfer(key, io::Error::other("injected write failure")));
    }
    lock(&self.put_log).push(key.to_string());
    self.insert(key, bytes);
    Ok(())
  }

  fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, ObjectStoreError> {
    Ok(
      lock(&self.objects)
        .range(prefix.to_string()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, object)| ObjectInfo {
          key: key.clone(),
          size: object.bytes.len() as u64,
          last_modified: object.last_modified,
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_is_not_an_upload() {
    let store = MemoryStore::new();
    store.insert("a", "1");
    store.put("b", b"2").unwrap();

    assert_eq!(store.puts(), vec!["b".to_string()]);
    assert_eq!(store.get("a").unwrap(), b"1");
  }

  #[test]
  fn list_is_prefix_scoped() {
    let store = MemoryStore::new();
    store.insert("releases/v1.0.0/x", "1");
    store.insert("releases/v2.0.0/x", "22");
    store.insert("releasesX", "3");
    store.insert("install.sh", "4");

    let keys: Vec<String> = store.list("releases/").unwrap().into_iter().map(|o| o.key).collect();
    assert_eq!(keys, vec!["releases/v1.0.0/x", "releases/v2.0.0/x"]);
  }

  #[test]
  fn injected_failures_only_hit_matching_keys() {
    let store = MemoryStore::new();
    store.fail_writes_under("releases/");

    assert!(store.put("releases/v1.0.0/metadata.json", b"{}").is_err());
    assert!(store.put("install.sh", b"#!").is_ok());
    assert!(store.remove("install.sh"));
    assert!(!store.exists("install.sh").unwrap());
  }
}
