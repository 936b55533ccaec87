//! Release version ordering.
//!
//! Release folders are named with loose semantic versions (`0.4.10`,
//! `0.5.0a`). Ordering compares dot-separated components numerically after
//! dropping non-digit characters, so a letter suffix never outranks the next
//! numeric release. Missing components count as zero.

use std::cmp::Ordering;

/// Numeric part of one version component, without leading zeros.
fn numeric_component(part: &str) -> String {
  let digits: String = part.chars().filter(|c| c.is_ascii_digit()).collect();
  digits.trim_start_matches('0').to_string()
}

/// Compares two numeric strings of arbitrary length.
fn cmp_numeric(a: &str, b: &str) -> Ordering {
  a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compares two versions component-wise as integers.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
  let a_parts: Vec<String> = a.split('.').map(numeric_component).collect();
  let b_parts: Vec<String> = b.split('.').map(numeric_component).collect();

  let len = a_parts.len().max(b_parts.len());
  for i in 0..len {
    let x = a_parts.get(i).map(String::as_str).unwrap_or("");
    let y = b_parts.get(i).map(String::as_str).unwrap_or("");
    match cmp_numeric(x, y) {
      Ordering::Equal => continue,
      other => return other,
    }
  }
  Ordering::Equal
}

/// Sorts newest first. Versions that compare equal fall back to plain string
/// order so the result does not depend on input order.
pub fn sort_descending(versions: &mut [String]) {
  versions.sort_by(|a, b| compare_versions(b, a).then_with(|| b.cmp(a)));
}

/// Whether `s` names a release folder: `<n>.<n>.<n>` plus an optional
/// lowercase letter.
pub fn is_release_version(s: &str) -> bool {
  let core = match s.as_bytes().last() {
    Some(c) if c.is_ascii_lowercase() => &s[..s.len() - 1],
    _ => s,
  };
  let parts: Vec<&str> = core.split('.').collect();
  parts.len() == 3
    && parts
      .iter()
      .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}
