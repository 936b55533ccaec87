//! Per-version release records.
//!
//! Every published version gets exactly one immutable `metadata.json`
//! describing where each platform's binary lives and whether it was built
//! fresh or reused from an earlier release.

mod store;
mod types;

pub use store::{MetadataError, MetadataStore};
pub use types::{BinaryRef, ReleaseMetadata};
