//! shipshape-lib: Release publishing with binary reuse
//!
//! This crate provides the pieces of a release pipeline that skips
//! rebuilding binaries when nothing build-relevant changed:
//! - `ContentFingerprint`: digest over the files that influence a build
//! - `ReleaseMetadata`: per-version record of where each binary lives
//! - `GlobalBinaryMapping`: bucket-wide map of platform to source version
//! - `Resolver`: decides build-or-reuse and settles authoritative sources
//! - `Publisher`: runs the whole release against an object store

pub mod artifacts;
pub mod config;
pub mod consts;
pub mod fingerprint;
pub mod mapping;
pub mod object_store;
pub mod platform;
pub mod publish;
pub mod release;
pub mod resolve;
pub mod version;
