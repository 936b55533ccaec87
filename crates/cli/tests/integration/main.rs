//! End-to-end tests for the ship binary against a directory-backed store.

mod common;

mod check_tests;
mod hash_tests;
mod publish_tests;
mod status_tests;
