//! Shared helpers for portal client integration tests.

pub mod stub_backend;
