//! Test utilities for the portal client crate.
//!
//! Shared doubles for unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for tests and behind the `test-support` feature.

pub mod clock;
pub mod session;
pub mod transport;

pub use clock::MutableClock;
pub use session::{
    RecordingTokenStore, ScriptedRefresher, sample_user, token_pair, user_with_role,
};
pub use transport::ScriptedTransport;
