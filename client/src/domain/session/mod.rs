//! Session lifecycle: the observable session snapshot, the single writer of
//! the token store, and the page-facing session manager.
//!
//! ```text
//! Bootstrapping ──▶ Authenticated ◀──▶ Authenticated.Loading
//!        │                │
//!        └──────▶ Unauthenticated ◀── logout / refresh failure
//! ```

mod manager;
mod writer;

pub use self::manager::SessionManager;
pub use self::writer::{ROLE_CHANGED_MESSAGE, SESSION_EXPIRED_MESSAGE, SessionCore};

use crate::domain::{Role, User};

/// Read-only session snapshot published to guards and pages.
///
/// ## Invariants
/// - `is_authenticated()` is derived from the cached user; the two can never
///   disagree.
/// - `is_loading` means "undecided": consumers must not treat it as signed
///   out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
    is_loading: bool,
}

impl Session {
    /// Initial state before bootstrap has run.
    pub fn bootstrapping() -> Self {
        Self {
            user: None,
            is_loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            is_loading: false,
        }
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            is_loading: false,
        }
    }

    #[must_use]
    pub fn with_loading(mut self, is_loading: bool) -> Self {
        self.is_loading = is_loading;
        self
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(User::role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}
