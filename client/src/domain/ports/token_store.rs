//! Driven port for persisting the session's tokens and cached user.
//!
//! Storage is scoped to one browsing context (one tab, one process). The
//! session core is the only writer; everything else reads through it.

use super::define_port_error;
use crate::domain::{TokenPair, User};

/// Well-known key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Well-known key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Well-known key holding the JSON-encoded cached user.
pub const USER_KEY: &str = "user";

define_port_error! {
    /// Errors raised when reading or writing session storage.
    pub enum TokenStoreError {
        /// Stored user JSON could not be encoded or decoded.
        Serialization { message: String } =>
            "session storage payload is invalid: {message}",
        /// The storage backend refused the operation.
        Unavailable { message: String } =>
            "session storage is unavailable: {message}",
    }
}

/// Port for session-scoped credential storage.
///
/// `clear` removes tokens and the cached user together; implementations must
/// never leave one half of the session behind.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync {
    /// Persist both tokens.
    fn save(&self, tokens: &TokenPair) -> Result<(), TokenStoreError>;

    /// Load both tokens. Returns `None` unless both are present.
    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError>;

    /// Persist the cached user.
    fn save_user(&self, user: &User) -> Result<(), TokenStoreError>;

    /// Load the cached user, if any.
    fn load_user(&self) -> Result<Option<User>, TokenStoreError>;

    /// Remove tokens and the cached user.
    fn clear(&self) -> Result<(), TokenStoreError>;
}
