//! Driven port for exchanging a refresh token for a new access token.
//!
//! Kept apart from [`super::AuthApi`] because refresh traffic must bypass the
//! gateway's own 401 handling; a refresh call that itself triggered a refresh
//! would never terminate.

use async_trait::async_trait;

use crate::domain::{Error, RefreshGrant, RefreshToken};

/// Port for the `/auth/refresh` exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange `refresh_token` for a new access token and, when the backend
    /// rotates it, a new refresh token.
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshGrant, Error>;
}
