//! Driven port for the authentication and account endpoints.
//!
//! The session manager drives these calls and owns every state change that
//! follows from them; implementations only translate to and from the wire.

use async_trait::async_trait;

use crate::domain::{
    AuthGrant, EmailAddress, EmailVerification, Error, LoginCredentials, PasswordChange,
    PasswordReset, ProfileUpdate, RefreshToken, Registration, User,
};

/// Port for the `/auth/*` endpoint family.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for tokens and the signed-in user.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthGrant, Error>;

    /// Create a customer account. The account stays unverified until
    /// [`AuthApi::verify_email`] succeeds.
    async fn register(&self, registration: &Registration) -> Result<(), Error>;

    /// Confirm the emailed one-time code. A verified account is signed in.
    async fn verify_email(&self, verification: &EmailVerification) -> Result<AuthGrant, Error>;

    /// Ask the backend to send a fresh verification code.
    async fn resend_otp(&self, email: &EmailAddress) -> Result<(), Error>;

    /// Start the password reset flow.
    async fn forgot_password(&self, email: &EmailAddress) -> Result<(), Error>;

    /// Complete the password reset flow with the mailed token.
    async fn reset_password(&self, reset: &PasswordReset) -> Result<(), Error>;

    /// Change the password of the signed-in user.
    async fn change_password(&self, change: &PasswordChange) -> Result<(), Error>;

    /// Fetch the signed-in user's profile.
    async fn fetch_profile(&self) -> Result<User, Error>;

    /// Apply a partial profile update and return the stored user.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, Error>;

    /// Revoke the session on the backend.
    async fn logout(&self, refresh_token: Option<RefreshToken>) -> Result<(), Error>;
}
