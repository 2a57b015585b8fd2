//! Page-facing session service.
//!
//! [`SessionManager`] is constructed once at start-up and shared by
//! reference. It validates form input, drives the [`AuthApi`] port, and
//! routes every resulting state change through [`SessionCore`].

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::{Session, SessionCore};
use crate::domain::ports::AuthApi;
use crate::domain::{
    EmailAddress, EmailVerification, Error, LoginCredentials, PasswordChange, PasswordReset,
    ProfileUpdate, Registration, RegistrationForm, User,
};

/// Orchestrates sign-in, sign-out, bootstrap, and account flows.
#[derive(Clone)]
pub struct SessionManager {
    core: Arc<SessionCore>,
    api: Arc<dyn AuthApi>,
}

impl SessionManager {
    pub fn new(core: Arc<SessionCore>, api: Arc<dyn AuthApi>) -> Self {
        Self { core, api }
    }

    /// Current read-only session snapshot.
    pub fn session(&self) -> Session {
        self.core.snapshot()
    }

    /// Receive a snapshot after every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.core.subscribe()
    }

    /// Restore the session on start-up.
    ///
    /// With stored tokens the profile is fetched again rather than trusted
    /// from the cache; any failure clears storage. Without tokens the session
    /// goes straight to signed-out.
    pub async fn bootstrap(&self) -> Session {
        {
            let _bootstrap = self.core.bootstrap_guard();
            self.restore().await;
        }
        self.core.snapshot()
    }

    async fn restore(&self) {
        if self.core.stored_tokens().is_none() {
            self.core.clear();
            return;
        }
        let epoch = self.core.epoch();
        match self.api.fetch_profile().await {
            Ok(user) => {
                if let Err(error) = self.core.replace_user(epoch, user) {
                    warn!(%error, "failed to cache restored profile");
                    self.core.clear();
                }
            }
            Err(error) => {
                warn!(code = ?error.code(), "session restore failed; signing out");
                self.core.clear();
            }
        }
    }

    /// Sign in with an email and password.
    ///
    /// A rejected password is terminal for this attempt; the error is
    /// returned for the form to render and nothing is retried.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, Error> {
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        let _loading = self.core.begin_loading();
        let grant = self.api.login(&credentials).await?;
        let user = grant.user.clone();
        self.core.establish(grant)?;
        Ok(user)
    }

    /// Sign out. Always succeeds locally.
    ///
    /// The backend is told first so the request can still carry the bearer;
    /// its failure is logged and otherwise ignored.
    pub async fn logout(&self) {
        let refresh_token = self
            .core
            .stored_tokens()
            .map(|tokens| tokens.refresh().clone());
        if let Err(error) = self.api.logout(refresh_token).await {
            warn!(code = ?error.code(), "logout notification failed");
        }
        self.core.clear();
        info!("signed out");
    }

    /// Create a customer account awaiting email verification.
    pub async fn register(&self, form: RegistrationForm<'_>) -> Result<(), Error> {
        let registration = Registration::try_from_form(form)?;
        self.api.register(&registration).await
    }

    /// Confirm the emailed code; a verified account is signed in.
    pub async fn verify_email(&self, email: &str, otp: &str) -> Result<User, Error> {
        let verification = EmailVerification::try_from_parts(email, otp)?;
        let _loading = self.core.begin_loading();
        let grant = self.api.verify_email(&verification).await?;
        let user = grant.user.clone();
        self.core.establish(grant)?;
        Ok(user)
    }

    pub async fn resend_otp(&self, email: &str) -> Result<(), Error> {
        let email = EmailAddress::parse(email)?;
        self.api.resend_otp(&email).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), Error> {
        let email = EmailAddress::parse(email)?;
        self.api.forgot_password(&email).await
    }

    /// Complete a password reset. The current session is left untouched.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), Error> {
        let reset = PasswordReset::try_from_parts(token, new_password)?;
        self.api.reset_password(&reset).await
    }

    pub async fn change_password(&self, current: &str, new_password: &str) -> Result<(), Error> {
        let change = PasswordChange::try_from_parts(current, new_password)?;
        self.api.change_password(&change).await
    }

    /// Apply a profile update and overwrite the cached user. Tokens are not
    /// touched.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User, Error> {
        update.validate()?;
        let epoch = self.core.epoch();
        let user = self.api.update_profile(&update).await?;
        self.cache_profile(epoch, user)
    }

    /// Re-fetch the profile and overwrite the cached user.
    pub async fn refresh_profile(&self) -> Result<User, Error> {
        let epoch = self.core.epoch();
        let user = self.api.fetch_profile().await?;
        self.cache_profile(epoch, user)
    }

    /// Fails when the session from `epoch` ended while the profile call was
    /// in flight, so callers never act on a user that is no longer signed in.
    fn cache_profile(&self, epoch: u64, user: User) -> Result<User, Error> {
        if self.core.replace_user(epoch, user.clone())? {
            Ok(user)
        } else {
            Err(Error::unauthorized("signed out before the profile was saved"))
        }
    }
}
