//! Single writer of the token store.
//!
//! Every mutation of stored tokens or the cached user goes through
//! [`SessionCore`]: the session manager for login, logout, and profile
//! changes, and the gateway for token refresh. Writes happen under one lock
//! together with the session epoch, which is bumped whenever the session is
//! replaced or ended so that late refresh results are discarded.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared, WeakShared};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::Session;
use crate::domain::notifications::NotificationCenter;
use crate::domain::ports::{TokenRefresher, TokenStore, TokenStoreError};
use crate::domain::{AccessToken, AuthGrant, Error, TokenPair, User};

/// Warning shown when a refresh failure ends a signed-in session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Error returned when the backend reports a different role for the
/// signed-in user.
pub const ROLE_CHANGED_MESSAGE: &str = "Your account role has changed. Please sign in again.";

type RefreshFuture = BoxFuture<'static, Result<AccessToken, Error>>;

#[derive(Default)]
struct RefreshSlot {
    epoch: u64,
    inflight: Option<WeakShared<RefreshFuture>>,
}

enum RefreshPlan {
    Current(AccessToken),
    Await(Shared<RefreshFuture>),
    Expire(u64),
}

/// Owner of the token store and the observable [`Session`].
pub struct SessionCore {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    notifications: Option<Arc<NotificationCenter>>,
    snapshot: watch::Sender<Session>,
    slot: Mutex<RefreshSlot>,
    bootstrapped: AtomicBool,
    loading: AtomicUsize,
}

/// Keeps the session in its loading sub-state until dropped.
///
/// Dropping the guard on cancellation restores the previous loading state,
/// so an abandoned login never leaves guards stuck on a placeholder.
pub(crate) struct LoadingGuard<'a> {
    core: &'a SessionCore,
    bootstrap: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.bootstrap {
            self.core.bootstrapped.store(true, Ordering::SeqCst);
        } else {
            self.core.loading.fetch_sub(1, Ordering::SeqCst);
        }
        self.core.publish_loading();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn storage_error(error: TokenStoreError) -> Error {
    Error::internal(error.to_string())
}

impl SessionCore {
    /// Create a core in the bootstrapping state.
    pub fn new(store: Arc<dyn TokenStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        let (snapshot, _) = watch::channel(Session::bootstrapping());
        Self {
            store,
            refresher,
            notifications: None,
            snapshot,
            slot: Mutex::new(RefreshSlot::default()),
            bootstrapped: AtomicBool::new(false),
            loading: AtomicUsize::new(0),
        }
    }

    /// Post session-expiry warnings to `center`.
    #[must_use]
    pub fn with_notifications(mut self, center: Arc<NotificationCenter>) -> Self {
        self.notifications = Some(center);
        self
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> Session {
        self.snapshot.borrow().clone()
    }

    /// Receive every subsequent session snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.snapshot.subscribe()
    }

    /// Access token to attach to outgoing requests, if signed in.
    pub fn access_token(&self) -> Option<AccessToken> {
        self.stored_tokens().map(|tokens| tokens.access().clone())
    }

    pub(crate) fn stored_tokens(&self) -> Option<TokenPair> {
        match self.store.load() {
            Ok(tokens) => tokens,
            Err(error) => {
                warn!(%error, "session storage unreadable; treating as signed out");
                None
            }
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        lock(&self.slot).epoch
    }

    pub(crate) fn begin_loading(&self) -> LoadingGuard<'_> {
        self.loading.fetch_add(1, Ordering::SeqCst);
        self.publish_loading();
        LoadingGuard {
            core: self,
            bootstrap: false,
        }
    }

    /// Guard that ends the bootstrap phase when dropped.
    pub(crate) fn bootstrap_guard(&self) -> LoadingGuard<'_> {
        LoadingGuard {
            core: self,
            bootstrap: true,
        }
    }

    /// Store a fresh grant and publish the signed-in user.
    ///
    /// Any refresh still in flight belongs to the replaced session and is
    /// discarded.
    pub(crate) fn establish(&self, grant: AuthGrant) -> Result<(), Error> {
        let AuthGrant { tokens, user } = grant;
        let mut slot = lock(&self.slot);
        slot.epoch += 1;
        slot.inflight = None;
        let stored = self
            .store
            .save(&tokens)
            .and_then(|()| self.store.save_user(&user));
        if let Err(error) = stored {
            self.wipe_store();
            self.publish(None);
            return Err(storage_error(error));
        }
        info!(user_id = %user.id(), role = %user.role(), "session established");
        self.publish(Some(user));
        Ok(())
    }

    /// Overwrite the cached user if the session from `epoch` is still live.
    ///
    /// Returns `false` when the session ended or was replaced meanwhile; the
    /// user is then dropped rather than resurrecting a signed-out session.
    ///
    /// A role can only be assigned by signing in. A profile whose role
    /// differs from the signed-in user's ends the session instead of being
    /// cached; before the first user is published any role is accepted.
    pub(crate) fn replace_user(&self, epoch: u64, user: User) -> Result<bool, Error> {
        let slot = lock(&self.slot);
        if slot.epoch != epoch || self.stored_tokens().is_none() {
            debug!("discarding profile for a session that has ended");
            return Ok(false);
        }
        let current = self.snapshot.borrow().role();
        if current.is_some_and(|role| role != user.role()) {
            warn!(from = ?current, to = %user.role(), "role changed mid-session; signing out");
            drop(slot);
            self.expire(epoch);
            return Err(Error::unauthorized(ROLE_CHANGED_MESSAGE));
        }
        self.store.save_user(&user).map_err(storage_error)?;
        self.publish(Some(user));
        Ok(true)
    }

    /// End the session locally: wipe storage and publish signed-out.
    pub(crate) fn clear(&self) {
        let mut slot = lock(&self.slot);
        slot.epoch += 1;
        slot.inflight = None;
        self.wipe_store();
        self.publish(None);
    }

    /// Obtain a usable access token after `rejected` drew a 401.
    ///
    /// If the stored token already differs from `rejected`, another caller
    /// has refreshed in the meantime and the stored token is returned without
    /// a network call. Otherwise all concurrent callers share one refresh
    /// attempt. Any refresh failure ends the session.
    pub async fn refresh_access_token(
        self: &Arc<Self>,
        rejected: Option<&AccessToken>,
    ) -> Result<AccessToken, Error> {
        match self.plan_refresh(rejected) {
            RefreshPlan::Current(token) => Ok(token),
            RefreshPlan::Await(attempt) => attempt.await,
            RefreshPlan::Expire(epoch) => {
                self.expire(epoch);
                Err(Error::unauthorized("no refresh token available"))
            }
        }
    }

    fn plan_refresh(self: &Arc<Self>, rejected: Option<&AccessToken>) -> RefreshPlan {
        let mut slot = lock(&self.slot);
        let Some(tokens) = self.stored_tokens() else {
            return RefreshPlan::Expire(slot.epoch);
        };
        if rejected != Some(tokens.access()) {
            debug!("access token already replaced; replaying with current token");
            return RefreshPlan::Current(tokens.access().clone());
        }
        if let Some(attempt) = slot.inflight.as_ref().and_then(WeakShared::upgrade) {
            debug!("joining in-flight token refresh");
            return RefreshPlan::Await(attempt);
        }
        let attempt = Arc::clone(self)
            .run_refresh(slot.epoch, tokens)
            .boxed()
            .shared();
        slot.inflight = attempt.downgrade();
        RefreshPlan::Await(attempt)
    }

    async fn run_refresh(
        self: Arc<Self>,
        epoch: u64,
        tokens: TokenPair,
    ) -> Result<AccessToken, Error> {
        let outcome = {
            let _loading = self.begin_loading();
            debug!("refreshing access token");
            self.refresher.refresh(tokens.refresh()).await
        };
        let mut slot = lock(&self.slot);
        if slot.epoch != epoch {
            debug!("discarding token refresh that finished after the session ended");
            return Err(Error::unauthorized(SESSION_EXPIRED_MESSAGE));
        }
        slot.inflight = None;
        let failure = match outcome {
            Ok(grant) => {
                let rotated = tokens.rotate(grant);
                match self.store.save(&rotated) {
                    Ok(()) => {
                        info!("access token refreshed");
                        return Ok(rotated.access().clone());
                    }
                    Err(error) => storage_error(error),
                }
            }
            Err(error) => error,
        };
        drop(slot);
        warn!(code = ?failure.code(), "token refresh failed; ending session");
        self.expire(epoch);
        Err(failure)
    }

    /// Forced logout after a failed refresh.
    fn expire(&self, epoch: u64) {
        let was_signed_in = {
            let mut slot = lock(&self.slot);
            if slot.epoch != epoch {
                return;
            }
            slot.epoch += 1;
            slot.inflight = None;
            self.wipe_store();
            let was_signed_in = self.snapshot.borrow().is_authenticated();
            self.publish(None);
            was_signed_in
        };
        if was_signed_in {
            info!("session expired");
            if let Some(center) = &self.notifications {
                center.warning(SESSION_EXPIRED_MESSAGE);
            }
        }
    }

    fn wipe_store(&self) {
        if let Err(error) = self.store.clear() {
            warn!(%error, "failed to clear session storage");
        }
    }

    fn is_loading(&self) -> bool {
        !self.bootstrapped.load(Ordering::SeqCst) || self.loading.load(Ordering::SeqCst) > 0
    }

    fn publish(&self, user: Option<User>) {
        let is_loading = self.is_loading();
        self.snapshot.send_replace(Session { user, is_loading });
    }

    fn publish_loading(&self) {
        let is_loading = self.is_loading();
        self.snapshot.send_if_modified(|session| {
            let changed = session.is_loading != is_loading;
            session.is_loading = is_loading;
            changed
        });
    }
}
