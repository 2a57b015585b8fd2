//! Session doubles: an inspectable token store, a scripted refresher, and
//! sample users.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::ports::{TokenRefresher, TokenStore, TokenStoreError};
use crate::domain::{
    AccessToken, Error, RefreshGrant, RefreshToken, Role, TokenPair, User, UserIdentity,
};

/// Build a user with the given id and role.
pub fn user_with_role(id: &str, role: Role) -> User {
    match User::try_new(UserIdentity {
        id,
        role,
        first_name: "Ada",
        last_name: "Lovelace",
        email: "a@b.com",
    }) {
        Ok(user) => user,
        Err(error) => panic!("fixture user must be valid: {error}"),
    }
}

/// The customer used by most scenarios.
pub fn sample_user() -> User {
    user_with_role("u-1", Role::Customer)
}

pub fn token_pair(access: &str, refresh: &str) -> TokenPair {
    match (AccessToken::new(access), RefreshToken::new(refresh)) {
        (Some(access), Some(refresh)) => TokenPair::new(access, refresh),
        _ => panic!("fixture tokens must not be blank"),
    }
}

#[derive(Default)]
struct StoreState {
    tokens: Option<TokenPair>,
    user: Option<User>,
    writes: usize,
    clears: usize,
    fail_writes: bool,
}

/// In-memory [`TokenStore`] that records how it was used.
#[derive(Default)]
pub struct RecordingTokenStore(Mutex<StoreState>);

impl RecordingTokenStore {
    pub fn seeded(tokens: TokenPair, user: Option<User>) -> Self {
        Self(Mutex::new(StoreState {
            tokens: Some(tokens),
            user,
            ..StoreState::default()
        }))
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        self.lock().tokens.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    /// Number of successful `save`/`save_user` calls.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn clears(&self) -> usize {
        self.lock().clears
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self) {
        self.lock().fail_writes = true;
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("token store mutex"),
        }
    }

    fn write(&self, apply: impl FnOnce(&mut StoreState)) -> Result<(), TokenStoreError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(TokenStoreError::unavailable("quota exceeded"));
        }
        apply(&mut state);
        state.writes += 1;
        Ok(())
    }
}

impl TokenStore for RecordingTokenStore {
    fn save(&self, tokens: &TokenPair) -> Result<(), TokenStoreError> {
        self.write(|state| state.tokens = Some(tokens.clone()))
    }

    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError> {
        Ok(self.tokens())
    }

    fn save_user(&self, user: &User) -> Result<(), TokenStoreError> {
        self.write(|state| state.user = Some(user.clone()))
    }

    fn load_user(&self) -> Result<Option<User>, TokenStoreError> {
        Ok(self.user())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut state = self.lock();
        state.tokens = None;
        state.user = None;
        state.clears += 1;
        Ok(())
    }
}

/// [`TokenRefresher`] returning a fixed outcome, optionally held until
/// [`ScriptedRefresher::release`] is called.
pub struct ScriptedRefresher {
    outcome: Result<RefreshGrant, Error>,
    gate: Option<Semaphore>,
    calls: AtomicUsize,
    presented: Mutex<Vec<String>>,
}

impl ScriptedRefresher {
    /// Refresh succeeds with `access` and, when given, a rotated `refresh`.
    pub fn succeeding(access: &str, refresh: Option<&str>) -> Self {
        let Some(access) = AccessToken::new(access) else {
            panic!("fixture access token must not be blank");
        };
        Self::with_outcome(Ok(RefreshGrant {
            access,
            refresh: refresh.and_then(RefreshToken::new),
        }))
    }

    pub fn failing(error: Error) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<RefreshGrant, Error>) -> Self {
        Self {
            outcome,
            gate: None,
            calls: AtomicUsize::new(0),
            presented: Mutex::new(Vec::new()),
        }
    }

    /// Block every refresh until [`ScriptedRefresher::release`].
    #[must_use]
    pub fn held(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens received, in call order.
    pub fn presented(&self) -> Vec<String> {
        match self.presented.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => panic!("refresher mutex"),
        }
    }
}

#[async_trait]
impl TokenRefresher for ScriptedRefresher {
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshGrant, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.presented.lock() {
            Ok(mut guard) => guard.push(refresh_token.expose().to_owned()),
            Err(_) => panic!("refresher mutex"),
        }
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }
        self.outcome.clone()
    }
}
