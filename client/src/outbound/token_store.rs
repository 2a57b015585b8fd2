//! Tab-scoped [`TokenStore`] backed by process memory.
//!
//! Values live under the well-known keys as strings, the cached user as
//! JSON, mirroring the browser's session storage. Nothing is written to disk,
//! so credentials die with the process.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;
use zeroize::Zeroizing;

use crate::domain::ports::{
    ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore, TokenStoreError, USER_KEY,
};
use crate::domain::{AccessToken, RefreshToken, TokenPair, User};

type Entries = HashMap<&'static str, Zeroizing<String>>;

/// Session storage for one browsing context.
#[derive(Default)]
pub struct TabTokenStore {
    entries: Mutex<Entries>,
}

impl TabTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for TabTokenStore {
    fn save(&self, tokens: &TokenPair) -> Result<(), TokenStoreError> {
        let mut entries = self.entries();
        entries.insert(
            ACCESS_TOKEN_KEY,
            Zeroizing::new(tokens.access().expose().to_owned()),
        );
        entries.insert(
            REFRESH_TOKEN_KEY,
            Zeroizing::new(tokens.refresh().expose().to_owned()),
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError> {
        let entries = self.entries();
        let access = entries
            .get(ACCESS_TOKEN_KEY)
            .and_then(|raw| AccessToken::new(raw.as_str()));
        let refresh = entries
            .get(REFRESH_TOKEN_KEY)
            .and_then(|raw| RefreshToken::new(raw.as_str()));
        match (access, refresh) {
            (Some(access), Some(refresh)) => Ok(Some(TokenPair::new(access, refresh))),
            (None, None) => Ok(None),
            _ => {
                warn!("session storage holds half a token pair; ignoring it");
                Ok(None)
            }
        }
    }

    fn save_user(&self, user: &User) -> Result<(), TokenStoreError> {
        let encoded = serde_json::to_string(user)
            .map_err(|error| TokenStoreError::serialization(error.to_string()))?;
        self.entries().insert(USER_KEY, Zeroizing::new(encoded));
        Ok(())
    }

    fn load_user(&self) -> Result<Option<User>, TokenStoreError> {
        let entries = self.entries();
        let Some(raw) = entries.get(USER_KEY) else {
            return Ok(None);
        };
        serde_json::from_str(raw.as_str())
            .map(Some)
            .map_err(|error| TokenStoreError::serialization(error.to_string()))
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut entries = self.entries();
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            entries.remove(key);
        }
        Ok(())
    }
}
