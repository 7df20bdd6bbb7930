// OAuth token storage.
// Holds the single bearer token in a secret store, failing safe to logged-out on store errors.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use super::secrets::SecretStore;

/// Secret store account holding the token.
pub const TOKEN_ACCOUNT: &str = "github";
/// Key of the token within the account's secrets.
pub const TOKEN_KEY: &str = "token";

/// The process's OAuth token.
///
/// Reads and writes are serialized, so a concurrent `get` sees the value from
/// either before or after a `set`/`clear`, never a mix.
pub struct TokenStore {
    store: Mutex<Box<dyn SecretStore>>,
}

impl TokenStore {
    pub fn new(store: impl SecretStore + 'static) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
        }
    }

    /// The current token. Empty strings and unreadable stores count as no token.
    pub fn get(&self) -> Option<String> {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        match store.load(TOKEN_ACCOUNT) {
            Ok(secrets) => secrets
                .and_then(|mut secrets| secrets.remove(TOKEN_KEY))
                .filter(|token| !token.is_empty()),
            Err(e) => {
                warn!(error = %e, "could not read token; treating as logged out");
                None
            }
        }
    }

    /// Replace the token. `None` or an empty string clears it.
    pub fn set(&self, token: Option<&str>) {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            self.clear();
            return;
        };

        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let secrets = HashMap::from([(TOKEN_KEY.to_string(), token.to_string())]);
        match store.update(TOKEN_ACCOUNT, secrets) {
            Ok(()) => debug!("stored OAuth token"),
            Err(e) => {
                warn!(error = %e, "could not store token; clearing it");
                if let Err(e) = store.delete(TOKEN_ACCOUNT) {
                    warn!(error = %e, "could not clear token");
                }
            }
        }
    }

    /// Remove the token from the secret store.
    pub fn clear(&self) {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        match store.delete(TOKEN_ACCOUNT) {
            Ok(()) => debug!("cleared OAuth token"),
            Err(e) => warn!(error = %e, "could not clear token"),
        }
    }

    pub fn has_token(&self) -> bool {
        self.get().is_some()
    }
}
