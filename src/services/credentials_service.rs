//! Git credentials service
//!
//! Builds git2 remote callbacks around a bearer token and stores that token
//! in the OS keychain through the `keyring` crate.

use git2::{Cred, CredentialType, RemoteCallbacks};
use keyring::Entry;
use std::sync::Mutex;

use crate::error::{GitPocketError, Result};

/// Service name for keychain storage
const SERVICE_NAME: &str = "gitpocket";

/// Account under which the access token is stored
const TOKEN_ACCOUNT: &str = "access_token";

/// Credentials helper that provides git2 remote callbacks with token authentication
#[derive(Debug, Clone, Default)]
pub struct CredentialsHelper {
    /// Token for HTTPS authentication; `None` means anonymous access
    token: Option<String>,
}

impl CredentialsHelper {
    /// Create a helper for a token; an empty token means anonymous access
    pub fn for_token(token: &str) -> Self {
        let token = token.trim();
        Self {
            token: if token.is_empty() {
                None
            } else {
                Some(token.to_string())
            },
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }

    /// Get remote callbacks configured with credential support
    pub fn get_callbacks(&self) -> RemoteCallbacks<'static> {
        let token = self.token.clone();
        let mut tried_token = false;
        let mut tried_default = false;

        let mut callbacks = RemoteCallbacks::new();

        callbacks.credentials(move |url, username_from_url, allowed_types| {
            tracing::debug!(
                "Credential callback: url={}, username={:?}, allowed={:?}",
                url,
                username_from_url,
                allowed_types
            );

            if let Some(ref token_value) = token {
                if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) && !tried_token {
                    tried_token = true;
                    tracing::debug!("Using provided token for authentication");
                    let username = username_from_url.unwrap_or("git");
                    return Cred::userpass_plaintext(username, token_value);
                }
            }

            // Public repos or pre-configured git credentials
            if allowed_types.contains(CredentialType::DEFAULT) && !tried_default {
                tried_default = true;
                tracing::debug!("Trying default credentials");
                return Cred::default();
            }

            let message = if tried_token {
                "The remote rejected the access token."
            } else {
                "Authentication required. Provide an access token for this remote."
            };
            Err(git2::Error::new(
                git2::ErrorCode::Auth,
                git2::ErrorClass::Http,
                message,
            ))
        });

        callbacks
    }
}

/// Source of the bearer token used for fetch/push/pull
pub trait TokenStore: Send + Sync {
    /// The stored token, or an empty string when none is stored
    fn token(&self) -> Result<String>;

    fn set_token(&self, token: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// Token store backed by the OS keychain
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service: String,
    account: String,
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME, TOKEN_ACCOUNT)
    }
}

impl KeyringTokenStore {
    pub fn new(service: &str, account: &str) -> Self {
        Self {
            service: service.to_string(),
            account: account.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Ok(Entry::new(&self.service, &self.account)?)
    }
}

impl TokenStore for KeyringTokenStore {
    fn token(&self) -> Result<String> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(token),
            Err(keyring::Error::NoEntry) => Ok(String::new()),
            Err(e) => Err(GitPocketError::CredentialStore(e)),
        }
    }

    fn set_token(&self, token: &str) -> Result<()> {
        self.entry()?.set_password(token)?;
        tracing::debug!("Stored access token (len: {})", token.len());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(GitPocketError::CredentialStore(e)),
        }
    }
}

/// In-process token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<String>,
}

impl MemoryTokenStore {
    pub fn new(token: &str) -> Self {
        Self {
            token: Mutex::new(token.to_string()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Result<String> {
        self.token
            .lock()
            .map(|t| t.clone())
            .map_err(|_| GitPocketError::OperationFailed("Lock poisoned".to_string()))
    }

    fn set_token(&self, token: &str) -> Result<()> {
        let mut current = self
            .token
            .lock()
            .map_err(|_| GitPocketError::OperationFailed("Lock poisoned".to_string()))?;
        *current = token.to_string();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.set_token("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_anonymous() {
        assert!(CredentialsHelper::for_token("").is_anonymous());
        assert!(CredentialsHelper::for_token("   ").is_anonymous());
        assert!(!CredentialsHelper::for_token("ghp_abc").is_anonymous());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::default();
        assert_eq!(store.token().unwrap(), "");

        store.set_token("ghp_secret").unwrap();
        assert_eq!(store.token().unwrap(), "ghp_secret");

        store.clear().unwrap();
        assert_eq!(store.token().unwrap(), "");
    }
}
