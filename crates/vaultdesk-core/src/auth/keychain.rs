use anyhow::{Context, Result};
use keyring::Entry;

use crate::config::APP_NAME;
use crate::models::SessionToken;

use super::TokenStore;

/// Keychain account the token is stored under
const ACCOUNT_NAME: &str = "session-token";

/// An OS keychain backend is compiled in.
///
/// Without one keyring falls back to an in-process mock, which forgets the
/// token when the process exits.
pub const NATIVE_KEYCHAIN: bool = cfg!(feature = "native-keyring");

/// Token store backed by the OS keychain.
pub struct KeychainTokenStore {
    entry: Entry,
}

impl KeychainTokenStore {
    pub fn new() -> Result<Self> {
        let entry = Entry::new(APP_NAME, ACCOUNT_NAME).context("Failed to create keyring entry")?;
        Ok(Self::with_entry(entry))
    }

    /// Use a specific keyring entry, e.g. one built on a custom credential
    pub fn with_entry(entry: Entry) -> Self {
        Self { entry }
    }
}

impl TokenStore for KeychainTokenStore {
    fn get(&self) -> Result<Option<SessionToken>> {
        match self.entry.get_password() {
            Ok(raw) => Ok(SessionToken::new(raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set(&mut self, token: &SessionToken) -> Result<()> {
        self.entry
            .set_password(token.as_str())
            .context("Failed to store token in keychain")
    }

    fn delete(&mut self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
