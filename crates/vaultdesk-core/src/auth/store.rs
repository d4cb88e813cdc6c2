use anyhow::Result;
use tracing::debug;

use crate::config::{Config, TokenStorage};
use crate::models::SessionToken;

use super::keychain::NATIVE_KEYCHAIN;
use super::{FileTokenStore, KeychainTokenStore};

/// A single persisted slot holding the current session token.
///
/// Calls are synchronous: a `get` issued after a completed `set`/`delete`
/// observes that write.
pub trait TokenStore {
    fn get(&self) -> Result<Option<SessionToken>>;

    fn set(&mut self, token: &SessionToken) -> Result<()>;

    /// Removing an empty slot succeeds.
    fn delete(&mut self) -> Result<()>;
}

impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    fn get(&self) -> Result<Option<SessionToken>> {
        (**self).get()
    }

    fn set(&mut self, token: &SessionToken) -> Result<()> {
        (**self).set(token)
    }

    fn delete(&mut self) -> Result<()> {
        (**self).delete()
    }
}

/// Open the store selected by `config.token_storage`.
///
/// Keyring storage is refused when no OS keychain backend is compiled in,
/// since writes would be lost at exit.
pub fn open_store(config: &Config) -> Result<Box<dyn TokenStore>> {
    debug!(storage = %config.token_storage, "Opening token store");
    let store: Box<dyn TokenStore> = match config.token_storage {
        TokenStorage::File => Box::new(FileTokenStore::new(config.cache_dir()?)),
        TokenStorage::Keyring => {
            if !NATIVE_KEYCHAIN {
                anyhow::bail!(
                    "keyring token storage is unavailable in this build (enable the native-keyring feature or use file storage)"
                );
            }
            Box::new(KeychainTokenStore::new()?)
        }
        TokenStorage::Memory => Box::new(MemoryTokenStore::default()),
    };
    Ok(store)
}

/// Token slot that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Option<SessionToken>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryTokenStore {
    /// Store pre-populated with `token`, as if left over from a previous run
    pub fn with_token(token: SessionToken) -> Self {
        Self {
            token: Some(token),
            ..Self::default()
        }
    }

    /// Make every subsequent `set`/`delete` fail without touching the slot
    pub fn fail_writes(mut self, fail: bool) -> Self {
        self.fail_writes = fail;
        self
    }

    /// Number of `set`/`delete` calls attempted so far
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn peek(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<SessionToken>> {
        Ok(self.token.clone())
    }

    fn set(&mut self, token: &SessionToken) -> Result<()> {
        self.writes += 1;
        if self.fail_writes {
            anyhow::bail!("memory token store is read-only");
        }
        self.token = Some(token.clone());
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        self.writes += 1;
        if self.fail_writes {
            anyhow::bail!("memory token store is read-only");
        }
        self.token = None;
        Ok(())
    }
}
