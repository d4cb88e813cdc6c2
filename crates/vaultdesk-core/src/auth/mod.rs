//! Session token persistence.
//!
//! This module provides:
//! - `TokenStore`: the single-slot get/set/delete contract
//! - `FileTokenStore`: token kept as JSON in the cache directory
//! - `KeychainTokenStore`: token kept in the OS keychain via keyring
//! - `MemoryTokenStore`: process-local slot, also used in tests
//!
//! Only the session controller writes to a store.

pub mod file_store;
pub mod keychain;
pub mod store;

pub use file_store::FileTokenStore;
pub use keychain::KeychainTokenStore;
pub use store::{open_store, MemoryTokenStore, TokenStore};
