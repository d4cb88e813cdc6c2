//! vaultdesk core library.
//!
//! Signs a user in against the vault backend, keeps the session token in a
//! persistent store, and lists the user's vaults, revoking the session when
//! the server stops accepting the token.
//!
//! - `api`: HTTP client and response classification
//! - `auth`: token stores (file, OS keychain, memory)
//! - `config`: configuration file and environment overrides
//! - `models`: vaults, credentials, session tokens
//! - `session`: the session controller and its observable state

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod session;

pub use api::{ApiClient, AuthOutcome, ListOutcome, VaultService};
pub use auth::{open_store, TokenStore};
pub use config::Config;
pub use models::{Credentials, SessionToken, Vault};
pub use session::{Notice, SessionController, SessionState, View};
