//! Data models shared by the API client, token stores and session controller.
//!
//! - `Vault`: a named, server-owned record listed for the signed-in user
//! - `Credentials`: identifier/secret pair, alive only for one login attempt
//! - `SessionToken`: opaque bearer token proving a prior login

pub mod credentials;
pub mod vault;

pub use credentials::{Credentials, SessionToken};
pub use vault::Vault;
