//! REST API client module for the vault service.
//!
//! This module provides the `ApiClient` for talking to the vault backend
//! and the `VaultService` seam the session controller is written against.
//!
//! The backend uses bearer token authentication; tokens are obtained from
//! the login endpoint and presented on every listing request.

pub mod client;
pub mod error;
pub mod service;

pub use client::ApiClient;
pub use error::ApiError;
pub use service::{AuthOutcome, ListOutcome, VaultService};
