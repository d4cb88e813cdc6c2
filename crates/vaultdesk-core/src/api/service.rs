use std::future::Future;

use crate::models::{Credentials, SessionToken, Vault};

/// Result of a single login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success(SessionToken),
    /// The server refused the credentials
    Rejected,
    /// Transport failure or any server-side error
    Unreachable,
}

/// Result of a vault listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    /// Vaults in server order
    Success(Vec<Vault>),
    /// The server explicitly refused the token (HTTP 401)
    Unauthorized,
    /// Anything else that went wrong
    Unreachable,
}

/// The remote operations the session controller depends on.
///
/// Implementations classify every response into one of the outcome variants
/// and never surface raw transport errors. `Unauthorized` must only be
/// reported when the server rejected the token itself, since the controller
/// revokes the session on it.
pub trait VaultService {
    /// Single attempt, no internal retry.
    fn authenticate(&self, credentials: &Credentials) -> impl Future<Output = AuthOutcome> + Send;

    fn list_vaults(&self, token: &SessionToken) -> impl Future<Output = ListOutcome> + Send;
}
