use crate::models::{SessionToken, Vault};

use super::{Notice, Operation, SessionError};

/// Which screen the front-end should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Vaults,
}

/// Snapshot of the session as the front-end sees it.
///
/// Only `SessionController` mutates it. `vaults` is always empty while
/// `token` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) token: Option<SessionToken>,
    pub(crate) vaults: Vec<Vault>,
    pub(crate) status: Option<Notice>,
}

impl SessionState {
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Vaults in server order
    pub fn vaults(&self) -> &[Vault] {
        &self.vaults
    }

    pub fn status(&self) -> Option<&Notice> {
        self.status.as_ref()
    }

    /// Status line text, empty when there is nothing to say
    pub fn status_message(&self) -> String {
        self.status.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// The last vault listing failed, so an empty list means "unknown", not "none"
    pub fn listing_failed(&self) -> bool {
        matches!(
            self.status,
            Some(Notice::Error(SessionError::Unreachable(Operation::LoadVaults)))
        )
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn view(&self) -> View {
        if self.is_authenticated() {
            View::Vaults
        } else {
            View::Login
        }
    }

    /// Drop the token and everything fetched with it
    pub(crate) fn clear_session(&mut self) {
        self.token = None;
        self.vaults.clear();
    }
}
