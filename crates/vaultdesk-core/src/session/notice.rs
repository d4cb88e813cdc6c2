use std::fmt;

use thiserror::Error;

/// Which remote call could not be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SignIn,
    LoadVaults,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SignIn => f.write_str("Could not connect to the server. Please try again."),
            Operation::LoadVaults => {
                f.write_str("An error occurred while loading your vaults. Please try again.")
            }
        }
    }
}

/// Failures the session controller resolves into state plus a message.
///
/// The `Display` text is what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Login failed! Email or password is incorrect.")]
    InvalidCredentials,

    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    #[error("{0}")]
    Unreachable(Operation),

    /// Logged only: the in-memory session and the persisted token may disagree
    #[error("Could not update the saved session: {0}")]
    StoreWriteFailure(String),
}

/// The human-facing status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SignInPrompt,
    MissingCredentials,
    SigningIn,
    LoadingVaults,
    LoggedOut,
    Error(SessionError),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_) | Notice::MissingCredentials)
    }

    /// A request is outstanding and the notice will be replaced by its outcome
    pub fn is_progress(&self) -> bool {
        matches!(self, Notice::SigningIn | Notice::LoadingVaults)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SignInPrompt => f.write_str("Please log in."),
            Notice::MissingCredentials => f.write_str("Email and password are required."),
            Notice::SigningIn => f.write_str("Logging in, please wait..."),
            Notice::LoadingVaults => f.write_str("Loading your vaults..."),
            Notice::LoggedOut => f.write_str("Logged out."),
            Notice::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<SessionError> for Notice {
    fn from(e: SessionError) -> Self {
        Notice::Error(e)
    }
}
