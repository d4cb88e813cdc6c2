//! Application state management for vaultdesk.
//!
//! This module contains the `App` struct that ties the session controller to
//! the terminal: login form state, list selection, and the channel through
//! which background network tasks report back.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use vaultdesk_core::api::{ApiClient, AuthOutcome, ListOutcome, VaultService};
use vaultdesk_core::auth::TokenStore;
use vaultdesk_core::config::{Config, ENV_EMAIL, ENV_PASSWORD};
use vaultdesk_core::models::Credentials;
use vaultdesk_core::session::{LoginTicket, RefreshTicket, SessionController, SessionState, View};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Only one login and one refresh run at a time, so this never fills up.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Identifier,
    Secret,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Identifier => LoginFocus::Secret,
            LoginFocus::Secret => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Identifier,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Identifier => LoginFocus::Button,
            LoginFocus::Secret => LoginFocus::Identifier,
            LoginFocus::Button => LoginFocus::Secret,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned network tasks, paired with the ticket
/// they were started for.
enum TaskResult {
    Login(LoginTicket, AuthOutcome),
    Refresh(RefreshTicket, ListOutcome),
}

/// Main application state container
pub struct App {
    pub config: Config,
    /// Where `config` is saved; `None` keeps changes in memory
    config_path: Option<PathBuf>,
    api: ApiClient,
    session: SessionController<Box<dyn TokenStore>>,

    pub state: AppState,

    // Login form state
    pub login_identifier: String,
    pub login_secret: String,
    pub login_focus: LoginFocus,

    pub vault_selection: usize,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
}

impl App {
    /// Create the app and restore any stored session.
    ///
    /// Must be called inside a Tokio runtime: a stored token triggers a
    /// background refresh right away.
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        api: ApiClient,
        store: Box<dyn TokenStore>,
    ) -> Self {
        let (session, ticket) = SessionController::bootstrap(store);
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_identifier = std::env::var(ENV_EMAIL)
            .ok()
            .or_else(|| config.last_identifier.clone())
            .unwrap_or_default();
        let login_secret = std::env::var(ENV_PASSWORD).unwrap_or_default();
        let login_focus = if login_identifier.is_empty() {
            LoginFocus::Identifier
        } else {
            LoginFocus::Secret
        };

        let app = Self {
            config,
            config_path,
            api,
            session,
            state: AppState::Normal,
            login_identifier,
            login_secret,
            login_focus,
            vault_selection: 0,
            task_rx: rx,
            task_tx: tx,
        };

        if let Some(ticket) = ticket {
            app.spawn_refresh(ticket);
        }
        app
    }

    pub fn session(&self) -> &SessionState {
        self.session.state()
    }

    pub fn view(&self) -> View {
        self.session.state().view()
    }

    /// A request is outstanding
    pub fn is_busy(&self) -> bool {
        self.session.login_pending() || self.session.refresh_pending()
    }

    pub fn store_in_sync(&self) -> bool {
        self.session.store_in_sync()
    }

    // =========================================================================
    // User intents
    // =========================================================================

    /// Submit the login form
    pub fn submit_login(&mut self) {
        let credentials = Credentials::new(self.login_identifier.trim(), self.login_secret.clone());
        if let Some(ticket) = self.session.begin_login(credentials) {
            self.spawn_login(ticket);
        }
    }

    /// Reload the vault list
    pub fn request_refresh(&mut self) {
        if let Some(ticket) = self.session.begin_refresh() {
            self.spawn_refresh(ticket);
        }
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.vault_selection = 0;
        self.login_secret.clear();
        self.login_focus = if self.login_identifier.is_empty() {
            LoginFocus::Identifier
        } else {
            LoginFocus::Secret
        };
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    fn spawn_login(&self, ticket: LoginTicket) {
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = api.authenticate(ticket.credentials()).await;
            Self::send_result(&tx, TaskResult::Login(ticket, outcome)).await;
        });
    }

    fn spawn_refresh(&self, ticket: RefreshTicket) {
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = api.list_vaults(ticket.token()).await;
            Self::send_result(&tx, TaskResult::Refresh(ticket, outcome)).await;
        });
    }

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            error!("Failed to send task result - channel closed");
        }
    }

    /// Check for completed background tasks and apply their results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.process_task_result(result);
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Login(ticket, outcome) => {
                // A refresh ticket comes back only for an applied, successful login
                if let Some(refresh) = self.session.complete_login(ticket, outcome) {
                    self.spawn_refresh(refresh);
                    self.on_login_success();
                }
            }
            TaskResult::Refresh(ticket, outcome) => {
                if let Some(follow_up) = self.session.complete_refresh(ticket, outcome) {
                    self.spawn_refresh(follow_up);
                }
                self.clamp_selection();
            }
        }
    }

    fn on_login_success(&mut self) {
        self.login_secret.clear();
        self.vault_selection = 0;

        let identifier = self.login_identifier.trim().to_string();
        if self.config.last_identifier.as_deref() != Some(identifier.as_str()) {
            self.config.last_identifier = Some(identifier);
            if let Some(path) = &self.config_path {
                if let Err(e) = self.config.save_to(path) {
                    warn!(error = %e, path = %path.display(), "Failed to save config");
                }
            }
        }
        debug!("Signed in");
    }

    // =========================================================================
    // Vault list navigation
    // =========================================================================

    pub fn select_next(&mut self, step: usize) {
        let len = self.session.state().vaults().len();
        if len > 0 {
            self.vault_selection = (self.vault_selection + step).min(len - 1);
        }
    }

    pub fn select_prev(&mut self, step: usize) {
        self.vault_selection = self.vault_selection.saturating_sub(step);
    }

    pub fn select_first(&mut self) {
        self.vault_selection = 0;
    }

    pub fn select_last(&mut self) {
        self.vault_selection = self.session.state().vaults().len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.session.state().vaults().len();
        self.vault_selection = self.vault_selection.min(len.saturating_sub(1));
    }

    // =========================================================================
    // Login form editing
    // =========================================================================

    /// Field the cursor is in, if any
    pub fn focused_field_mut(&mut self) -> Option<&mut String> {
        match self.login_focus {
            LoginFocus::Identifier => Some(&mut self.login_identifier),
            LoginFocus::Secret => Some(&mut self.login_secret),
            LoginFocus::Button => None,
        }
    }
}

// ============================================================================
// Input Validation
// ============================================================================

/// Control characters never go into the form fields
pub fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

// ============================================================================
// Tests
// ============================================================================
