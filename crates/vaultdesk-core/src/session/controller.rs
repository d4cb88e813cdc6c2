//! The session state machine.
//!
//! Two states: anonymous (no token) and authenticated (token plus the last
//! vault list fetched with it). Transitions:
//!
//! - login: anonymous -> authenticated on success, followed by a refresh
//! - refresh: stays authenticated, or revokes the session on a 401
//! - logout: always ends anonymous, no network call
//! - bootstrap: restores a stored token and refreshes it
//!
//! Each network call is represented by a ticket. At most one login and one
//! refresh are in flight; a refresh requested meanwhile is queued and issued
//! when the current one completes. Logging out, logging in and revocation
//! start a new session generation, and any ticket from an older generation
//! is discarded when its result arrives.

use tracing::{debug, info, warn};

use crate::api::{AuthOutcome, ListOutcome, VaultService};
use crate::auth::TokenStore;
use crate::models::{Credentials, SessionToken};

use super::{Notice, Operation, SessionError, SessionState};

/// An outstanding login request
#[derive(Debug)]
pub struct LoginTicket {
    id: u64,
    credentials: Credentials,
}

impl LoginTicket {
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// An outstanding vault listing request for one session
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    id: u64,
    generation: u64,
    token: SessionToken,
}

impl RefreshTicket {
    /// Token the listing must be requested with
    pub fn token(&self) -> &SessionToken {
        &self.token
    }
}

pub struct SessionController<S> {
    store: S,
    state: SessionState,
    /// Bumped whenever the token changes
    generation: u64,
    next_request_id: u64,
    login_in_flight: Option<u64>,
    refresh_in_flight: Option<u64>,
    refresh_queued: bool,
    store_in_sync: bool,
}

impl<S: TokenStore> SessionController<S> {
    /// Read the store once and set up the initial state.
    ///
    /// When a token was stored, the controller starts authenticated with no
    /// vaults and returns the refresh that validates the token.
    pub fn bootstrap(store: S) -> (Self, Option<RefreshTicket>) {
        let stored = match store.get() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session, starting signed out");
                None
            }
        };

        let mut controller = Self {
            store,
            state: SessionState::default(),
            generation: 0,
            next_request_id: 0,
            login_in_flight: None,
            refresh_in_flight: None,
            refresh_queued: false,
            store_in_sync: true,
        };

        match stored {
            Some(token) => {
                info!("Restoring stored session");
                controller.state.token = Some(token.clone());
                let ticket = controller.issue_refresh(token);
                (controller, Some(ticket))
            }
            None => {
                debug!("No stored session");
                controller.state.status = Some(Notice::SignInPrompt);
                (controller, None)
            }
        }
    }

    /// Bootstrap and run the initial refresh to completion
    pub async fn bootstrap_with(store: S, service: &impl VaultService) -> Self {
        let (mut controller, ticket) = Self::bootstrap(store);
        if let Some(ticket) = ticket {
            controller.run_refresh(service, ticket).await;
        }
        controller
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// False after a store write failed; the persisted token may then
    /// disagree with the in-memory session until the next successful write.
    pub fn store_in_sync(&self) -> bool {
        self.store_in_sync
    }

    pub fn login_pending(&self) -> bool {
        self.login_in_flight.is_some()
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh_in_flight.is_some()
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Start a login attempt.
    ///
    /// Returns `None` when already signed in, when another login is still
    /// running, or when either credential field is empty.
    pub fn begin_login(&mut self, credentials: Credentials) -> Option<LoginTicket> {
        if self.state.is_authenticated() {
            debug!("Ignoring login request, already signed in");
            return None;
        }
        if self.login_in_flight.is_some() {
            debug!("Ignoring login request, another login is in flight");
            return None;
        }
        if !credentials.is_complete() {
            self.state.status = Some(Notice::MissingCredentials);
            return None;
        }

        let id = self.next_id();
        self.login_in_flight = Some(id);
        self.state.status = Some(Notice::SigningIn);
        debug!(request_id = id, "Login started");
        Some(LoginTicket { id, credentials })
    }

    /// Apply the result of a login attempt.
    ///
    /// On success the token is stored and the refresh for it is returned;
    /// the caller must run it to load the vault list.
    pub fn complete_login(&mut self, ticket: LoginTicket, outcome: AuthOutcome) -> Option<RefreshTicket> {
        if self.login_in_flight != Some(ticket.id) {
            debug!(request_id = ticket.id, "Discarding superseded login result");
            return None;
        }
        self.login_in_flight = None;

        match outcome {
            AuthOutcome::Success(token) => {
                info!("Login successful");
                self.persist(&token);
                self.generation += 1;
                self.state.token = Some(token.clone());
                self.state.vaults.clear();
                self.state.status = None;
                Some(self.issue_refresh(token))
            }
            AuthOutcome::Rejected => {
                info!("Login rejected");
                self.state.status = Some(SessionError::InvalidCredentials.into());
                None
            }
            AuthOutcome::Unreachable => {
                self.state.status = Some(SessionError::Unreachable(Operation::SignIn).into());
                None
            }
        }
    }

    /// Log in and load the vault list
    pub async fn login(&mut self, service: &impl VaultService, credentials: Credentials) {
        let Some(ticket) = self.begin_login(credentials) else {
            return;
        };
        let outcome = service.authenticate(ticket.credentials()).await;
        if let Some(refresh) = self.complete_login(ticket, outcome) {
            self.run_refresh(service, refresh).await;
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Request a reload of the vault list for the current session.
    ///
    /// Returns `None` when signed out, or when a refresh is already running;
    /// in that case one follow-up refresh is queued and handed out by
    /// `complete_refresh`.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        let token = self.state.token.clone()?;
        if self.refresh_in_flight.is_some() {
            debug!("Refresh already in flight, queueing another");
            self.refresh_queued = true;
            return None;
        }
        Some(self.issue_refresh(token))
    }

    /// Apply the result of a vault listing request.
    ///
    /// Results for a ticket that is no longer current are dropped without
    /// touching state. May return a queued follow-up refresh.
    pub fn complete_refresh(&mut self, ticket: RefreshTicket, outcome: ListOutcome) -> Option<RefreshTicket> {
        if self.refresh_in_flight != Some(ticket.id) {
            debug!(request_id = ticket.id, "Discarding superseded refresh result");
            return None;
        }
        self.refresh_in_flight = None;

        if ticket.generation != self.generation || self.state.token.as_ref() != Some(&ticket.token) {
            debug!(request_id = ticket.id, "Discarding refresh result for a previous session");
            return None;
        }

        match outcome {
            ListOutcome::Success(vaults) => {
                debug!(count = vaults.len(), "Vault list updated");
                self.state.vaults = vaults;
                self.state.status = None;
            }
            ListOutcome::Unauthorized => {
                info!("Session rejected by server, revoking");
                self.end_session(SessionError::SessionExpired.into());
                return None;
            }
            ListOutcome::Unreachable => {
                self.state.status = Some(SessionError::Unreachable(Operation::LoadVaults).into());
            }
        }

        if self.refresh_queued {
            self.refresh_queued = false;
            let token = ticket.token;
            return Some(self.issue_refresh(token));
        }
        None
    }

    /// Reload the vault list, including any refresh queued meanwhile
    pub async fn refresh(&mut self, service: &impl VaultService) {
        if let Some(ticket) = self.begin_refresh() {
            self.run_refresh(service, ticket).await;
        }
    }

    async fn run_refresh(&mut self, service: &impl VaultService, ticket: RefreshTicket) {
        let mut next = Some(ticket);
        while let Some(ticket) = next {
            let outcome = service.list_vaults(ticket.token()).await;
            next = self.complete_refresh(ticket, outcome);
        }
    }

    // =========================================================================
    // Logout
    // =========================================================================

    /// End the session locally. Never fails and never touches the network;
    /// results of requests still in flight are discarded when they arrive.
    pub fn logout(&mut self) {
        info!("Logging out");
        self.end_session(Notice::LoggedOut);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn next_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    fn issue_refresh(&mut self, token: SessionToken) -> RefreshTicket {
        let id = self.next_id();
        self.refresh_in_flight = Some(id);
        self.state.status = Some(Notice::LoadingVaults);
        debug!(request_id = id, generation = self.generation, "Refresh started");
        RefreshTicket {
            id,
            generation: self.generation,
            token,
        }
    }

    /// Delete the stored token and clear the session in one step
    fn end_session(&mut self, notice: Notice) {
        let result = self.store.delete();
        self.record_store_write(result);
        self.generation += 1;
        self.state.clear_session();
        self.login_in_flight = None;
        self.refresh_in_flight = None;
        self.refresh_queued = false;
        self.state.status = Some(notice);
    }

    fn persist(&mut self, token: &SessionToken) {
        let result = self.store.set(token);
        self.record_store_write(result);
    }

    fn record_store_write(&mut self, result: anyhow::Result<()>) {
        match result {
            Ok(()) => self.store_in_sync = true,
            Err(e) => {
                let error = SessionError::StoreWriteFailure(format!("{:#}", e));
                warn!(error = %error, "Token store out of sync with session");
                self.store_in_sync = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::auth::MemoryTokenStore;
    use crate::models::Vault;
    use crate::session::View;

    /// Service that replays canned outcomes and records what it was asked
    #[derive(Default)]
    struct ScriptedService {
        auth: Mutex<VecDeque<AuthOutcome>>,
        lists: Mutex<VecDeque<ListOutcome>>,
        list_calls: Mutex<Vec<SessionToken>>,
        auth_calls: Mutex<usize>,
    }

    impl ScriptedService {
        fn auth(self, outcome: AuthOutcome) -> Self {
            self.auth.lock().unwrap().push_back(outcome);
            self
        }

        fn list(self, outcome: ListOutcome) -> Self {
            self.lists.lock().unwrap().push_back(outcome);
            self
        }

        fn list_calls(&self) -> Vec<SessionToken> {
            self.list_calls.lock().unwrap().clone()
        }

        fn auth_calls(&self) -> usize {
            *self.auth_calls.lock().unwrap()
        }
    }

    impl VaultService for ScriptedService {
        async fn authenticate(&self, _credentials: &Credentials) -> AuthOutcome {
            *self.auth_calls.lock().unwrap() += 1;
            self.auth.lock().unwrap().pop_front().expect("unexpected authenticate call")
        }

        async fn list_vaults(&self, token: &SessionToken) -> ListOutcome {
            self.list_calls.lock().unwrap().push(token.clone());
            self.lists.lock().unwrap().pop_front().expect("unexpected list_vaults call")
        }
    }

    fn token(raw: &str) -> SessionToken {
        SessionToken::new(raw).expect("non-empty test token")
    }

    fn vault(id: i64, name: &str, description: Option<&str>) -> Vault {
        Vault {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
        }
    }

    fn creds() -> Credentials {
        Credentials::new("a@b.com", "x")
    }

    fn assert_invariant<S: TokenStore>(controller: &SessionController<S>) {
        let state = controller.state();
        if state.token().is_none() {
            assert!(state.vaults().is_empty(), "vaults survived without a token");
        }
    }

    /// Controller signed in as `raw` with `vaults` loaded
    async fn signed_in(raw: &str, vaults: Vec<Vault>) -> SessionController<MemoryTokenStore> {
        let service = ScriptedService::default()
            .auth(AuthOutcome::Success(token(raw)))
            .list(ListOutcome::Success(vaults));
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::default());
        controller.login(&service, creds()).await;
        assert!(controller.state().is_authenticated());
        controller
    }

    // -------------------------------------------------------------------------
    // Bootstrap
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_bootstrap_empty_store_is_anonymous() {
        let service = ScriptedService::default();
        let controller = SessionController::bootstrap_with(MemoryTokenStore::default(), &service).await;

        assert_eq!(controller.state().view(), View::Login);
        assert!(controller.state().token().is_none());
        assert!(service.list_calls().is_empty());
        assert_eq!(service.auth_calls(), 0);
        assert_eq!(controller.state().status(), Some(&Notice::SignInPrompt));
    }

    #[tokio::test]
    async fn test_bootstrap_with_stored_token_loads_vaults() {
        let service = ScriptedService::default()
            .list(ListOutcome::Success(vec![vault(1, "Personal", Some("misc"))]));
        let store = MemoryTokenStore::with_token(token("T1"));

        let controller = SessionController::bootstrap_with(store, &service).await;

        assert_eq!(service.list_calls(), vec![token("T1")]);
        assert_eq!(controller.state().token(), Some(&token("T1")));
        assert_eq!(controller.state().vaults(), &[vault(1, "Personal", Some("misc"))]);
        assert_eq!(controller.state().status_message(), "");
        assert_eq!(controller.state().view(), View::Vaults);
    }

    #[test]
    fn test_bootstrap_is_pending_before_refresh_completes() {
        let (controller, ticket) = SessionController::bootstrap(MemoryTokenStore::with_token(token("T1")));
        let ticket = ticket.expect("stored token should trigger a refresh");

        assert_eq!(ticket.token(), &token("T1"));
        assert!(controller.state().is_authenticated());
        assert!(controller.state().vaults().is_empty());
        assert!(controller.refresh_pending());
        assert_eq!(controller.store().write_count(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_with_expired_stored_token_revokes() {
        let service = ScriptedService::default().list(ListOutcome::Unauthorized);
        let controller =
            SessionController::bootstrap_with(MemoryTokenStore::with_token(token("old")), &service).await;

        assert!(controller.state().token().is_none());
        assert!(controller.store().peek().is_none());
        assert_eq!(
            controller.state().status(),
            Some(&Notice::Error(SessionError::SessionExpired))
        );
    }

    // -------------------------------------------------------------------------
    // Login
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_success_stores_token_and_refreshes_with_it() {
        let service = ScriptedService::default()
            .auth(AuthOutcome::Success(token("T1")))
            .list(ListOutcome::Success(vec![vault(1, "Personal", None)]));
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::default());

        controller.login(&service, creds()).await;

        assert_eq!(controller.store().peek(), Some(&token("T1")));
        assert_eq!(service.list_calls(), vec![token("T1")]);
        assert_eq!(controller.state().vaults().len(), 1);
        assert_eq!(controller.state().status(), None);
        assert!(!controller.login_pending());
    }

    #[tokio::test]
    async fn test_login_rejected_leaves_store_untouched() {
        let service = ScriptedService::default().auth(AuthOutcome::Rejected);
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::default());

        controller.login(&service, creds()).await;

        assert!(controller.state().token().is_none());
        assert_eq!(
            controller.state().status(),
            Some(&Notice::Error(SessionError::InvalidCredentials))
        );
        assert_eq!(controller.store().write_count(), 0);
        assert!(service.list_calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_unreachable_has_distinct_notice() {
        let service = ScriptedService::default().auth(AuthOutcome::Unreachable);
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::default());

        controller.login(&service, creds()).await;

        assert!(controller.state().token().is_none());
        assert_eq!(
            controller.state().status(),
            Some(&Notice::Error(SessionError::Unreachable(Operation::SignIn)))
        );
        assert_eq!(controller.store().write_count(), 0);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let service = ScriptedService::default();
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::default());

        controller.login(&service, Credentials::new("a@b.com", "")).await;

        assert_eq!(service.auth_calls(), 0);
        assert_eq!(controller.state().status(), Some(&Notice::MissingCredentials));
    }

    #[test]
    fn test_second_login_rejected_while_first_in_flight() {
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::default());

        let first = controller.begin_login(creds());
        assert!(first.is_some());
        assert!(controller.login_pending());
        assert!(controller.begin_login(creds()).is_none());
    }

    #[test]
    fn test_login_ignored_when_signed_in() {
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::with_token(token("T1")));
        assert!(controller.begin_login(creds()).is_none());
    }

    #[tokio::test]
    async fn test_login_then_unreachable_refresh_keeps_session() {
        let service = ScriptedService::default()
            .auth(AuthOutcome::Success(token("T1")))
            .list(ListOutcome::Unreachable);
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::default());

        controller.login(&service, creds()).await;

        assert_eq!(controller.state().token(), Some(&token("T1")));
        assert!(controller.state().vaults().is_empty());
        assert_eq!(controller.store().peek(), Some(&token("T1")));
        assert_eq!(
            controller.state().status(),
            Some(&Notice::Error(SessionError::Unreachable(Operation::LoadVaults)))
        );
    }

    // -------------------------------------------------------------------------
    // Refresh
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_refresh_unreachable_keeps_previous_vaults() {
        let vaults = vec![vault(1, "R1", None), vault(2, "R2", None)];
        let mut controller = signed_in("T1", vaults.clone()).await;
        let service = ScriptedService::default().list(ListOutcome::Unreachable);

        controller.refresh(&service).await;

        assert_eq!(controller.state().token(), Some(&token("T1")));
        assert_eq!(controller.state().vaults(), vaults.as_slice());
        assert!(!controller.state().status_message().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_unauthorized_revokes_session() {
        let mut controller = signed_in("T1", vec![vault(1, "R1", None), vault(2, "R2", None)]).await;
        let service = ScriptedService::default().list(ListOutcome::Unauthorized);

        controller.refresh(&service).await;

        assert!(controller.state().token().is_none());
        assert!(controller.state().vaults().is_empty());
        assert!(controller.store().peek().is_none());
        assert_eq!(
            controller.state().status(),
            Some(&Notice::Error(SessionError::SessionExpired))
        );
        assert_eq!(controller.state().view(), View::Login);
        assert_invariant(&controller);
    }

    #[tokio::test]
    async fn test_refresh_success_replaces_with_empty_list() {
        let mut controller = signed_in("T1", vec![vault(1, "R1", None)]).await;
        let service = ScriptedService::default().list(ListOutcome::Success(Vec::new()));

        controller.refresh(&service).await;

        assert!(controller.state().is_authenticated());
        assert!(controller.state().vaults().is_empty());
        assert_eq!(controller.state().status_message(), "");
    }

    #[test]
    fn test_refresh_without_session_does_nothing() {
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::default());
        assert!(controller.begin_refresh().is_none());
        assert!(!controller.refresh_pending());
    }

    #[test]
    fn test_refresh_requested_during_refresh_is_queued() {
        let (mut controller, first) = SessionController::bootstrap(MemoryTokenStore::with_token(token("T1")));
        let first = first.expect("bootstrap refresh");

        // Second request while the first is outstanding
        assert!(controller.begin_refresh().is_none());

        let follow_up = controller
            .complete_refresh(first, ListOutcome::Success(vec![vault(1, "Old", None)]))
            .expect("queued refresh should be issued");
        assert_eq!(follow_up.token(), &token("T1"));
        assert!(controller.refresh_pending());

        let done = controller.complete_refresh(follow_up, ListOutcome::Success(vec![vault(2, "New", None)]));
        assert!(done.is_none());
        assert_eq!(controller.state().vaults(), &[vault(2, "New", None)]);
    }

    #[test]
    fn test_unauthorized_drops_queued_refresh() {
        let (mut controller, first) = SessionController::bootstrap(MemoryTokenStore::with_token(token("T1")));
        let first = first.expect("bootstrap refresh");
        assert!(controller.begin_refresh().is_none());

        assert!(controller.complete_refresh(first, ListOutcome::Unauthorized).is_none());
        assert!(!controller.refresh_pending());
        assert!(controller.state().token().is_none());
    }

    // -------------------------------------------------------------------------
    // Logout and superseded results
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let mut controller = signed_in("T1", vec![vault(1, "R1", None)]).await;

        controller.logout();

        assert!(controller.state().token().is_none());
        assert!(controller.state().vaults().is_empty());
        assert!(controller.store().peek().is_none());
        assert_eq!(controller.state().status(), Some(&Notice::LoggedOut));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let mut once = signed_in("T1", vec![vault(1, "R1", None)]).await;
        let mut twice = signed_in("T1", vec![vault(1, "R1", None)]).await;

        once.logout();
        twice.logout();
        twice.logout();

        assert_eq!(once.state(), twice.state());
        assert_eq!(once.store().peek(), twice.store().peek());
    }

    #[test]
    fn test_refresh_result_after_logout_is_discarded() {
        let (mut controller, ticket) = SessionController::bootstrap(MemoryTokenStore::with_token(token("T1")));
        let ticket = ticket.expect("bootstrap refresh");

        controller.logout();
        let follow_up = controller.complete_refresh(ticket, ListOutcome::Success(vec![vault(1, "R1", None)]));

        assert!(follow_up.is_none());
        assert!(controller.state().vaults().is_empty());
        assert_eq!(controller.state().status(), Some(&Notice::LoggedOut));
        assert_invariant(&controller);
    }

    #[test]
    fn test_stale_unauthorized_does_not_revoke_new_session() {
        let (mut controller, old) = SessionController::bootstrap(MemoryTokenStore::with_token(token("T1")));
        let old = old.expect("bootstrap refresh");

        controller.logout();
        let login = controller.begin_login(creds()).expect("login ticket");
        let _new = controller
            .complete_login(login, AuthOutcome::Success(token("T2")))
            .expect("refresh after login");

        // The old session's 401 arrives late
        controller.complete_refresh(old, ListOutcome::Unauthorized);

        assert_eq!(controller.state().token(), Some(&token("T2")));
        assert_eq!(controller.store().peek(), Some(&token("T2")));
    }

    #[test]
    fn test_late_response_for_previous_token_is_discarded() {
        let (mut controller, t1_ticket) =
            SessionController::bootstrap(MemoryTokenStore::with_token(token("T1")));
        let t1_ticket = t1_ticket.expect("bootstrap refresh");

        // Session changes while the T1 listing is outstanding
        controller.logout();
        let login = controller.begin_login(creds()).expect("login ticket");
        let t2_ticket = controller
            .complete_login(login, AuthOutcome::Success(token("T2")))
            .expect("refresh after login");
        assert_eq!(t2_ticket.token(), &token("T2"));

        controller.complete_refresh(t2_ticket, ListOutcome::Success(vec![vault(2, "Second", None)]));
        controller.complete_refresh(t1_ticket, ListOutcome::Success(vec![vault(1, "First", None)]));

        assert_eq!(controller.state().token(), Some(&token("T2")));
        assert_eq!(controller.state().vaults(), &[vault(2, "Second", None)]);
    }

    #[test]
    fn test_login_result_after_logout_is_discarded() {
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::default());
        let ticket = controller.begin_login(creds()).expect("login ticket");

        controller.logout();
        let refresh = controller.complete_login(ticket, AuthOutcome::Success(token("T1")));

        assert!(refresh.is_none());
        assert!(controller.state().token().is_none());
        assert!(controller.store().peek().is_none());
    }

    // -------------------------------------------------------------------------
    // Store failures
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_store_write_failure_is_not_fatal() {
        let service = ScriptedService::default()
            .auth(AuthOutcome::Success(token("T1")))
            .list(ListOutcome::Success(vec![vault(1, "R1", None)]));
        let store = MemoryTokenStore::default().fail_writes(true);
        let (mut controller, _) = SessionController::bootstrap(store);

        controller.login(&service, creds()).await;

        // Session lives in memory even though it was not persisted
        assert_eq!(controller.state().token(), Some(&token("T1")));
        assert_eq!(controller.state().vaults().len(), 1);
        assert!(controller.store().peek().is_none());
        assert!(!controller.store_in_sync());

        controller.logout();
        assert!(controller.state().token().is_none());
        assert_eq!(controller.state().status(), Some(&Notice::LoggedOut));
    }

    #[tokio::test]
    async fn test_invariant_holds_through_a_full_session() {
        let service = ScriptedService::default()
            .auth(AuthOutcome::Rejected)
            .auth(AuthOutcome::Success(token("T1")))
            .list(ListOutcome::Success(vec![vault(1, "R1", None)]))
            .list(ListOutcome::Unreachable)
            .list(ListOutcome::Unauthorized);
        let (mut controller, _) = SessionController::bootstrap(MemoryTokenStore::default());
        assert_invariant(&controller);

        controller.login(&service, creds()).await;
        assert_invariant(&controller);
        controller.login(&service, creds()).await;
        assert_invariant(&controller);
        controller.refresh(&service).await;
        assert_invariant(&controller);
        controller.refresh(&service).await;
        assert_invariant(&controller);
        controller.logout();
        assert_invariant(&controller);
    }
}
