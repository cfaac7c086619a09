use super::*;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use crate::net::types::RefreshResponse;

// =========================================================================
// MockGateway
// =========================================================================

struct MockGateway {
    state: Mutex<MockState>,
    login_calls: AtomicUsize,
    register_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    profile_tokens: Mutex<Vec<String>>,
}

struct MockState {
    password: String,
    user: UserProfile,
    valid_access: HashSet<String>,
    next_access: VecDeque<String>,
    refresh_delay: Duration,
    profile_failure: Option<SessionError>,
    logout_fails: bool,
    /// Successful credential exchanges so far; the n-th one issues `a{n}`/`r{n}`.
    issued: usize,
}

impl MockGateway {
    fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                password: "secret1".into(),
                user: UserProfile { id: 1, email: "u@x.com".into(), display_name: "U".into() },
                valid_access: HashSet::from(["a1".to_owned()]),
                next_access: VecDeque::new(),
                refresh_delay: Duration::ZERO,
                profile_failure: None,
                logout_fails: false,
                issued: 0,
            }),
            login_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            profile_tokens: Mutex::new(Vec::new()),
        }
    }

    fn with(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    fn edit(&self, f: impl FnOnce(&mut MockState)) {
        f(&mut self.state.lock().unwrap());
    }

    fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn profile_tokens(&self) -> Vec<String> {
        self.profile_tokens.lock().unwrap().clone()
    }

    fn auth_response(&self) -> AuthResponse {
        let mut state = self.state.lock().unwrap();
        state.issued += 1;
        let access = format!("a{}", state.issued);
        state.valid_access.insert(access.clone());
        AuthResponse { access_token: access, refresh_token: format!("r{}", state.issued), user: Some(state.user.clone()) }
    }
}

#[async_trait::async_trait]
impl AuthGateway for MockGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, SessionError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let ok = {
            let state = self.state.lock().unwrap();
            email == state.user.email && password == state.password
        };
        if ok { Ok(self.auth_response()) } else { Err(SessionError::InvalidCredentials("Identifiants invalides".into())) }
    }

    async fn register(&self, email: &str, _password: &str, name: &str) -> Result<AuthResponse, SessionError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.edit(|s| {
            s.user = UserProfile { id: 2, email: email.into(), display_name: name.into() };
        });
        Ok(self.auth_response())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SessionError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.state.lock().unwrap().refresh_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        if refresh_token != "r1" {
            return Err(SessionError::SessionExpired);
        }
        let access = state.next_access.pop_front().ok_or(SessionError::SessionExpired)?;
        state.valid_access.insert(access.clone());
        Ok(RefreshResponse { access_token: access })
    }

    async fn profile(&self, access_token: &str) -> Result<UserProfile, SessionError> {
        self.profile_tokens.lock().unwrap().push(access_token.to_owned());
        let state = self.state.lock().unwrap();
        if let Some(failure) = state.profile_failure.clone() {
            return Err(failure);
        }
        if state.valid_access.contains(access_token) { Ok(state.user.clone()) } else { Err(SessionError::Unauthorized) }
    }

    async fn logout(&self, _access_token: &str) -> Result<(), SessionError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.lock().unwrap().logout_fails {
            Err(SessionError::Transient("connection reset".into()))
        } else {
            Ok(())
        }
    }
}

fn manager(gateway: &Arc<MockGateway>, store: &Arc<MemoryTokenStore>) -> SessionManager {
    SessionManager::new(Arc::clone(gateway) as Arc<dyn AuthGateway>, Arc::clone(store) as Arc<dyn TokenStore>)
}

fn setup(gateway: MockGateway) -> (SessionManager, Arc<MockGateway>, Arc<MemoryTokenStore>) {
    let gateway = Arc::new(gateway);
    let store = Arc::new(MemoryTokenStore::default());
    (manager(&gateway, &store), gateway, store)
}

fn stored(access: &str, refresh: &str) -> StoredTokens {
    StoredTokens { access_token: access.into(), refresh_token: refresh.into() }
}

fn revoke_a1(state: &mut MockState) {
    state.valid_access.remove("a1");
}

// =========================================================================
// login / register
// =========================================================================

#[tokio::test]
async fn login_sets_tokens_user_and_persists() {
    let (session, gateway, store) = setup(MockGateway::new());

    session.login("u@x.com", "secret1").await.unwrap();

    let snap = session.snapshot();
    assert!(snap.is_authenticated());
    assert_eq!(snap.access_token.as_deref(), Some("a1"));
    assert_eq!(snap.refresh_token.as_deref(), Some("r1"));
    assert_eq!(snap.user.unwrap().email, "u@x.com");
    assert_eq!(gateway.profile_tokens(), vec!["a1"]);
    assert_eq!(store.load().unwrap(), Some(stored("a1", "r1")));
}

#[tokio::test]
async fn failed_login_leaves_logged_out_state_untouched() {
    let (session, _gateway, store) = setup(MockGateway::new());
    let before = session.snapshot();

    let err = session.login("u@x.com", "wrong").await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidCredentials(_)));
    assert_eq!(session.snapshot(), before);
    assert!(!session.is_authenticated());
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn failed_login_keeps_existing_session() {
    let (session, _gateway, store) = setup(MockGateway::new());
    session.login("u@x.com", "secret1").await.unwrap();
    let before = session.snapshot();

    assert!(session.login("u@x.com", "wrong").await.is_err());

    assert_eq!(session.snapshot(), before);
    assert_eq!(store.load().unwrap(), Some(stored("a1", "r1")));
}

#[tokio::test]
async fn login_hides_login_prompt_and_notifies() {
    let (session, _gateway, _store) = setup(MockGateway::new());
    let mut notices = session.subscribe();
    session.set_show_login_modal(true);

    session.login("u@x.com", "secret1").await.unwrap();

    assert!(!session.show_login_modal());
    assert_eq!(notices.try_recv().unwrap(), SessionNotice::LoggedIn { email: "u@x.com".into() });
}

#[tokio::test]
async fn register_validates_before_calling_gateway() {
    let (session, gateway, _store) = setup(MockGateway::new());

    let err = session.register("ana@x.com", "short", "Ana").await.unwrap_err();

    assert!(matches!(err, SessionError::Validation(_)));
    assert_eq!(gateway.register_calls.load(Ordering::SeqCst), 0);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn register_establishes_session() {
    let (session, gateway, _store) = setup(MockGateway::new());

    session.register("ana@x.com", "longenough", "Ana").await.unwrap();

    assert_eq!(gateway.register_calls.load(Ordering::SeqCst), 1);
    let user = session.user().unwrap();
    assert_eq!(user.email, "ana@x.com");
    assert_eq!(user.display_name, "Ana");
}

// =========================================================================
// logout
// =========================================================================

#[tokio::test]
async fn logout_clears_everything_even_when_request_fails() {
    let (session, gateway, store) = setup(MockGateway::new().with(|s| s.logout_fails = true));
    session.login("u@x.com", "secret1").await.unwrap();
    let mut notices = session.subscribe();

    session.logout().await;

    let snap = session.snapshot();
    assert!(snap.access_token.is_none() && snap.refresh_token.is_none() && snap.user.is_none());
    assert!(!session.is_authenticated());
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(gateway.logout_calls.load(Ordering::SeqCst), 1);
    assert_eq!(notices.try_recv().unwrap(), SessionNotice::LoggedOut);
}

#[tokio::test]
async fn logout_removes_unreadable_token_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, "{ not json").unwrap();
    let gateway = Arc::new(MockGateway::new());
    let session = SessionManager::new(gateway.clone(), Arc::new(FileTokenStore::new(&path)));

    assert!(matches!(session.hydrate().await, Err(SessionError::Storage(_))));
    session.logout().await;

    assert!(!path.exists());
    assert!(!session.is_authenticated());
    assert_eq!(gateway.logout_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn logout_without_session_skips_request() {
    let (session, gateway, _store) = setup(MockGateway::new());
    session.logout().await;
    assert_eq!(gateway.logout_calls.load(Ordering::SeqCst), 0);
}

// =========================================================================
// profile fetch + reactive refresh
// =========================================================================

#[tokio::test]
async fn profile_without_session_is_unauthenticated() {
    let (session, gateway, _store) = setup(MockGateway::new());
    assert_eq!(session.fetch_profile().await.unwrap_err(), SessionError::Unauthenticated);
    assert!(gateway.profile_tokens().is_empty());
}

#[tokio::test]
async fn profile_401_refreshes_once_then_retries_with_new_token() {
    let (session, gateway, store) = setup(MockGateway::new());
    session.login("u@x.com", "secret1").await.unwrap();
    gateway.edit(|s| {
        revoke_a1(s);
        s.next_access.push_back("a2".into());
    });

    let user = session.fetch_profile().await.unwrap();

    assert_eq!(user.email, "u@x.com");
    assert_eq!(gateway.refreshes(), 1);
    assert_eq!(gateway.profile_tokens(), vec!["a1", "a1", "a2"]);
    assert_eq!(session.access_token().as_deref(), Some("a2"));
    assert_eq!(store.load().unwrap(), Some(stored("a2", "r1")));
}

#[tokio::test]
async fn second_401_after_refresh_is_not_retried_again() {
    let (session, gateway, _store) = setup(MockGateway::new());
    session.login("u@x.com", "secret1").await.unwrap();
    // Every token is rejected, including the refreshed one.
    gateway.edit(|s| {
        s.next_access.push_back("a2".into());
        s.profile_failure = Some(SessionError::Unauthorized);
    });

    let err = session.fetch_profile().await.unwrap_err();

    assert_eq!(err, SessionError::Unauthorized);
    assert_eq!(gateway.refreshes(), 1);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn refresh_failure_forces_logout_without_retry_loop() {
    let (session, gateway, store) = setup(MockGateway::new());
    session.login("u@x.com", "secret1").await.unwrap();
    gateway.edit(revoke_a1);
    let mut notices = session.subscribe();

    let err = session.fetch_profile().await.unwrap_err();

    assert_eq!(err, SessionError::SessionExpired);
    assert_eq!(gateway.refreshes(), 1);
    let snap = session.snapshot();
    assert!(snap.access_token.is_none() && snap.refresh_token.is_none() && snap.user.is_none());
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(notices.try_recv().unwrap(), SessionNotice::SessionExpired);

    // Nothing else tries to refresh until a new login.
    assert_eq!(session.fetch_profile().await.unwrap_err(), SessionError::Unauthenticated);
    assert_eq!(gateway.refreshes(), 1);
}

#[tokio::test]
async fn transient_profile_failure_keeps_session() {
    let (session, gateway, _store) = setup(MockGateway::new());
    session.login("u@x.com", "secret1").await.unwrap();
    gateway.edit(|s| s.profile_failure = Some(SessionError::Server { status: 503, message: "maintenance".into() }));
    let mut notices = session.subscribe();

    let err = session.fetch_profile().await.unwrap_err();

    assert!(err.is_transient());
    let snap = session.snapshot();
    assert!(snap.is_authenticated());
    assert!(!snap.profile_loading);
    assert!(snap.profile_error.unwrap().contains("maintenance"));
    assert!(matches!(notices.try_recv().unwrap(), SessionNotice::ProfileUnavailable { .. }));
    assert_eq!(gateway.refreshes(), 0);
}

#[tokio::test]
async fn update_display_name_patches_cached_user() {
    let (session, _gateway, _store) = setup(MockGateway::new());
    session.update_display_name("ignored");
    assert!(session.user().is_none());

    session.login("u@x.com", "secret1").await.unwrap();
    session.update_display_name("Ursula");
    assert_eq!(session.user().unwrap().display_name, "Ursula");
}

// =========================================================================
// refresh single-flight
// =========================================================================

#[tokio::test(start_paused = true)]
async fn concurrent_refreshes_issue_one_request() {
    let (session, gateway, _store) = setup(MockGateway::new().with(|s| {
        s.refresh_delay = Duration::from_millis(50);
        s.next_access.extend(["a2".to_owned(), "a3".to_owned()]);
    }));
    session.login("u@x.com", "secret1").await.unwrap();

    let (a, b) = tokio::join!(session.refresh(), session.refresh());

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(gateway.refreshes(), 1);
    assert_eq!(session.access_token().as_deref(), Some("a2"));
}

#[tokio::test]
async fn refresh_without_refresh_token_expires() {
    let (session, gateway, _store) = setup(MockGateway::new());
    let mut notices = session.subscribe();

    assert_eq!(session.refresh().await.unwrap_err(), SessionError::SessionExpired);
    assert_eq!(gateway.refreshes(), 0);
    assert_eq!(notices.try_recv().unwrap(), SessionNotice::SessionExpired);
}

#[tokio::test(start_paused = true)]
async fn refresh_finishing_after_logout_does_not_resurrect_session() {
    let (session, _gateway, store) = setup(MockGateway::new().with(|s| {
        s.refresh_delay = Duration::from_millis(100);
        s.next_access.push_back("a2".into());
    }));
    session.login("u@x.com", "secret1").await.unwrap();

    let logout = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.logout().await;
    };
    let (refreshed, ()) = tokio::join!(session.refresh(), logout);

    assert_eq!(refreshed.unwrap_err(), SessionError::SessionExpired);
    assert!(!session.is_authenticated());
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_after_relogin_keeps_new_session() {
    let (session, _gateway, store) = setup(MockGateway::new().with(|s| s.refresh_delay = Duration::from_millis(100)));
    session.login("u@x.com", "secret1").await.unwrap();
    let mut notices = session.subscribe();

    // The r1 refresh fails only after the user has logged out and back in.
    let relogin = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.logout().await;
        session.login("u@x.com", "secret1").await.unwrap();
    };
    let (refreshed, ()) = tokio::join!(session.refresh(), relogin);

    assert!(refreshed.is_ok());
    let snap = session.snapshot();
    assert_eq!(snap.access_token.as_deref(), Some("a2"));
    assert_eq!(snap.refresh_token.as_deref(), Some("r2"));
    assert!(snap.user.is_some());
    assert_eq!(store.load().unwrap(), Some(stored("a2", "r2")));
    while let Ok(notice) = notices.try_recv() {
        assert_ne!(notice, SessionNotice::SessionExpired);
    }
}

// =========================================================================
// periodic refresh task
// =========================================================================

const PERIOD: Duration = Duration::from_secs(600);

#[tokio::test(start_paused = true)]
async fn refresh_task_ticks_while_authenticated_only() {
    let (session, gateway, _store) =
        setup(MockGateway::new().with(|s| s.next_access.extend(["a2".to_owned(), "a3".to_owned()])));
    session.login("u@x.com", "secret1").await.unwrap();
    let task = spawn_refresh_task(session.clone(), PERIOD);

    tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;
    assert_eq!(gateway.refreshes(), 1);
    assert_eq!(session.access_token().as_deref(), Some("a2"));

    tokio::time::sleep(PERIOD).await;
    assert_eq!(gateway.refreshes(), 2);

    session.logout().await;
    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(gateway.refreshes(), 2);

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn timer_tick_during_reactive_refresh_shares_the_request() {
    let (session, gateway, _store) = setup(MockGateway::new().with(|s| {
        s.refresh_delay = Duration::from_secs(2);
        s.next_access.extend(["a2".to_owned(), "a3".to_owned()]);
    }));
    session.login("u@x.com", "secret1").await.unwrap();
    let task = spawn_refresh_task(session.clone(), PERIOD);

    tokio::time::sleep(PERIOD - Duration::from_secs(1)).await;
    gateway.edit(revoke_a1);
    // The reactive refresh is in flight when the tick fires at PERIOD.
    session.fetch_profile().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(gateway.refreshes(), 1);
    assert_eq!(session.access_token().as_deref(), Some("a2"));
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn refresh_task_failure_logs_out_once() {
    let (session, gateway, _store) = setup(MockGateway::new());
    session.login("u@x.com", "secret1").await.unwrap();
    let task = spawn_refresh_task(session.clone(), PERIOD);

    tokio::time::sleep(PERIOD * 4).await;

    assert_eq!(gateway.refreshes(), 1);
    assert!(!session.is_authenticated());
    task.abort();
}

// =========================================================================
// hydrate
// =========================================================================

fn setup_with_store(gateway: MockGateway, tokens: StoredTokens) -> (SessionManager, Arc<MockGateway>, Arc<MemoryTokenStore>) {
    let gateway = Arc::new(gateway);
    let store = Arc::new(MemoryTokenStore::with_tokens(tokens));
    (manager(&gateway, &store), gateway, store)
}

#[tokio::test]
async fn hydrate_with_empty_store_stays_logged_out() {
    let (session, gateway, _store) = setup(MockGateway::new());
    assert!(!session.hydrate().await.unwrap());
    assert!(gateway.profile_tokens().is_empty());
}

#[tokio::test]
async fn hydrate_restores_and_probes_profile() {
    let (session, gateway, _store) = setup_with_store(MockGateway::new(), stored("a1", "r1"));

    assert!(session.hydrate().await.unwrap());

    assert_eq!(gateway.profile_tokens(), vec!["a1"]);
    assert_eq!(session.user().unwrap().email, "u@x.com");
}

#[tokio::test]
async fn hydrate_with_stale_access_token_refreshes() {
    let (session, gateway, store) =
        setup_with_store(MockGateway::new().with(|s| s.next_access.push_back("a2".into())), stored("old", "r1"));

    assert!(session.hydrate().await.unwrap());

    assert_eq!(gateway.refreshes(), 1);
    assert_eq!(gateway.profile_tokens(), vec!["old", "a2"]);
    assert!(session.user().is_some());
    assert_eq!(store.load().unwrap(), Some(stored("a2", "r1")));
}

#[tokio::test]
async fn hydrate_with_dead_refresh_token_ends_logged_out() {
    let (session, _gateway, store) = setup_with_store(MockGateway::new(), stored("old", "r-dead"));

    assert!(!session.hydrate().await.unwrap());
    assert!(!session.is_authenticated());
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn hydrate_keeps_session_when_server_unreachable() {
    let (session, _gateway, _store) = setup_with_store(
        MockGateway::new().with(|s| s.profile_failure = Some(SessionError::Transient("connection refused".into()))),
        stored("a1", "r1"),
    );

    assert!(session.hydrate().await.unwrap());
    let snap = session.snapshot();
    assert!(snap.is_authenticated());
    assert!(snap.user.is_none());
    assert!(snap.profile_error.is_some());
}

#[tokio::test]
async fn hydrate_discards_partial_record() {
    let (session, gateway, store) = setup_with_store(MockGateway::new(), stored("a1", ""));

    assert!(!session.hydrate().await.unwrap());
    assert!(gateway.profile_tokens().is_empty());
    assert_eq!(store.load().unwrap(), None);
}
