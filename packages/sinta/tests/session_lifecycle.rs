mod common;

use common::{LOGIN_ERROR, PASSWORD, SESSION_COOKIE, StubPortal, USERNAME, persisted_state};
use sinta::{
    Credentials, Error, ErrorKind, PortalConfig, SessionManager, SessionPhase,
    session::{PortalSession, SessionState, validate},
};

fn credentials() -> Option<Credentials> {
    Some(Credentials::new(USERNAME, PASSWORD))
}

fn saved_cookie(path: &std::path::Path) -> Option<String> {
    SessionState::load(path)
        .ok()
        .and_then(|state| state.cookies.get(SESSION_COOKIE).cloned())
}

#[tokio::test]
async fn valid_persisted_session_is_reused_without_login() {
    let portal = StubPortal::spawn(Some("tok-1"));
    portal.accept_session("persisted-1");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let state = persisted_state("persisted-1");
    state.save(&path).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let mut manager = SessionManager::new(portal.config(&path), credentials());
    let session = manager.initialize().await.unwrap();

    assert_eq!(manager.phase(), SessionPhase::Valid);
    assert!(portal.login_posts().is_empty());
    let urls: Vec<_> = portal.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, ["/authors"]);
    assert_eq!(session.state().cookies, state.cookies);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn force_refresh_logs_in_despite_valid_session() {
    let portal = StubPortal::spawn(Some("tok-1"));
    portal.accept_session("persisted-1");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    persisted_state("persisted-1").save(&path).unwrap();

    let mut manager = SessionManager::new(portal.config(&path), credentials()).force_refresh(true);
    let session = manager.initialize().await.unwrap();

    assert_eq!(portal.login_posts().len(), 1);
    assert_eq!(portal.requested("/authors"), 1, "login redirect only, no probe");
    assert_eq!(saved_cookie(&path).as_deref(), Some("issued-1"));
    assert_eq!(
        session.state().cookies.get(SESSION_COOKIE).map(String::as_str),
        Some("issued-1")
    );
}

#[tokio::test]
async fn force_refresh_removes_old_file_even_when_login_fails() {
    let portal = StubPortal::spawn(None);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    persisted_state("persisted-1").save(&path).unwrap();

    let mut manager = SessionManager::new(
        portal.config(&path),
        Some(Credentials::new(USERNAME, "wrong")),
    )
    .force_refresh(true);
    let err = manager.initialize().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(!path.exists());
}

#[tokio::test]
async fn expired_session_triggers_exactly_one_login() {
    let portal = StubPortal::spawn(Some("tok-1"));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".config/session_data.json");
    persisted_state("stale").save(&path).unwrap();

    let mut manager = SessionManager::new(portal.config(&path), credentials());
    manager.initialize().await.unwrap();

    let posts = portal.login_posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].body.contains("_token=tok-1"));
    assert_eq!(posts[0].csrf_header.as_deref(), Some("tok-1"));
    assert_eq!(saved_cookie(&path).as_deref(), Some("issued-1"));
}

#[tokio::test]
async fn missing_credentials_fail_without_network() {
    let portal = StubPortal::spawn(None);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut manager = SessionManager::new(portal.config(&path), None);
    let err = manager.initialize().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(manager.phase(), SessionPhase::Failed);
    assert!(portal.requests().is_empty());
}

#[tokio::test]
async fn missing_credentials_fail_even_with_saved_session() {
    let portal = StubPortal::spawn(None);
    portal.accept_session("good");
    let dir = tempfile::tempdir().unwrap();

    for saved in ["stale", "good"] {
        let path = dir.path().join(format!("{saved}.json"));
        persisted_state(saved).save(&path).unwrap();

        let mut manager = SessionManager::new(portal.config(&path), None);
        let err = manager.initialize().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration, "saved session `{saved}`");
        assert_eq!(manager.phase(), SessionPhase::Failed);
        assert!(path.exists());
    }
    assert!(portal.requests().is_empty());
}

#[tokio::test]
async fn rejected_login_surfaces_server_banner() {
    let portal = StubPortal::spawn(Some("tok-1"));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut manager = SessionManager::new(
        portal.config(&path),
        Some(Credentials::new(USERNAME, "wrong")),
    );
    let err = manager.initialize().await.unwrap_err();

    match err {
        Error::Authentication { server_message, .. } => {
            assert_eq!(server_message.as_deref(), Some(LOGIN_ERROR));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(manager.phase(), SessionPhase::Failed);
    assert_eq!(portal.login_posts().len(), 1);
    assert!(!path.exists());
}

#[tokio::test]
async fn unremovable_session_path_keeps_login_error() {
    let portal = StubPortal::spawn(None);
    let dir = tempfile::tempdir().unwrap();
    // A directory in place of the session file cannot be removed with remove_file.
    let path = dir.path().join("session.json");
    std::fs::create_dir(&path).unwrap();

    let mut manager = SessionManager::new(
        portal.config(&path),
        Some(Credentials::new(USERNAME, "wrong")),
    );
    let err = manager.initialize().await.unwrap_err();

    match err {
        Error::Authentication { server_message, .. } => {
            assert_eq!(server_message.as_deref(), Some(LOGIN_ERROR));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn login_page_without_token_still_submits() {
    let portal = StubPortal::spawn(None);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut manager = SessionManager::new(portal.config(&path), credentials());
    manager.initialize().await.unwrap();

    let posts = portal.login_posts();
    assert_eq!(posts.len(), 1);
    assert!(!posts[0].body.contains("_token"));
    assert_eq!(posts[0].csrf_header, None);
}

#[tokio::test]
async fn corrupted_session_file_falls_back_to_login() {
    let portal = StubPortal::spawn(None);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut manager = SessionManager::new(portal.config(&path), credentials());
    manager.initialize().await.unwrap();

    assert_eq!(portal.login_posts().len(), 1);
    assert_eq!(saved_cookie(&path).as_deref(), Some("issued-1"));
}

#[tokio::test]
async fn validator_classifies_probe_responses() {
    let portal = StubPortal::spawn(None);
    portal.accept_session("good");
    let dir = tempfile::tempdir().unwrap();
    let config = portal.config(&dir.path().join("unused.json"));

    let good = PortalSession::restore(&config, &persisted_state("good")).unwrap();
    assert!(validate(&good, &config).await);

    let bad = PortalSession::restore(&config, &persisted_state("bad")).unwrap();
    assert!(!validate(&bad, &config).await);
}

#[tokio::test]
async fn validator_treats_connection_errors_as_invalid() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = PortalConfig::with_base_url(&format!("http://127.0.0.1:{port}/")).unwrap();
    let session = PortalSession::restore(&config, &persisted_state("any")).unwrap();
    assert!(!validate(&session, &config).await);
}
