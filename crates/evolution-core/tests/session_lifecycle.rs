use std::sync::{Arc, Mutex};

use evolution_core::auth::{FileTokenStore, MemoryTokenStore, TokenStore};
use evolution_core::{AccessGate, Navigator, Route, SessionManager, SessionState};

#[test]
fn test_fresh_start_without_stored_token() {
    let dir = tempfile::tempdir().unwrap();
    let session = Arc::new(SessionManager::new(FileTokenStore::in_dir(dir.path())));

    assert_eq!(session.initialize(), SessionState::LoggedOut);
    assert!(!AccessGate::new(Arc::clone(&session)).can_enter());
}

#[test]
fn test_reload_continuity_over_file_store() {
    let dir = tempfile::tempdir().unwrap();

    {
        let session = SessionManager::new(FileTokenStore::in_dir(dir.path()));
        session.initialize();
        session.set_credential(Some("xyz"));
    }

    let restarted = SessionManager::new(FileTokenStore::in_dir(dir.path()));
    let state = restarted.initialize();
    assert!(state.is_authenticated());
    assert_eq!(restarted.credential().unwrap().as_str(), "xyz");
}

#[test]
fn test_logout_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::in_dir(dir.path());
    store.write("abc123").unwrap();

    let session = SessionManager::new(FileTokenStore::in_dir(dir.path()));
    session.initialize();
    session.logout();
    assert_eq!(store.read().unwrap(), None);

    let restarted = SessionManager::new(FileTokenStore::in_dir(dir.path()));
    assert_eq!(restarted.initialize(), SessionState::LoggedOut);
}

#[test]
fn test_in_memory_state_wins_until_reload() {
    let store = MemoryTokenStore::new();
    let session = SessionManager::new(store.clone());
    session.initialize();
    session.set_credential(Some("mine"));

    // Another process rewrites the shared mirror
    store.write("theirs").unwrap();
    assert_eq!(session.credential().unwrap().as_str(), "mine");

    assert_eq!(session.initialize().credential().unwrap().as_str(), "theirs");
}

#[test]
fn test_login_logout_cycle_with_navigation() {
    let session = Arc::new(SessionManager::new(MemoryTokenStore::new()));
    session.initialize();
    let nav = Navigator::new(Arc::clone(&session));

    let transitions = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&transitions);
    let sub = session.subscribe(move |_| *counter.lock().unwrap() += 1);

    assert_eq!(nav.navigate(Route::from_path("/journal")), Route::Login);

    session.set_credential(Some("abc123"));
    assert_eq!(nav.current(), Route::Home);
    assert_eq!(nav.navigate(Route::from_path("/journal")), Route::Journal);

    session.logout();
    assert_eq!(nav.current(), Route::Login);

    session.set_credential(Some("def456"));
    assert_eq!(nav.current(), Route::Home);

    sub.unsubscribe();
    assert_eq!(*transitions.lock().unwrap(), 3);
}
