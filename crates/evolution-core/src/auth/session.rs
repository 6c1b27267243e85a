use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use tracing::{debug, info, warn};

use super::store::TokenStore;

/// Opaque bearer token issued by the backend at login. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token, rejecting the empty string
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }
}

// Tokens must not end up in logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} chars>)", self.0.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn(Credential),
}

impl SessionState {
    fn from_token(token: Option<&str>) -> Self {
        match token.and_then(Credential::new) {
            Some(credential) => SessionState::LoggedIn(credential),
            None => SessionState::LoggedOut,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::LoggedIn(_))
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            SessionState::LoggedIn(credential) => Some(credential),
            SessionState::LoggedOut => None,
        }
    }
}

type Listener = Arc<dyn Fn(&SessionState) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
}

/// Handle returned by [`SessionManager::subscribe`].
///
/// Dropping the handle keeps the listener registered; call [`Subscription::unsubscribe`]
/// to remove it.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .remove(&self.id);
            debug!(listener = self.id, "Session listener removed");
        }
    }
}

/// Single authoritative holder of the session credential.
///
/// Owns the in-memory state, is the only writer of the persisted mirror, and
/// notifies subscribers synchronously on every state change. Share it through
/// `Arc<SessionManager>`.
///
/// Listeners must not call back into [`SessionManager::set_credential`]; reads are fine.
pub struct SessionManager {
    store: Box<dyn TokenStore>,
    state: RwLock<SessionState>,
    listeners: Arc<Mutex<Listeners>>,
    // Serializes transitions so listeners see them in order
    transition: Mutex<()>,
}

impl SessionManager {
    /// Create a manager in the logged-out state; call [`initialize`](Self::initialize)
    /// before anything reads the session.
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            state: RwLock::new(SessionState::LoggedOut),
            listeners: Arc::new(Mutex::new(Listeners::default())),
            transition: Mutex::new(()),
        }
    }

    /// Seed the in-memory state from the persisted mirror.
    ///
    /// An unreadable mirror counts as logged out. Subscribers are not notified.
    pub fn initialize(&self) -> SessionState {
        let _guard = self.transition.lock().unwrap_or_else(PoisonError::into_inner);

        let persisted = match self.store.read() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session, starting logged out");
                None
            }
        };

        let state = SessionState::from_token(persisted.as_deref());
        debug!(authenticated = state.is_authenticated(), "Session initialized");
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state.clone();
        state
    }

    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .credential()
            .cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated()
    }

    /// The only way to change the session.
    ///
    /// A non-empty token logs in (or replaces the current token); `None` or an empty
    /// string logs out. The mirror is updated on every call, best effort. Subscribers
    /// have been notified by the time this returns.
    pub fn set_credential(&self, token: Option<&str>) {
        let _guard = self.transition.lock().unwrap_or_else(PoisonError::into_inner);

        let next = SessionState::from_token(token);
        let changed = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let changed = *state != next;
            *state = next.clone();
            changed
        };

        let persisted = match next.credential() {
            Some(credential) => self.store.write(credential.as_str()),
            None => self.store.remove(),
        };
        if let Err(e) = persisted {
            warn!(error = %e, "Failed to update persisted session, keeping in-memory state");
        }

        if !changed {
            debug!("Session unchanged, listeners not notified");
            return;
        }

        if next.is_authenticated() {
            info!("Session started");
        } else {
            info!("Session ended");
        }

        // Snapshot so listeners may subscribe or unsubscribe while being notified
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .values()
            .cloned()
            .collect();

        for listener in listeners {
            listener(&next);
        }
    }

    pub fn logout(&self) {
        self.set_credential(None);
    }

    /// Register a listener invoked with the new state after every change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.insert(id, Arc::new(listener));
        debug!(listener = id, "Session listener added");

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

// ============================================================================
// Tests
// ============================================================================
