//! Route protection for the view layer.
//!
//! `AccessGate` decides whether a route may render for the current session and
//! `Navigator` keeps the current route valid as the session changes.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use super::session::{SessionManager, SessionState, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Home,
    Tasks,
    Habits,
    Schedule,
    Journal,
    Settings,
}

impl Route {
    /// Parse a path. Unknown paths fall through to `Home`.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/task-management" => Route::Tasks,
            "/habits" => Route::Habits,
            "/schedule" => Route::Schedule,
            "/journal" => Route::Journal,
            "/settings" => Route::Settings,
            _ => Route::Home,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Home => "/",
            Route::Tasks => "/task-management",
            Route::Habits => "/habits",
            Route::Schedule => "/schedule",
            Route::Journal => "/journal",
            Route::Settings => "/settings",
        }
    }

    /// Everything except the login and registration pages needs a session
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Where a route ends up for a given session state
fn resolve_for(route: Route, authenticated: bool) -> Route {
    if route.is_protected() && !authenticated {
        Route::Login
    } else if !route.is_protected() && authenticated {
        Route::Home
    } else {
        route
    }
}

#[derive(Clone)]
pub struct AccessGate {
    session: Arc<SessionManager>,
}

impl AccessGate {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub fn can_enter(&self) -> bool {
        self.session.is_authenticated()
    }

    /// The route that should actually render when `route` is requested
    pub fn resolve(&self, route: Route) -> Route {
        resolve_for(route, self.can_enter())
    }
}

/// Tracks the current route and redirects when the session changes.
pub struct Navigator {
    gate: AccessGate,
    current: Arc<Mutex<Route>>,
    subscription: Option<Subscription>,
}

impl Navigator {
    pub fn new(session: Arc<SessionManager>) -> Self {
        let gate = AccessGate::new(Arc::clone(&session));
        let current = Arc::new(Mutex::new(gate.resolve(Route::Home)));

        let tracked = Arc::clone(&current);
        let subscription = session.subscribe(move |state: &SessionState| {
            let mut route = tracked.lock().unwrap_or_else(PoisonError::into_inner);
            let next = resolve_for(*route, state.is_authenticated());
            if next != *route {
                info!(from = %*route, to = %next, "Redirecting after session change");
                *route = next;
            }
        });

        Self {
            gate,
            current,
            subscription: Some(subscription),
        }
    }

    pub fn current(&self) -> Route {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request a route; returns the route that was actually entered
    pub fn navigate(&self, requested: Route) -> Route {
        let resolved = self.gate.resolve(requested);
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = resolved;
        resolved
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }
}

impl Drop for Navigator {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryTokenStore;

    fn session_with(token: Option<&str>) -> Arc<SessionManager> {
        let store = match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        };
        let session = Arc::new(SessionManager::new(store));
        session.initialize();
        session
    }

    #[test]
    fn test_route_from_path() {
        assert_eq!(Route::from_path("/login"), Route::Login);
        assert_eq!(Route::from_path("/register/"), Route::Register);
        assert_eq!(Route::from_path("/task-management"), Route::Tasks);
        assert_eq!(Route::from_path("/schedule"), Route::Schedule);
        assert_eq!(Route::from_path("/"), Route::Home);
        assert_eq!(Route::from_path("/no/such/page"), Route::Home);
    }

    #[test]
    fn test_route_path_round_trips() {
        for route in [
            Route::Login,
            Route::Register,
            Route::Home,
            Route::Tasks,
            Route::Habits,
            Route::Schedule,
            Route::Journal,
            Route::Settings,
        ] {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }

    #[test]
    fn test_fresh_start_cannot_enter() {
        let gate = AccessGate::new(session_with(None));
        assert!(!gate.can_enter());
        assert_eq!(gate.resolve(Route::Journal), Route::Login);
        assert_eq!(gate.resolve(Route::Register), Route::Register);
    }

    #[test]
    fn test_logged_in_leaves_login_pages() {
        let gate = AccessGate::new(session_with(Some("abc")));
        assert!(gate.can_enter());
        assert_eq!(gate.resolve(Route::Login), Route::Home);
        assert_eq!(gate.resolve(Route::Register), Route::Home);
        assert_eq!(gate.resolve(Route::Habits), Route::Habits);
    }

    #[test]
    fn test_navigator_starts_at_login_when_logged_out() {
        let nav = Navigator::new(session_with(None));
        assert_eq!(nav.current(), Route::Login);
        assert_eq!(nav.navigate(Route::from_path("/settings")), Route::Login);
    }

    #[test]
    fn test_navigator_redirects_on_logout() {
        let session = session_with(Some("abc"));
        let nav = Navigator::new(Arc::clone(&session));
        assert_eq!(nav.navigate(Route::Tasks), Route::Tasks);

        session.logout();
        assert_eq!(nav.current(), Route::Login);
    }

    #[test]
    fn test_navigator_leaves_login_on_login() {
        let session = session_with(None);
        let nav = Navigator::new(Arc::clone(&session));
        assert_eq!(nav.current(), Route::Login);

        session.set_credential(Some("abc123"));
        assert_eq!(nav.current(), Route::Home);
    }

    #[test]
    fn test_navigator_unsubscribes_on_drop() {
        let session = session_with(None);
        let nav = Navigator::new(Arc::clone(&session));
        assert_eq!(session.listener_count(), 1);
        drop(nav);
        assert_eq!(session.listener_count(), 0);
    }
}
