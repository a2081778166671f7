//! Routes of the console and the seam the gateway uses to redirect.

use std::fmt;

use medconsole_core::HospitalId;
use parking_lot::Mutex;

use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Hospitals,
    HospitalDetails(HospitalId),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::Hospitals => "/hospital".to_string(),
            Self::HospitalDetails(id) => format!("/hospital/{id}"),
        }
    }

    /// Routes reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub trait Navigator: Send + Sync {
    fn current(&self) -> Route;

    fn redirect(&self, route: Route);
}

/// Keeps the visited routes in memory.
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl MemoryNavigator {
    pub fn new(start: Route) -> Self {
        Self {
            history: Mutex::new(vec![start]),
        }
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(Route::Hospitals)
    }
}

impl Navigator for MemoryNavigator {
    fn current(&self) -> Route {
        self.history
            .lock()
            .last()
            .cloned()
            .unwrap_or(Route::Hospitals)
    }

    fn redirect(&self, route: Route) {
        self.history.lock().push(route);
    }
}

/// Sends the user to the login route when a protected route is opened
/// without a session. Returns whether the route may be shown.
pub fn require_session(session: &SessionStore, navigator: &dyn Navigator, route: &Route) -> bool {
    if route.is_public() || session.is_authenticated() {
        return true;
    }
    if navigator.current() != Route::Login {
        navigator.redirect(Route::Login);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let id = HospitalId::parse("12").unwrap();
        assert_eq!(Route::Login.path(), "/login");
        assert_eq!(Route::Hospitals.path(), "/hospital");
        assert_eq!(Route::HospitalDetails(id).to_string(), "/hospital/12");
    }

    #[test]
    fn test_guard_redirects_without_session() {
        let session = SessionStore::in_memory();
        let navigator = MemoryNavigator::default();

        assert!(!require_session(&session, &navigator, &Route::Hospitals));
        assert_eq!(navigator.current(), Route::Login);
        assert!(require_session(&session, &navigator, &Route::Register));

        session.set_token(Some("tok"));
        assert!(require_session(&session, &navigator, &Route::Hospitals));
        assert_eq!(navigator.history().len(), 2);
    }
}
