use colored::Colorize;
use medconsole_client::{Navigator, Route};
use parking_lot::Mutex;

/// Navigator for a one-shot terminal command: a redirect becomes a hint
/// on stderr.
pub struct TerminalNavigator {
    current: Mutex<Route>,
}

impl TerminalNavigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn current(&self) -> Route {
        self.current.lock().clone()
    }

    fn redirect(&self, route: Route) {
        if route == Route::Login {
            eprintln!(
                "{} Sign-in required. Run {} to continue.",
                "!".yellow(),
                "medconsole login".cyan()
            );
        }
        *self.current.lock() = route;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_updates_route() {
        let navigator = TerminalNavigator::new(Route::Hospitals);
        navigator.redirect(Route::Login);
        assert_eq!(navigator.current(), Route::Login);
    }
}
