//! Route model and navigation seam
//!
//! The client never drives a UI directly; it reports where the user should go
//! through the [`Navigator`] trait and asks it where the user currently is.
//! Hosts plug in their router; tests use [`MockNavigator`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Application routes the client cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Notes,
    Archive,
    Login,
    Register,
}

impl Route {
    /// Path as the host application's router spells it
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Notes => "/notes",
            Route::Archive => "/archive",
            Route::Login => "/login",
            Route::Register => "/register",
        }
    }

    /// Routes reachable without a session
    ///
    /// Auth failures on these routes must not trigger a redirect; the user is
    /// already on a screen where failing credentials are expected.
    pub fn is_unauthenticated_entry(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

/// Where the user is and how to move them
pub trait Navigator: Send + Sync {
    /// Route the user is currently on
    fn current_route(&self) -> Route;

    /// Send the user to `route`
    fn navigate(&self, route: Route);
}

/// In-memory [`Navigator`] for tests and headless use
#[derive(Debug)]
pub struct MockNavigator {
    current: Mutex<Route>,
    history: Mutex<Vec<Route>>,
    navigation_count: AtomicUsize,
}

impl MockNavigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: Mutex::new(start),
            history: Mutex::new(Vec::new()),
            navigation_count: AtomicUsize::new(0),
        }
    }

    /// Move the simulated user without recording a navigation
    pub fn set_route(&self, route: Route) {
        *self.current.lock().expect("navigator lock poisoned") = route;
    }

    /// Routes navigated to, oldest first
    pub fn navigations(&self) -> Vec<Route> {
        self.history.lock().expect("navigator lock poisoned").clone()
    }

    pub fn navigation_count(&self) -> usize {
        self.navigation_count.load(Ordering::SeqCst)
    }
}

impl Navigator for MockNavigator {
    fn current_route(&self) -> Route {
        *self.current.lock().expect("navigator lock poisoned")
    }

    fn navigate(&self, route: Route) {
        *self.current.lock().expect("navigator lock poisoned") = route;
        self.history
            .lock()
            .expect("navigator lock poisoned")
            .push(route);
        self.navigation_count.fetch_add(1, Ordering::SeqCst);
    }
}
