//! Application route table.
//!
//! Dashboard pages sit behind the [`RouteGuard`]; the login and register
//! pages are for guests only and send signed-in users to the dashboard.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::Session;
use crate::guard::{GuardDecision, RouteGuard};
use crate::navigate::{Navigator, Routes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Page {
    Landing,
    Login,
    Register,
    Dashboard,
    Alerts,
    NetworkTraffic,
    Settings,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::Landing,
        Page::Login,
        Page::Register,
        Page::Dashboard,
        Page::Alerts,
        Page::NetworkTraffic,
        Page::Settings,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Page::Landing => "/",
            Page::Login => "/login",
            Page::Register => "/register",
            Page::Dashboard => "/dashboard",
            Page::Alerts => "/alerts",
            Page::NetworkTraffic => "/network-traffic",
            Page::Settings => "/settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Landing => "Home",
            Page::Login => "Sign In",
            Page::Register => "Create Account",
            Page::Dashboard => "Dashboard",
            Page::Alerts => "Alerts",
            Page::NetworkTraffic => "Network Traffic",
            Page::Settings => "Settings",
        }
    }

    /// Look up a page by path. Query strings, fragments and a trailing
    /// slash are ignored.
    pub fn from_path(path: &str) -> Option<Page> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Page::ALL.into_iter().find(|page| page.path() == path)
    }

    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Page::Dashboard | Page::Alerts | Page::NetworkTraffic | Page::Settings
        )
    }

    pub fn is_guest_only(&self) -> bool {
        matches!(self, Page::Login | Page::Register)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Show {
        page: Page,
        session: Option<Session>,
    },
    Redirect(String),
    NotFound(String),
}

pub struct Router {
    guard: RouteGuard,
    navigator: Arc<dyn Navigator>,
    routes: Routes,
}

impl Router {
    pub fn new(guard: RouteGuard, navigator: Arc<dyn Navigator>, routes: Routes) -> Self {
        Self {
            guard,
            navigator,
            routes,
        }
    }

    /// Decide what to show for `path`. Redirects are also sent to the
    /// navigator.
    pub fn resolve(&mut self, path: &str) -> Resolution {
        let Some(page) = Page::from_path(path) else {
            return Resolution::NotFound(path.to_string());
        };

        if page.is_protected() {
            return match self.guard.guard(|session| session.clone()) {
                GuardDecision::Render(session) => Resolution::Show {
                    page,
                    session: Some(session),
                },
                GuardDecision::Redirect(target) => Resolution::Redirect(target),
            };
        }

        let session = self.guard.session();
        if page.is_guest_only() && session.is_some() {
            let target = self.routes.authenticated.clone();
            self.navigator.go_to(&target);
            return Resolution::Redirect(target);
        }

        Resolution::Show { page, session }
    }
}
