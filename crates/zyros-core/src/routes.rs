//! Route table and gate decisions
//!
//! Protected routes render only for an authenticated session and redirect to
//! [`LOGIN_PATH`] otherwise. While the session is still loading no decision
//! is made.

use crate::auth::SessionState;
use std::fmt;
use tokio::sync::watch;

/// Where unauthenticated users are sent
pub const LOGIN_PATH: &str = "/login";

/// Every route the client knows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/`
    Home,
    /// `/login`
    Login,
    /// `/register`
    Register,
    /// `/posts/:id`
    PostDetails { id: u64 },
    /// `/post`, the short post form
    NewPost,
    /// `/article`, the article editor
    NewArticle,
    /// `/users/:username`
    UserProfile { username: String },
}

impl Route {
    /// Match a path against the route table
    ///
    /// Query strings and fragments are ignored, as is a trailing slash.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let mut segments = path.split('/').skip(1);

        let route = match (segments.next(), segments.next(), segments.next()) {
            (None, _, _) | (Some(""), None, _) => Self::Home,
            (Some("login"), None, _) => Self::Login,
            (Some("register"), None, _) => Self::Register,
            (Some("post"), None, _) => Self::NewPost,
            (Some("article"), None, _) => Self::NewArticle,
            (Some("posts"), Some(id), None) => Self::PostDetails {
                id: id.parse().ok()?,
            },
            (Some("users"), Some(username), None) if !username.is_empty() => Self::UserProfile {
                username: username.to_string(),
            },
            _ => return None,
        };
        Some(route)
    }

    /// Canonical path of the route
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login => LOGIN_PATH.to_string(),
            Self::Register => "/register".to_string(),
            Self::PostDetails { id } => format!("/posts/{}", id),
            Self::NewPost => "/post".to_string(),
            Self::NewArticle => "/article".to_string(),
            Self::UserProfile { username } => format!("/users/{}", username),
        }
    }

    /// Whether the route needs an identity
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Self::NewPost | Self::NewArticle | Self::UserProfile { .. }
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of entering a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Session still loading
    Wait,
    Render,
    Redirect { to: String },
}

/// Decide whether a route may render for the given session
pub fn gate(route: &Route, state: &SessionState) -> GateDecision {
    if state.is_loading() {
        return GateDecision::Wait;
    }
    if route.is_protected() && !state.is_authenticated() {
        return GateDecision::Redirect {
            to: LOGIN_PATH.to_string(),
        };
    }
    GateDecision::Render
}

/// Wait for the session to settle, then decide
///
/// Returns [`GateDecision::Wait`] only if the session store went away
/// before it finished loading.
pub async fn await_decision(
    route: &Route,
    states: &mut watch::Receiver<SessionState>,
) -> GateDecision {
    match states.wait_for(|state| !state.is_loading()).await {
        Ok(state) => gate(route, &state),
        Err(_) => GateDecision::Wait,
    }
}
