use crate::api::ApiError;
use crate::types::User;

use super::SessionHandle;

pub const LOGIN_ROUTE: &str = "/login";
pub const REGISTER_ROUTE: &str = "/register";
pub const TASKS_ROUTE: &str = "/tasks";
pub const BOARD_ROUTE: &str = "/tasks/board";

const PROTECTED_PREFIXES: [&str; 1] = [TASKS_ROUTE];

/// Client-side guard: is there an authenticated user right now.
pub struct ClientGuard<'a> {
    session: &'a SessionHandle,
}

impl<'a> ClientGuard<'a> {
    pub fn new(session: &'a SessionHandle) -> Self {
        Self { session }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.snapshot().is_authenticated()
    }

    pub fn require_user(&self) -> Result<User, ApiError> {
        let session = self.session.snapshot();
        match (session.token, session.user) {
            (Some(_), Some(user)) => Ok(user),
            _ => Err(ApiError::NotAuthenticated),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

/// Route guard: decides on the token alone, without contacting the server.
pub struct RouteGuard<'a> {
    session: &'a SessionHandle,
}

impl<'a> RouteGuard<'a> {
    pub fn new(session: &'a SessionHandle) -> Self {
        Self { session }
    }

    pub fn check(&self, path: &str) -> RouteDecision {
        let has_token = self.session.token().is_some_and(|token| !token.is_empty());

        let protected = PROTECTED_PREFIXES
            .iter()
            .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}/")));
        if protected && !has_token {
            return RouteDecision::Redirect(format!(
                "{LOGIN_ROUTE}?redirect={}",
                urlencoding::encode(path)
            ));
        }

        if (path == LOGIN_ROUTE || path == REGISTER_ROUTE) && has_token {
            return RouteDecision::Redirect(TASKS_ROUTE.to_string());
        }

        RouteDecision::Allow
    }
}
