//! App-wide context seeded per request.

use folio_core::Cookies;
use serde::{Deserialize, Serialize};

/// Cookie whose non-empty value marks the visitor as signed in.
pub const AUTH_COOKIE: &str = "token";

const INITIAL_CONTEXT: &str = "this is inital context";
const SSR_USER_NAME: &str = "SSR User";

/// Signed-in user summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub is_logged_in: bool,
    pub name: Option<String>,
}

/// Whether the auth cookie is present with a non-empty value.
pub fn has_auth_token(cookies: &Cookies) -> bool {
    cookies.get(AUTH_COOKIE).is_some_and(|token| !token.is_empty())
}

/// Global state slice, serialized as `window.__INITIAL_STATE__`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    pub context: String,
    pub user: Option<User>,
}

impl GlobalState {
    /// Fresh state for one request. `user` is populated iff the auth cookie has a value.
    pub fn seed(cookies: &Cookies) -> Self {
        let user = has_auth_token(cookies).then(|| User {
            is_logged_in: true,
            name: Some(SSR_USER_NAME.to_string()),
        });

        Self {
            context: INITIAL_CONTEXT.to_string(),
            user,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_logged_in)
    }

    /// Apply an action, returning the next state.
    pub fn reduce(self, action: GlobalAction) -> Self {
        match action {
            GlobalAction::SetContext(context) => Self { context, ..self },
            GlobalAction::Login { name } => Self {
                user: Some(User {
                    is_logged_in: true,
                    name: Some(name),
                }),
                ..self
            },
            GlobalAction::Logout => Self { user: None, ..self },
        }
    }
}

/// Client-side mutations of [`GlobalState`].
///
/// Serialized as `{"type": "SET_CONTEXT", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlobalAction {
    SetContext(String),
    Login { name: String },
    Logout,
}
