//! Session guard for the admin surface.
//!
//! Runs once per page activation. A missing session, or a session whose user has no
//! email or no confirmation timestamp, ends the page view with a redirect to the login
//! surface. There is no retry and nothing else is shown to the visitor.

use crate::models::SessionUser;

/// Where unauthenticated or unconfirmed visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// GuardDecision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session belongs to a confirmed user.
    Admit(SessionUser),
    /// The view must be replaced by a navigation to this path.
    Redirect(&'static str),
}

impl GuardDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GuardDecision::Admit(_))
    }
}

/// Decides whether the current session may see the admin surface.
pub fn guard(session: Option<SessionUser>) -> GuardDecision {
    match session {
        Some(user) if user.is_confirmed() => GuardDecision::Admit(user),
        Some(user) => {
            tracing::debug!(email = ?user.email, "session user is not confirmed");
            GuardDecision::Redirect(LOGIN_PATH)
        }
        None => GuardDecision::Redirect(LOGIN_PATH),
    }
}
