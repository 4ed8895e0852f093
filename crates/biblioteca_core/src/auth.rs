//! Caller identity passed explicitly into every use-case operation.
//!
//! # Invariants
//! - Only `AuthContext::User` may read or mutate library records.
//! - Usernames are non-blank after trim.

use std::fmt::{Display, Formatter};

/// Who is invoking a core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// No logged-in user.
    Anonymous,
    /// Logged-in staff member.
    User { username: String },
}

impl AuthContext {
    /// Builds a user context, or `Anonymous` for blank names.
    pub fn user(username: impl AsRef<str>) -> Self {
        let trimmed = username.as_ref().trim();
        if trimmed.is_empty() {
            Self::Anonymous
        } else {
            Self::User {
                username: trimmed.to_string(),
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    /// Returns the username of an authenticated caller.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User { username } => Some(username.as_str()),
        }
    }
}

impl Display for AuthContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::User { username } => write!(f, "{username}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AuthContext;

    #[test]
    fn blank_username_is_anonymous() {
        assert_eq!(AuthContext::user("   "), AuthContext::Anonymous);
        assert!(!AuthContext::Anonymous.is_authenticated());
    }

    #[test]
    fn user_is_trimmed() {
        let ctx = AuthContext::user(" librarian ");
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.username(), Some("librarian"));
    }
}
