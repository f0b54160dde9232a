/// JWT claim sets
///
/// Two token families share one signing key:
/// - session tokens carry the user's identity and role, no type marker
/// - reset tokens carry only the subject and `type = "reset"`
///
/// A reset token cannot be read as a session token (it lacks `role` and
/// `user_id`), and a session token cannot be read as a reset token (it lacks
/// the `type` marker).

use serde::{Deserialize, Serialize};

use crate::domain::{Role, User};
use crate::error::{AppError, AuthError};

pub const RESET_TOKEN_TYPE: &str = "reset";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Session,
    Reset,
}

/// Claims of a session (access) token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionClaims {
    /// Subject: the user's email
    pub sub: String,
    pub role: Role,
    /// Empty when the user has no display name
    pub full_name: String,
    /// Empty unless the user is staff
    pub employee_id: String,
    pub user_id: i64,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl SessionClaims {
    pub fn for_user(user: &User, issued_at: i64, ttl_seconds: i64, issuer: &str) -> Self {
        Self {
            sub: user.email.clone(),
            role: user.role,
            full_name: user.full_name.clone().unwrap_or_default(),
            employee_id: user.employee_id.clone().unwrap_or_default(),
            user_id: user.id,
            exp: issued_at + ttl_seconds,
            iat: issued_at,
            iss: issuer.to_string(),
        }
    }

    /// Role gate for protected routes.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole.into())
        }
    }
}

/// Claims of a password-reset token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResetClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(rename = "type", default)]
    pub token_type: Option<String>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl ResetClaims {
    pub fn new(email: &str, issued_at: i64, ttl_seconds: i64, issuer: &str) -> Self {
        Self {
            sub: Some(email.to_string()),
            token_type: Some(RESET_TOKEN_TYPE.to_string()),
            exp: issued_at + ttl_seconds,
            iat: issued_at,
            iss: issuer.to_string(),
        }
    }

    /// The subject, provided the claims really describe a reset token.
    pub fn reset_subject(&self) -> Option<&str> {
        if self.token_type.as_deref() != Some(RESET_TOKEN_TYPE) {
            return None;
        }
        self.sub.as_deref().filter(|sub| !sub.is_empty())
    }
}
