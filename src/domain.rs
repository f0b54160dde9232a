/// User records as the rest of the service sees them.
///
/// A `User` is a plain read-only snapshot of a stored row; every mutation goes
/// through the `UserDirectory`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Passenger,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Passenger => "passenger",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passenger" => Ok(Role::Passenger),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(ValidationError::InvalidRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub employee_id: Option<String>,
    pub is_active: bool,
}

/// Input to `UserDirectory::create`. Already validated and hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub employee_id: Option<String>,
}

/// Employee ids are stored uppercase and trimmed.
pub fn normalize_employee_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Passenger, Role::Staff, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_is_a_validation_error() {
        assert_eq!(
            "pilot".parse::<Role>(),
            Err(ValidationError::InvalidRole("pilot".to_string()))
        );
        assert!("Staff".parse::<Role>().is_err());
    }

    #[test]
    fn test_employee_id_normalization() {
        assert_eq!(normalize_employee_id("  emp-042 "), "EMP-042");
    }
}
