/// Password Hashing and Verification
///
/// bcrypt with a per-hash random salt, so hashing the same password twice
/// yields two different strings that both verify.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

/// bcrypt only reads the first 72 bytes of its input.
const MAX_PASSWORD_LENGTH: usize = 72;

pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl CredentialHasher {
    /// Cost is clamped to the range bcrypt accepts (4..=31).
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    /// Hash a plaintext password
    ///
    /// # Errors
    /// - `ValidationError` if the password is empty or longer than 72 bytes
    /// - `Internal` if bcrypt itself fails
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        if password.is_empty() {
            return Err(ValidationError::EmptyField("password".to_string()).into());
        }

        if password.len() > MAX_PASSWORD_LENGTH {
            return Err(
                ValidationError::TooLong("password".to_string(), MAX_PASSWORD_LENGTH).into(),
            );
        }

        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash.
    ///
    /// A malformed hash never verifies; it is logged and reported as `false`.
    pub fn verify(&self, password: &str, hashed: &str) -> bool {
        match verify(password, hashed) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be parsed");
                false
            }
        }
    }
}
