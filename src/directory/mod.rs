/// User Directory
///
/// Owns user records. Every write runs in its own scoped transaction inside
/// the implementation, and a uniqueness violation detected at write time is
/// reported as a conflict even if the caller's pre-check passed.

mod memory;
mod postgres;

pub use memory::InMemoryUserDirectory;
pub use postgres::PgUserDirectory;

use async_trait::async_trait;

use crate::domain::{NewUser, User};
use crate::error::AppError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// `employee_id` is compared after normalization to uppercase.
    async fn find_by_employee_id(&self, employee_id: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// # Errors
    /// Conflict when the email, or a staff employee id, is already taken.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// # Errors
    /// NotFound when the user no longer exists.
    async fn update_password(&self, user: &User, new_hash: &str) -> Result<(), AppError>;
}
