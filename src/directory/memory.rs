use async_trait::async_trait;
use std::sync::Mutex;

use crate::directory::UserDirectory;
use crate::domain::{normalize_employee_id, NewUser, User};
use crate::error::AppError;

#[derive(Default)]
struct Table {
    rows: Vec<User>,
    next_id: i64,
}

/// Process-local directory with the same uniqueness rules as the `users`
/// table. Used by tests and by `storage: memory` local runs.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    table: Mutex<Table>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the active flag of an existing user. Deactivation has no public
    /// endpoint; this exists for seeding and tests.
    pub fn set_active(&self, email: &str, active: bool) -> Result<(), AppError> {
        let mut table = self.lock()?;
        let user = table
            .rows
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.is_active = active;
        Ok(())
    }

    /// Insert a row as-is, bypassing registration rules (e.g. admin accounts).
    pub fn seed(&self, new_user: NewUser, active: bool) -> Result<User, AppError> {
        let mut table = self.lock()?;
        let user = table.insert(new_user)?;
        if !active {
            if let Some(row) = table.rows.iter_mut().find(|u| u.id == user.id) {
                row.is_active = false;
            }
        }
        Ok(User {
            is_active: active,
            ..user
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Table>, AppError> {
        self.table
            .lock()
            .map_err(|_| AppError::Internal("User table lock poisoned".to_string()))
    }
}

impl Table {
    fn insert(&mut self, new_user: NewUser) -> Result<User, AppError> {
        if self.rows.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict("Email already registered"));
        }

        let employee_id = new_user.employee_id.as_deref().map(normalize_employee_id);
        if let Some(employee_id) = &employee_id {
            if self
                .rows
                .iter()
                .any(|u| u.employee_id.as_deref() == Some(employee_id.as_str()))
            {
                return Err(AppError::conflict("This Employee ID is already registered"));
            }
        }

        self.next_id += 1;
        let user = User {
            id: self.next_id,
            email: new_user.email,
            hashed_password: new_user.hashed_password,
            full_name: new_user.full_name,
            role: new_user.role,
            employee_id,
            is_active: true,
        };
        self.rows.push(user.clone());

        Ok(user)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_employee_id(&self, employee_id: &str) -> Result<Option<User>, AppError> {
        let employee_id = normalize_employee_id(employee_id);
        Ok(self
            .lock()?
            .rows
            .iter()
            .find(|u| u.employee_id.as_deref() == Some(employee_id.as_str()))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        self.lock()?.insert(new_user)
    }

    async fn update_password(&self, user: &User, new_hash: &str) -> Result<(), AppError> {
        let mut table = self.lock()?;
        let row = table
            .rows
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        row.hashed_password = new_hash.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn new_user(email: &str, role: Role, employee_id: Option<&str>) -> NewUser {
        NewUser {
            email: email.to_string(),
            hashed_password: "hash".to_string(),
            full_name: None,
            role,
            employee_id: employee_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let directory = InMemoryUserDirectory::new();
        let created = directory
            .create(new_user("a@x.com", Role::Passenger, None))
            .await
            .unwrap();

        assert_eq!(created.id, 1);
        assert!(created.is_active);
        assert_eq!(
            directory.find_by_email("a@x.com").await.unwrap(),
            Some(created.clone())
        );
        assert_eq!(directory.find_by_id(1).await.unwrap(), Some(created));
        assert_eq!(directory.find_by_email("A@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let directory = InMemoryUserDirectory::new();
        directory
            .create(new_user("a@x.com", Role::Passenger, None))
            .await
            .unwrap();

        let err = directory
            .create(new_user("a@x.com", Role::Passenger, None))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_employee_id_is_normalized_and_unique() {
        let directory = InMemoryUserDirectory::new();
        let staff = directory
            .create(new_user("crew@x.com", Role::Staff, Some("emp-1")))
            .await
            .unwrap();
        assert_eq!(staff.employee_id.as_deref(), Some("EMP-1"));

        assert!(directory
            .find_by_employee_id("Emp-1")
            .await
            .unwrap()
            .is_some());

        let err = directory
            .create(new_user("other@x.com", Role::Staff, Some("EMP-1")))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "This Employee ID is already registered");
    }

    #[tokio::test]
    async fn test_update_password() {
        let directory = InMemoryUserDirectory::new();
        let user = directory
            .create(new_user("a@x.com", Role::Passenger, None))
            .await
            .unwrap();

        directory.update_password(&user, "new-hash").await.unwrap();
        let stored = directory.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.hashed_password, "new-hash");
    }

    #[tokio::test]
    async fn test_update_password_for_missing_user() {
        let directory = InMemoryUserDirectory::new();
        let ghost = User {
            id: 99,
            email: "ghost@x.com".to_string(),
            hashed_password: "hash".to_string(),
            full_name: None,
            role: Role::Passenger,
            employee_id: None,
            is_active: true,
        };

        assert!(directory.update_password(&ghost, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_seed_inactive_and_toggle() {
        let directory = InMemoryUserDirectory::new();
        let user = directory
            .seed(new_user("a@x.com", Role::Passenger, None), false)
            .unwrap();
        assert!(!user.is_active);

        directory.set_active("a@x.com", true).unwrap();
        let stored = directory.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(stored.is_active);
    }
}
