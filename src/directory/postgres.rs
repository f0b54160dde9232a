use async_trait::async_trait;
use sqlx::PgPool;

use crate::directory::UserDirectory;
use crate::domain::{normalize_employee_id, NewUser, Role, User};
use crate::error::AppError;

const USER_COLUMNS: &str = "id, email, hashed_password, full_name, role, employee_id, is_active";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    hashed_password: String,
    full_name: Option<String>,
    role: String,
    employee_id: Option<String>,
    is_active: bool,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(|_| {
            AppError::Internal(format!("User {} has unknown role '{}'", row.id, row.role))
        })?;

        Ok(User {
            id: row.id,
            email: row.email,
            hashed_password: row.hashed_password,
            full_name: row.full_name,
            role,
            employee_id: row.employee_id,
            is_active: row.is_active,
        })
    }
}

/// Postgres-backed directory over the `users` table
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, filter: &str, value: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, filter);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_one("email", email).await
    }

    async fn find_by_employee_id(&self, employee_id: &str) -> Result<Option<User>, AppError> {
        self.find_one("employee_id", &normalize_employee_id(employee_id))
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let query = format!(
            r#"
            INSERT INTO users (email, hashed_password, full_name, role, employee_id, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        // Rolled back on drop if anything below fails.
        let mut transaction = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(&new_user.email)
            .bind(&new_user.hashed_password)
            .bind(&new_user.full_name)
            .bind(new_user.role.as_str())
            .bind(new_user.employee_id.as_deref().map(normalize_employee_id))
            .fetch_one(&mut transaction)
            .await?;

        let user = User::try_from(row)?;
        transaction.commit().await?;

        tracing::debug!(user_id = user.id, role = %user.role, "User row inserted");
        Ok(user)
    }

    async fn update_password(&self, user: &User, new_hash: &str) -> Result<(), AppError> {
        let mut transaction = self.pool.begin().await?;

        let result = sqlx::query("UPDATE users SET hashed_password = $1 WHERE id = $2")
            .bind(new_hash)
            .bind(user.id)
            .execute(&mut transaction)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }

        transaction.commit().await?;
        Ok(())
    }
}
