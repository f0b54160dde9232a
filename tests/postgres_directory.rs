//! Runs against a live Postgres from `configuration.yaml` / `APP_DATABASE__*`.
//! `cargo test -- --ignored` to include them.

use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::sync::Arc;

use skylink::auth::Registration;
use skylink::configuration::{get_configuration, DatabaseSettings, Settings};
use skylink::directory::{PgUserDirectory, UserDirectory};
use skylink::domain::{NewUser, Role};
use skylink::error::{AppError, DatabaseError};
use skylink::startup::build_auth_flow;

pub struct TestDatabase {
    pub settings: Settings,
    pub directory: PgUserDirectory,
}

async fn spawn_database() -> TestDatabase {
    let mut settings = get_configuration().expect("Failed to read configuration.");
    settings.database.database_name = uuid::Uuid::new_v4().to_string();
    settings.application.password_hash_cost = 4;
    let pool = configure_database(&settings.database).await;

    TestDatabase {
        settings,
        directory: PgUserDirectory::new(pool),
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

fn new_user(email: &str, role: Role, employee_id: Option<&str>) -> NewUser {
    NewUser {
        email: email.to_string(),
        hashed_password: "$2b$04$placeholder".to_string(),
        full_name: Some("Ann Lee".to_string()),
        role,
        employee_id: employee_id.map(str::to_string),
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn create_then_find_by_every_key() {
    let db = spawn_database().await;

    let created = db
        .directory
        .create(new_user("crew@x.com", Role::Staff, Some("emp-7")))
        .await
        .expect("Failed to insert user");
    assert!(created.is_active);
    assert_eq!(created.employee_id.as_deref(), Some("EMP-7"));

    let by_email = db.directory.find_by_email("crew@x.com").await.unwrap();
    let by_employee_id = db.directory.find_by_employee_id("Emp-7").await.unwrap();
    let by_id = db.directory.find_by_id(created.id).await.unwrap();

    assert_eq!(by_email.as_ref(), Some(&created));
    assert_eq!(by_employee_id.as_ref(), Some(&created));
    assert_eq!(by_id, Some(created));
    assert!(db.directory.find_by_email("CREW@x.com").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn unique_violations_on_insert_are_conflicts() {
    let db = spawn_database().await;
    db.directory
        .create(new_user("crew@x.com", Role::Staff, Some("EMP-7")))
        .await
        .unwrap();

    let duplicate_email = db
        .directory
        .create(new_user("crew@x.com", Role::Passenger, None))
        .await
        .unwrap_err();
    assert!(duplicate_email.is_conflict());
    assert_eq!(duplicate_email.to_string(), "Email already registered");

    let duplicate_employee_id = db
        .directory
        .create(new_user("other@x.com", Role::Staff, Some("emp-7")))
        .await
        .unwrap_err();
    assert!(duplicate_employee_id.is_conflict());
    assert_eq!(
        duplicate_employee_id.to_string(),
        "This Employee ID is already registered"
    );

    // The failed inserts rolled back.
    assert!(db.directory.find_by_email("other@x.com").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn update_password_replaces_hash_or_reports_missing_user() {
    let db = spawn_database().await;
    let user = db
        .directory
        .create(new_user("a@x.com", Role::Passenger, None))
        .await
        .unwrap();

    db.directory.update_password(&user, "new-hash").await.unwrap();
    let stored = db.directory.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(stored.hashed_password, "new-hash");

    let ghost = skylink::domain::User { id: user.id + 1000, ..stored };
    assert!(matches!(
        db.directory.update_password(&ghost, "x").await,
        Err(AppError::Database(DatabaseError::NotFound(_)))
    ));
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn account_lifecycle_over_postgres() {
    let db = spawn_database().await;
    let flow = build_auth_flow(&db.settings, Arc::new(db.directory.clone()))
        .expect("Failed to build auth flow");

    flow.register(Registration {
        email: "a@x.com".to_string(),
        password: "pw1".to_string(),
        full_name: Some("Ann".to_string()),
        ..Default::default()
    })
    .await
    .unwrap();
    assert_eq!(flow.login("a@x.com", "pw1").await.unwrap().role, Role::Passenger);

    let link = flow
        .forgot_password("a@x.com")
        .await
        .unwrap()
        .reset_link
        .expect("reset link returned without email delivery");
    let token = link.split("token=").nth(1).unwrap();
    flow.reset_password(token, "pw2").await.unwrap();

    assert!(flow.login("a@x.com", "pw1").await.is_err());
    assert!(flow.login("a@x.com", "pw2").await.is_ok());
}
