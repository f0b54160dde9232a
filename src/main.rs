use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use skylink::configuration::{get_configuration, Settings, StorageBackend};
use skylink::directory::{InMemoryUserDirectory, PgUserDirectory, UserDirectory};
use skylink::startup::{build_auth_flow, run};
use skylink::telemetry::init_telemetry;

fn startup_error(kind: std::io::ErrorKind, message: &str) -> std::io::Error {
    std::io::Error::new(kind, message.to_string())
}

async fn build_directory(configuration: &Settings) -> std::io::Result<Arc<dyn UserDirectory>> {
    match configuration.application.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory user storage; accounts are lost on restart");
            Ok(Arc::new(InMemoryUserDirectory::new()))
        }
        StorageBackend::Postgres => {
            tracing::info!("Attempting to connect to database");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&configuration.database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    startup_error(std::io::ErrorKind::ConnectionRefused, "Database connection error")
                })?;

            sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
                tracing::error!("Failed to run database migrations: {}", e);
                startup_error(std::io::ErrorKind::Other, "Database migration error")
            })?;

            tracing::info!("Database connection pool created successfully");
            Ok(Arc::new(PgUserDirectory::new(pool)))
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;
    tracing::info!("Configuration loaded successfully");

    let directory = build_directory(&configuration).await?;

    let flow = build_auth_flow(&configuration, directory).map_err(|e| {
        tracing::error!("Failed to initialise authentication: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, flow)?.await
}
