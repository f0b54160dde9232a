use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AuthFlow, CredentialHasher, TokenService};
use crate::configuration::Settings;
use crate::directory::UserDirectory;
use crate::email_client::EmailClient;
use crate::error::{AppError, ConfigError};
use crate::middleware::{JwtMiddleware, LoggerMiddleware};
use crate::routes::{
    forgot_password, get_current_user, health_check, login, passenger_profile, register,
    reset_password, staff_profile, status,
};

/// Wire the auth flow from configuration and a storage backend.
pub fn build_auth_flow(
    settings: &Settings,
    directory: Arc<dyn UserDirectory>,
) -> Result<AuthFlow, AppError> {
    let tokens = Arc::new(TokenService::new(&settings.jwt)?);
    let hasher = CredentialHasher::new(settings.application.password_hash_cost);

    let email_client = match &settings.email {
        Some(email_settings) => Some(EmailClient::from_settings(email_settings).map_err(|e| {
            AppError::Config(ConfigError::InvalidValue(format!("email: {}", e)))
        })?),
        None => {
            tracing::warn!("No email settings; password reset links will be returned in responses");
            None
        }
    };

    Ok(AuthFlow::new(
        directory,
        tokens,
        hasher,
        email_client,
        settings.application.frontend_url.clone(),
    ))
}

pub fn run(listener: TcpListener, flow: AuthFlow) -> Result<Server, std::io::Error> {
    let tokens = flow.tokens().clone();
    let flow = web::Data::new(flow);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)
            .app_data(flow.clone())
            .route("/", web::get().to(status))
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/forgot-password", web::post().to(forgot_password))
                    .route("/reset-password", web::post().to(reset_password))
                    .service(
                        web::resource("/me")
                            .wrap(JwtMiddleware::new(tokens.clone()))
                            .route(web::get().to(get_current_user)),
                    ),
            )
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(tokens.clone()))
                    .route("/profile/passenger", web::get().to(passenger_profile))
                    .route("/profile/staff", web::get().to(staff_profile)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
