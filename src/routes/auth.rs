/// Authentication Routes
///
/// Thin HTTP adapters over `AuthFlow`: extract the body, call the flow, shape
/// the response. All policy lives in the flow.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthFlow, Registration, SessionClaims};
use crate::domain::Role;
use crate::error::AppError;

#[derive(Deserialize, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub employee_id: Option<String>,
}

/// OAuth2 password-form login: the email travels as `username`.
#[derive(Deserialize, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub employee_id: Option<String>,
    pub is_active: bool,
}

/// POST /auth/register
///
/// # Errors
/// - 400: validation error, unknown role, missing employee id, or email /
///   employee id already registered
/// - 403: role `admin`
/// - 500: internal error
pub async fn register(
    body: web::Json<RegisterRequest>,
    flow: web::Data<AuthFlow>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    flow.register(Registration {
        email: body.email,
        password: body.password,
        full_name: body.full_name,
        role: body.role,
        employee_id: body.employee_id,
    })
    .await?;

    Ok(HttpResponse::Created().json(MessageResponse::new("User created successfully")))
}

/// POST /auth/login (form-encoded `username`, `password`)
///
/// # Errors
/// - 401: "Incorrect email or password" for unknown email or wrong password
/// - 403: admin account or deactivated account
pub async fn login(
    form: web::Form<LoginForm>,
    flow: web::Data<AuthFlow>,
) -> Result<HttpResponse, AppError> {
    let response = flow.login(&form.username, &form.password).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/forgot-password
///
/// Always 200, whether or not the email is registered or even well-formed.
pub async fn forgot_password(
    body: web::Json<ForgotPasswordRequest>,
    flow: web::Data<AuthFlow>,
) -> Result<HttpResponse, AppError> {
    let response = flow.forgot_password(&body.email).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/reset-password
///
/// # Errors
/// - 400: invalid or expired token, or unacceptable new password
/// - 404: the token's user no longer exists
pub async fn reset_password(
    body: web::Json<ResetPasswordRequest>,
    flow: web::Data<AuthFlow>,
) -> Result<HttpResponse, AppError> {
    flow.reset_password(&body.token, &body.password).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password reset successfully")))
}

/// GET /auth/me
///
/// Requires `Authorization: Bearer <session token>`; claims are injected by
/// the JWT middleware.
pub async fn get_current_user(
    claims: web::ReqData<SessionClaims>,
    flow: web::Data<AuthFlow>,
) -> Result<HttpResponse, AppError> {
    let user = flow.current_user(&claims).await?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
        employee_id: user.employee_id,
        is_active: user.is_active,
    }))
}
