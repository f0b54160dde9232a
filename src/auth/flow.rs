/// Auth Flow Controller
///
/// Orchestrates register / login / forgot-password / reset-password on top of
/// the user directory, the credential hasher and the token service. Each call
/// is independent; nothing is kept between requests except what the
/// directory stores.

use serde::Serialize;
use std::sync::Arc;

use crate::audit::{AuditAction, AuditLog};
use crate::auth::claims::SessionClaims;
use crate::auth::jwt::TokenService;
use crate::auth::password::CredentialHasher;
use crate::directory::UserDirectory;
use crate::domain::{normalize_employee_id, NewUser, Role, User};
use crate::email_client::EmailClient;
use crate::error::{AppError, AuthError, ErrorContext, ValidationError};
use crate::validators::{is_valid_email, is_valid_employee_id, is_valid_full_name};

pub const RESET_SENT_MESSAGE: &str =
    "If an account exists, a reset link has been sent to your email";
pub const RESET_LINK_GENERATED_MESSAGE: &str = "Reset link generated";
pub const RESET_DELIVERY_FAILED_MESSAGE: &str = "Email delivery failed, but reset link is below";

/// Plaintext behind the hash checked when a login names no stored user.
const UNKNOWN_USER_PASSWORD: &str = "skylink-unknown-user";

/// Registration input as received from the client
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    /// Defaults to `passenger` when absent
    pub role: Option<String>,
    /// Required for staff
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: Role,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_link: Option<String>,
}

impl ForgotPasswordResponse {
    fn message_only(message: &str) -> Self {
        Self {
            message: message.to_string(),
            reset_link: None,
        }
    }

    fn with_link(message: &str, link: String) -> Self {
        Self {
            message: message.to_string(),
            reset_link: Some(link),
        }
    }
}

pub struct AuthFlow {
    directory: Arc<dyn UserDirectory>,
    tokens: Arc<TokenService>,
    hasher: CredentialHasher,
    email_client: Option<EmailClient>,
    frontend_url: String,
    /// Verified against on unknown-email logins so both failure paths pay
    /// the same bcrypt cost.
    unknown_user_hash: String,
}

impl AuthFlow {
    /// `email_client = None` means email delivery is not configured; reset
    /// links are then returned to the caller.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        tokens: Arc<TokenService>,
        hasher: CredentialHasher,
        email_client: Option<EmailClient>,
        frontend_url: String,
    ) -> Self {
        let unknown_user_hash = hasher.hash(UNKNOWN_USER_PASSWORD).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to prepare the unknown-user hash");
            String::new()
        });

        Self {
            directory,
            tokens,
            hasher,
            email_client,
            frontend_url,
            unknown_user_hash,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Create a passenger or staff account. No token is issued.
    ///
    /// # Errors
    /// - `AdminRegistrationBlocked` for role `admin`, whatever the other fields
    /// - `ValidationError` for an unknown role, a staff account without
    ///   employee id, or malformed email / name / password
    /// - conflict when the email or employee id is taken
    pub async fn register(&self, registration: Registration) -> Result<User, AppError> {
        let context = ErrorContext::new("user_registration");
        tracing::info!(
            request_id = %context.request_id,
            role = registration.role.as_deref().unwrap_or("passenger"),
            "Registration attempt"
        );

        match self.try_register(registration).await {
            Ok(user) => {
                tracing::info!(
                    request_id = %context.request_id,
                    user_id = user.id,
                    role = %user.role,
                    "User registered successfully"
                );
                AuditLog::success(AuditAction::Register, "User created")
                    .with_resource_id(user.id)
                    .record();
                Ok(user)
            }
            Err(e) => {
                context.log_error(&e);
                AuditLog::failure(AuditAction::Register, e.to_string()).record();
                Err(e)
            }
        }
    }

    async fn try_register(&self, registration: Registration) -> Result<User, AppError> {
        let role = match registration.role.as_deref() {
            None => Role::Passenger,
            Some(raw) => raw.parse::<Role>()?,
        };
        if role == Role::Admin {
            return Err(AuthError::AdminRegistrationBlocked.into());
        }

        let employee_id = match role {
            Role::Staff => {
                let employee_id =
                    normalize_employee_id(&is_valid_employee_id(registration.employee_id.as_deref())?);
                if self.directory.find_by_employee_id(&employee_id).await?.is_some() {
                    return Err(AppError::conflict("This Employee ID is already registered"));
                }
                Some(employee_id)
            }
            _ => None,
        };

        let email = is_valid_email(&registration.email)?;
        let full_name = is_valid_full_name(registration.full_name.as_deref())?;

        if self.directory.find_by_email(&email).await?.is_some() {
            tracing::warn!("Registration for an email that is already registered");
            return Err(AppError::conflict("Email already registered"));
        }

        let hashed_password = self.hasher.hash(&registration.password)?;

        // A concurrent registration can still win between the checks above and
        // this write; the directory reports that as a conflict too.
        self.directory
            .create(NewUser {
                email,
                hashed_password,
                full_name,
                role,
                employee_id,
            })
            .await
    }

    /// Authenticate with email and password and issue a session token.
    ///
    /// Unknown email and wrong password fail with the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let context = ErrorContext::new("user_login");

        let user = match self.directory.find_by_email(email.trim()).await? {
            Some(user) => user,
            None => {
                self.hasher.verify(password, &self.unknown_user_hash);
                tracing::warn!(request_id = %context.request_id, "Login for unknown email");
                AuditLog::failure(AuditAction::Login, "Unknown email").record();
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if user.role == Role::Admin {
            AuditLog::failure(AuditAction::Login, "Admin login blocked")
                .with_resource_id(user.id)
                .record();
            return Err(AuthError::AdminLoginBlocked.into());
        }

        if !user.is_active {
            AuditLog::failure(AuditAction::Login, "Account deactivated")
                .with_resource_id(user.id)
                .record();
            return Err(AuthError::AccountInactive.into());
        }

        if !self.hasher.verify(password, &user.hashed_password) {
            tracing::warn!(request_id = %context.request_id, user_id = user.id, "Wrong password");
            AuditLog::failure(AuditAction::Login, "Wrong password")
                .with_resource_id(user.id)
                .record();
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token = self.tokens.issue_session(&user)?;

        tracing::info!(
            request_id = %context.request_id,
            user_id = user.id,
            role = %user.role,
            "User logged in successfully"
        );
        AuditLog::success(AuditAction::Login, "Session token issued")
            .with_resource_id(user.id)
            .record();

        Ok(LoginResponse {
            access_token,
            token_type: "bearer".to_string(),
            role: user.role,
            full_name: user.full_name,
        })
    }

    /// Start a password reset. The response never reveals whether the email
    /// is registered.
    pub async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordResponse, AppError> {
        let context = ErrorContext::new("forgot_password");

        // A malformed address cannot be registered; answer as for an unknown one.
        let email = match is_valid_email(email) {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(request_id = %context.request_id, error = %e, "Reset requested for malformed email");
                AuditLog::failure(AuditAction::ForgotPassword, "Malformed email").record();
                return Ok(ForgotPasswordResponse::message_only(RESET_SENT_MESSAGE));
            }
        };

        let user = match self.directory.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                tracing::warn!(request_id = %context.request_id, "Reset requested for unknown email");
                AuditLog::failure(AuditAction::ForgotPassword, "Unknown email").record();
                return Ok(ForgotPasswordResponse::message_only(RESET_SENT_MESSAGE));
            }
        };

        let token = self.tokens.issue_reset(&user.email)?;
        let reset_link = self.reset_link(&token);

        let response = match &self.email_client {
            None => {
                tracing::warn!(
                    request_id = %context.request_id,
                    "Email delivery not configured; returning reset link in response"
                );
                ForgotPasswordResponse::with_link(RESET_LINK_GENERATED_MESSAGE, reset_link)
            }
            Some(client) => {
                if client.send_reset_email(&user.email, &reset_link).await {
                    tracing::info!(request_id = %context.request_id, user_id = user.id, "Password reset email sent");
                    ForgotPasswordResponse::message_only(RESET_SENT_MESSAGE)
                } else {
                    tracing::warn!(
                        request_id = %context.request_id,
                        user_id = user.id,
                        "Email delivery failed; returning reset link in response"
                    );
                    ForgotPasswordResponse::with_link(RESET_DELIVERY_FAILED_MESSAGE, reset_link)
                }
            }
        };

        AuditLog::success(AuditAction::ForgotPassword, "Reset token issued")
            .with_resource_id(user.id)
            .record();
        Ok(response)
    }

    /// Replace the password of the user named by a valid reset token.
    ///
    /// The token is not consumed: it keeps working until it expires.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let context = ErrorContext::new("reset_password");

        let email = self.tokens.verify_reset(token).map_err(|_| {
            AuditLog::failure(AuditAction::ResetPassword, "Invalid or expired token").record();
            AppError::from(ValidationError::InvalidResetToken)
        })?;

        let user = self
            .directory
            .find_by_email(&email)
            .await?
            .ok_or_else(|| {
                tracing::warn!(request_id = %context.request_id, "Reset token for a user that no longer exists");
                AppError::not_found("User not found")
            })?;

        let hashed_password = self.hasher.hash(new_password)?;
        if let Err(e) = self.directory.update_password(&user, &hashed_password).await {
            context.with_user_id(user.id.to_string()).log_error(&e);
            return Err(e);
        }

        tracing::info!(request_id = %context.request_id, user_id = user.id, "Password reset successful");
        AuditLog::success(AuditAction::ResetPassword, "Password replaced")
            .with_resource_id(user.id)
            .record();
        Ok(())
    }

    /// The stored user behind a verified session token.
    pub async fn current_user(&self, claims: &SessionClaims) -> Result<User, AppError> {
        let user = self
            .directory
            .find_by_id(claims.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        Ok(user)
    }

    fn reset_link(&self, token: &str) -> String {
        format!(
            "{}/#/reset-password?token={}",
            self.frontend_url.trim_end_matches('/'),
            token
        )
    }
}
