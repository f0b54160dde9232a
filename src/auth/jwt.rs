/// JWT Token Generation and Validation
///
/// `TokenService` is built once from `JwtSettings` and shared by the auth flow
/// and the JWT middleware. Changing the secret invalidates every outstanding
/// token; there is no key rotation.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::claims::{ResetClaims, SessionClaims, TokenKind};
use crate::configuration::JwtSettings;
use crate::domain::User;
use crate::error::{AppError, AuthError, ConfigError};

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    session_ttl: i64,
    reset_ttl: i64,
}

impl TokenService {
    /// # Errors
    /// Returns a `ConfigError` for an empty secret, a non-positive lifetime
    /// or a non-HMAC algorithm.
    pub fn new(config: &JwtSettings) -> Result<Self, ConfigError> {
        config.validate()?;
        let algorithm = config.signing_algorithm()?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm,
            issuer: config.issuer.clone(),
            session_ttl: config.access_token_expiry,
            reset_ttl: config.reset_token_expiry,
        })
    }

    /// Issue a session token for a user who just authenticated
    pub fn issue_session(&self, user: &User) -> Result<String, AppError> {
        self.issue_session_at(user, chrono::Utc::now().timestamp())
    }

    pub(crate) fn issue_session_at(&self, user: &User, now: i64) -> Result<String, AppError> {
        let claims = SessionClaims::for_user(user, now, self.session_ttl, &self.issuer);
        self.sign(&claims)
    }

    /// Issue a password-reset token for `email`
    pub fn issue_reset(&self, email: &str) -> Result<String, AppError> {
        self.issue_reset_at(email, chrono::Utc::now().timestamp())
    }

    pub(crate) fn issue_reset_at(&self, email: &str, now: i64) -> Result<String, AppError> {
        let claims = ResetClaims::new(email, now, self.reset_ttl, &self.issuer);
        self.sign(&claims)
    }

    /// Validate a session token and return its claims
    ///
    /// # Errors
    /// `AuthError::TokenExpired` past `exp`, `AuthError::TokenInvalid` for a bad
    /// signature, wrong issuer, missing subject or a token of another kind.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, AppError> {
        let claims: SessionClaims = self.decode_as(token, TokenKind::Session)?;

        if claims.sub.is_empty() {
            tracing::warn!("Session token without subject");
            return Err(AuthError::TokenInvalid.into());
        }

        Ok(claims)
    }

    /// Validate a reset token and return the email it was issued for
    ///
    /// # Errors
    /// Same as `verify_session`, plus `TokenInvalid` when the `type` marker is
    /// not `reset` or the subject is missing.
    pub fn verify_reset(&self, token: &str) -> Result<String, AppError> {
        let claims: ResetClaims = self.decode_as(token, TokenKind::Reset)?;

        claims.reset_subject().map(str::to_string).ok_or_else(|| {
            tracing::warn!("Token presented for reset is not a reset token");
            AuthError::TokenInvalid.into()
        })
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, AppError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    fn decode_as<C: DeserializeOwned>(&self, token: &str, kind: TokenKind) -> Result<C, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        decode::<C>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!(kind = ?kind, error = %e, "JWT validation error");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired.into(),
                    _ => AuthError::TokenInvalid.into(),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expiry: 3600,
            reset_token_expiry: 1800,
            issuer: "test".to_string(),
        }
    }

    fn passenger() -> User {
        User {
            id: 1,
            email: "a@x.com".to_string(),
            hashed_password: "$2b$04$irrelevant".to_string(),
            full_name: Some("Ann".to_string()),
            role: Role::Passenger,
            employee_id: None,
            is_active: true,
        }
    }

    fn service() -> TokenService {
        TokenService::new(&get_test_config()).expect("Failed to build token service")
    }

    #[test]
    fn test_issue_and_verify_session() {
        let service = service();
        let token = service.issue_session(&passenger()).expect("Failed to issue token");
        let claims = service.verify_session(&token).expect("Failed to verify token");

        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.role, Role::Passenger);
        assert_eq!(claims.full_name, "Ann");
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.iss, "test");
        assert!(claims.exp > chrono::Utc::now().timestamp());
    }

    #[test]
    fn test_issue_and_verify_reset() {
        let service = service();
        let token = service.issue_reset("a@x.com").unwrap();

        assert_eq!(service.verify_reset(&token).unwrap(), "a@x.com");
    }

    #[test]
    fn test_reset_window_is_thirty_minutes() {
        let service = service();
        let now = chrono::Utc::now().timestamp();

        let fresh = service.issue_reset_at("a@x.com", now - 29 * 60).unwrap();
        assert!(service.verify_reset(&fresh).is_ok());

        let stale = service.issue_reset_at("a@x.com", now - 31 * 60).unwrap();
        assert!(matches!(
            service.verify_reset(&stale),
            Err(AppError::Auth(AuthError::TokenExpired))
        ));
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let service = service();
        let issued = chrono::Utc::now().timestamp() - 3601;
        let token = service.issue_session_at(&passenger(), issued).unwrap();

        assert!(matches!(
            service.verify_session(&token),
            Err(AppError::Auth(AuthError::TokenExpired))
        ));
    }

    #[test]
    fn test_session_token_is_not_a_reset_token() {
        let service = service();
        let session = service.issue_session(&passenger()).unwrap();

        assert!(matches!(
            service.verify_reset(&session),
            Err(AppError::Auth(AuthError::TokenInvalid))
        ));
    }

    #[test]
    fn test_reset_token_is_not_a_session_token() {
        let service = service();
        let reset = service.issue_reset("a@x.com").unwrap();

        assert!(service.verify_session(&reset).is_err());
    }

    #[test]
    fn test_invalid_token() {
        assert!(service().verify_session("invalid.token.here").is_err());
        assert!(service().verify_reset("").is_err());
    }

    #[test]
    fn test_tampered_token() {
        let service = service();
        let token = service.issue_session(&passenger()).unwrap();

        let tampered = format!("{}X", token);
        assert!(service.verify_session(&tampered).is_err());
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = service().issue_reset("a@x.com").unwrap();

        let mut config = get_test_config();
        config.secret = "a-completely-different-secret-of-enough-length".to_string();
        let rotated = TokenService::new(&config).unwrap();

        assert!(rotated.verify_reset(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let token = service().issue_session(&passenger()).unwrap();

        let mut config = get_test_config();
        config.issuer = "wrong-issuer".to_string();
        let other = TokenService::new(&config).unwrap();

        assert!(other.verify_session(&token).is_err());
    }

    #[test]
    fn test_configured_algorithm_is_used() {
        let mut config = get_test_config();
        config.algorithm = "HS512".to_string();
        let hs512 = TokenService::new(&config).unwrap();
        let token = hs512.issue_reset("a@x.com").unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
        assert!(service().verify_reset(&token).is_err());
    }
}
