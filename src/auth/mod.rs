/// Authentication module
///
/// Password hashing, session and reset tokens, and the account flows that
/// combine them with the user directory.

mod claims;
mod flow;
mod jwt;
mod password;

pub use claims::{ResetClaims, SessionClaims, RESET_TOKEN_TYPE};
pub use flow::{
    AuthFlow, ForgotPasswordResponse, LoginResponse, Registration, RESET_DELIVERY_FAILED_MESSAGE,
    RESET_LINK_GENERATED_MESSAGE, RESET_SENT_MESSAGE,
};
pub use jwt::TokenService;
pub use password::CredentialHasher;
