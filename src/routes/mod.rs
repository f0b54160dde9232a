mod auth;
mod health_check;
mod profile;

pub use auth::{
    forgot_password, get_current_user, login, register, reset_password, ForgotPasswordRequest,
    LoginForm, MessageResponse, RegisterRequest, ResetPasswordRequest, UserResponse,
};
pub use health_check::{health_check, status};
pub use profile::{passenger_profile, staff_profile, ProfileResponse};
