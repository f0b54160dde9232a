use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::SessionClaims;
use crate::domain::Role;
use crate::error::AppError;

/// Profile as carried by the session token; no storage round-trip.
#[derive(Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    pub employee_id: String,
}

impl From<&SessionClaims> for ProfileResponse {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.sub.clone(),
            role: claims.role,
            full_name: claims.full_name.clone(),
            employee_id: claims.employee_id.clone(),
        }
    }
}

/// GET /api/profile/passenger
pub async fn passenger_profile(
    claims: web::ReqData<SessionClaims>,
) -> Result<HttpResponse, AppError> {
    claims.require_role(&[Role::Passenger])?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(&*claims)))
}

/// GET /api/profile/staff
pub async fn staff_profile(claims: web::ReqData<SessionClaims>) -> Result<HttpResponse, AppError> {
    claims.require_role(&[Role::Staff])?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(&*claims)))
}
