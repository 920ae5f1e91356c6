// Token acquisition endpoints that do not require authentication.

use axum::response::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::services::auth_service::{AuthResponse, AuthService};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/signup - Create an account and receive a JWT
pub async fn signup_post(Json(payload): Json<SignUpRequest>) -> Result<Json<AuthResponse>, ApiError> {
    let service = AuthService::new().await?;
    let response = service.sign_up(&payload.email, &payload.password).await?;
    Ok(Json(response))
}

/// POST /api/auth/signin - Authenticate credentials and receive a JWT
pub async fn signin_post(Json(payload): Json<SignInRequest>) -> Result<Json<AuthResponse>, ApiError> {
    let service = AuthService::new().await?;
    let response = service.sign_in(&payload.email, &payload.password).await?;
    Ok(Json(response))
}

/// POST /api/auth/anonymous - Create an ephemeral account and receive a JWT
pub async fn anonymous_post() -> Result<Json<AuthResponse>, ApiError> {
    let service = AuthService::new().await?;
    let response = service.sign_in_anonymously().await?;
    Ok(Json(response))
}
