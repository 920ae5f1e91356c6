use axum::{response::Json, Extension};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::services::auth_service::{AuthService, UserResponse};

/// GET /api/auth/me - Current authenticated user details
pub async fn me_get(Extension(principal): Extension<AuthUser>) -> Result<Json<UserResponse>, ApiError> {
    let service = AuthService::new().await?;
    let response = service.current_user(&principal.email).await?;
    Ok(Json(response))
}
