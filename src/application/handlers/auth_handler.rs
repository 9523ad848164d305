use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::application::handlers::extract::ApiJson;
use crate::application::state::AppState;
use crate::auth::Role;
use crate::domain::errors::ApiError;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: Zeroizing<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub role: Role,
    /// Scheme to use with the same password on later requests
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Exchange a password for its role.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let role = state
        .auth
        .credentials()
        .role_for(request.password.trim())
        .ok_or_else(|| {
            tracing::warn!("Failed login attempt");
            ApiError::Unauthorized("invalid password".to_string())
        })?;

    tracing::info!("Login as {:?}", role);
    Ok(Json(LoginResponse {
        role,
        token_type: "Bearer".to_string(),
    }))
}
