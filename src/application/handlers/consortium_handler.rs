use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::application::handlers::extract::{ApiJson, ApiPath};
use crate::application::services::consortium_service::{
    ClientInput, ConsortiumReport, DailyAllocation, ProfitInput,
};
use crate::application::state::AppState;
use crate::domain::entities::client::{Client, ProfitEntry};
use crate::domain::errors::ApiError;
use crate::domain::services::allocation::ClientPerformance;

#[derive(Deserialize)]
pub struct ClientLoginRequest {
    pub name: String,
    pub password: Zeroizing<String>,
}

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: Zeroizing<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub username: String,
    /// Send as `Authorization: Bearer <access_token>` on consortium routes
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearedResponse {
    pub removed: u64,
}

pub async fn list_clients(State(state): State<AppState>) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(state.consortium.list_clients().await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ClientInput>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let client = state.consortium.add_client(input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ClientInput>,
) -> Result<Json<Client>, ApiError> {
    Ok(Json(state.consortium.update_client(id, input).await?))
}

pub async fn delete_client(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.consortium.delete_client(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_clients(State(state): State<AppState>) -> Result<Json<ClearedResponse>, ApiError> {
    let removed = state.consortium.clear_clients().await?;
    Ok(Json(ClearedResponse { removed }))
}

pub async fn list_profits(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProfitEntry>>, ApiError> {
    Ok(Json(state.consortium.list_profits().await?))
}

/// Record a day's pool result; an existing entry for the date is replaced.
pub async fn record_profit(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProfitInput>,
) -> Result<Json<ProfitEntry>, ApiError> {
    Ok(Json(state.consortium.record_profit(input).await?))
}

pub async fn delete_profit(
    State(state): State<AppState>,
    ApiPath(date): ApiPath<NaiveDate>,
) -> Result<StatusCode, ApiError> {
    state.consortium.delete_profit(date).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_profits(State(state): State<AppState>) -> Result<Json<ClearedResponse>, ApiError> {
    let removed = state.consortium.clear_profits().await?;
    Ok(Json(ClearedResponse { removed }))
}

pub async fn allocations(
    State(state): State<AppState>,
    ApiPath(date): ApiPath<NaiveDate>,
) -> Result<Json<DailyAllocation>, ApiError> {
    Ok(Json(state.consortium.allocations_for(date).await?))
}

pub async fn performance(
    State(state): State<AppState>,
) -> Result<Json<ConsortiumReport>, ApiError> {
    Ok(Json(state.consortium.performance().await?))
}

/// Exchange consortium admin credentials for a session token.
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    let username = request.username.trim();
    state
        .consortium
        .verify_admin(username, &request.password)
        .await?;

    let sessions = state.auth.sessions();
    let access_token = sessions.issue(username)?;
    tracing::info!("Consortium admin '{}' logged in", username);
    Ok(Json(AdminLoginResponse {
        username: username.to_string(),
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: sessions.ttl().as_secs(),
    }))
}

/// Client self-service: name and password in, that client's figures out.
pub async fn client_login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ClientLoginRequest>,
) -> Result<Json<ClientPerformance>, ApiError> {
    Ok(Json(
        state
            .consortium
            .verify_client(&request.name, &request.password)
            .await?,
    ))
}
