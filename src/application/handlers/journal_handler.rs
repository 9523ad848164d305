use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::application::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::application::services::journal_service::{Dashboard, Market};
use crate::application::state::AppState;
use crate::auth::RequestContext;
use crate::domain::entities::balance::Balance;
use crate::domain::entities::holding::{Holding, NewHolding};
use crate::domain::entities::trade::{FuturesRecord, NewFuturesRecord, NewSpotTrade, SpotTrade};
use crate::domain::errors::ApiError;
use crate::domain::services::calendar::CalendarMonth;

/// Query parameters for the calendar endpoint
#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
    /// 1-12, defaults to the current month
    pub month: Option<u32>,
    #[serde(default)]
    pub market: Market,
}

#[derive(Debug, Deserialize)]
pub struct PriceUpdate {
    pub current_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct CloseHoldingRequest {
    pub close_price: f64,
    /// Defaults to today
    pub close_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct CloseHoldingResponse {
    pub realized_pnl: f64,
    pub trade: SpotTrade,
}

#[derive(Debug, Deserialize)]
pub struct BalanceUpdate {
    pub initial_balance: f64,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<Dashboard>, ApiError> {
    tracing::debug!("Dashboard requested by {:?}", context.role);
    Ok(Json(state.journal.dashboard().await?))
}

pub async fn calendar(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CalendarQuery>,
) -> Result<Json<CalendarMonth>, ApiError> {
    let today = Local::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    Ok(Json(state.journal.calendar(year, month, query.market).await?))
}

pub async fn list_spot(State(state): State<AppState>) -> Result<Json<Vec<SpotTrade>>, ApiError> {
    Ok(Json(state.journal.spot_trades().await?))
}

pub async fn add_spot(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewSpotTrade>,
) -> Result<(StatusCode, Json<SpotTrade>), ApiError> {
    let trade = state.journal.add_spot_trade(input).await?;
    Ok((StatusCode::CREATED, Json(trade)))
}

pub async fn replace_spot(
    State(state): State<AppState>,
    ApiPath(index): ApiPath<usize>,
    ApiJson(input): ApiJson<NewSpotTrade>,
) -> Result<Json<SpotTrade>, ApiError> {
    Ok(Json(state.journal.replace_spot_trade(index, input).await?))
}

pub async fn clear_spot(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.journal.clear_spot().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_futures(
    State(state): State<AppState>,
) -> Result<Json<Vec<FuturesRecord>>, ApiError> {
    Ok(Json(state.journal.futures_records().await?))
}

pub async fn add_futures(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewFuturesRecord>,
) -> Result<(StatusCode, Json<FuturesRecord>), ApiError> {
    let record = state.journal.add_futures_record(input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn clear_futures(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.journal.clear_futures().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_holdings(State(state): State<AppState>) -> Result<Json<Vec<Holding>>, ApiError> {
    Ok(Json(state.journal.holdings().await?))
}

pub async fn add_holding(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewHolding>,
) -> Result<(StatusCode, Json<Holding>), ApiError> {
    let holding = state.journal.add_holding(input).await?;
    Ok((StatusCode::CREATED, Json(holding)))
}

pub async fn update_holding_price(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(update): ApiJson<PriceUpdate>,
) -> Result<Json<Holding>, ApiError> {
    Ok(Json(
        state
            .journal
            .update_holding_price(&id, update.current_price)
            .await?,
    ))
}

pub async fn close_holding(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<CloseHoldingRequest>,
) -> Result<Json<CloseHoldingResponse>, ApiError> {
    let close_date = request
        .close_date
        .unwrap_or_else(|| Local::now().date_naive());
    let closed = state
        .journal
        .close_holding(&id, request.close_price, close_date)
        .await?;

    Ok(Json(CloseHoldingResponse {
        realized_pnl: closed.realized_pnl.value(),
        trade: closed.trade,
    }))
}

pub async fn clear_holdings(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.journal.clear_holdings().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_balance(State(state): State<AppState>) -> Result<Json<Balance>, ApiError> {
    Ok(Json(state.journal.balance().await?))
}

pub async fn set_balance(
    State(state): State<AppState>,
    ApiJson(update): ApiJson<BalanceUpdate>,
) -> Result<Json<Balance>, ApiError> {
    Ok(Json(state.journal.set_balance(update.initial_balance).await?))
}

pub async fn reset_balance(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.journal.reset_balance().await?;
    Ok(StatusCode::NO_CONTENT)
}
