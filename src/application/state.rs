//! Shared application state and the HTTP router.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::application::handlers::{auth_handler, consortium_handler, journal_handler};
use crate::application::services::consortium_service::ConsortiumService;
use crate::application::services::journal_service::JournalService;
use crate::auth::{
    require_admin, require_auth, require_consortium_admin, require_viewer, Authenticator,
};
use crate::rate_limit::{rate_limit_middleware, LoginRateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub journal: Arc<JournalService>,
    pub consortium: ConsortiumService,
    pub auth: Authenticator,
    pub login_limiter: LoginRateLimiter,
}

/// Build the full API. `max_body_bytes` caps every request body.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let auth = state.auth.clone();

    let public = Router::new().route("/health", get(auth_handler::health));

    let logins = Router::new()
        .route("/login", post(auth_handler::login))
        .route("/consortium/admin-login", post(consortium_handler::admin_login))
        .route("/consortium/client-login", post(consortium_handler::client_login))
        .route_layer(middleware::from_fn_with_state(
            state.login_limiter.clone(),
            rate_limit_middleware,
        ));

    let viewer = Router::new()
        .route("/journal/dashboard", get(journal_handler::dashboard))
        .route("/journal/calendar", get(journal_handler::calendar))
        .route_layer(middleware::from_fn(require_viewer))
        .route_layer(middleware::from_fn_with_state(auth.clone(), require_auth));

    let journal_admin = Router::new()
        .route(
            "/journal/spot",
            get(journal_handler::list_spot)
                .post(journal_handler::add_spot)
                .delete(journal_handler::clear_spot),
        )
        .route("/journal/spot/:index", put(journal_handler::replace_spot))
        .route(
            "/journal/futures",
            get(journal_handler::list_futures)
                .post(journal_handler::add_futures)
                .delete(journal_handler::clear_futures),
        )
        .route(
            "/journal/holdings",
            get(journal_handler::list_holdings)
                .post(journal_handler::add_holding)
                .delete(journal_handler::clear_holdings),
        )
        .route(
            "/journal/holdings/:id/price",
            post(journal_handler::update_holding_price),
        )
        .route(
            "/journal/holdings/:id/close",
            post(journal_handler::close_holding),
        )
        .route(
            "/journal/balance",
            get(journal_handler::get_balance)
                .put(journal_handler::set_balance)
                .delete(journal_handler::reset_balance),
        )
        // Layers run bottom-up: authenticate first, then check the role.
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(auth.clone(), require_auth));

    let consortium_admin = Router::new()
        .route(
            "/consortium/clients",
            get(consortium_handler::list_clients)
                .post(consortium_handler::create_client)
                .delete(consortium_handler::clear_clients),
        )
        .route(
            "/consortium/clients/:id",
            put(consortium_handler::update_client).delete(consortium_handler::delete_client),
        )
        .route(
            "/consortium/profits",
            get(consortium_handler::list_profits)
                .post(consortium_handler::record_profit)
                .delete(consortium_handler::clear_profits),
        )
        .route(
            "/consortium/profits/:date",
            delete(consortium_handler::delete_profit),
        )
        .route(
            "/consortium/allocations/:date",
            get(consortium_handler::allocations),
        )
        .route("/consortium/performance", get(consortium_handler::performance))
        .route_layer(middleware::from_fn(require_consortium_admin))
        .route_layer(middleware::from_fn_with_state(auth, require_auth));

    Router::new()
        .merge(public)
        .merge(logins)
        .merge(viewer)
        .merge(journal_admin)
        .merge(consortium_admin)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
        .with_state(state)
}
