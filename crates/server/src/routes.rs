use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::{CACHE_CONTROL, EXPIRES, HeaderName, PRAGMA};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::set_header::SetResponseHeaderLayer;

use placehub_protocol::paths;

use crate::auth::require_auth;
use crate::handlers;
use crate::state::AppState;

const SURROGATE_CONTROL: HeaderName = HeaderName::from_static("surrogate-control");

/// Router com todas as rotas. Respostas nunca são cacheadas.
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route(paths::OPTIONS, get(handlers::list_places))
        .route(paths::EXECUTE, post(handlers::execute))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route(paths::HEALTH, get(handlers::health))
        .route(paths::ADD_PLACE, post(handlers::add_place))
        .route(paths::PENDING_SCRIPTS, get(handlers::pending_scripts))
        .merge(protected)
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            SURROGATE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
