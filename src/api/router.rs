//! HTTP router for the screening backend.
//!
//! Returns a composable `Router` mounted under `/api/`. No authentication
//! layer: the service binds to a clinic-internal interface and the roles
//! (receptionist, scanner, doctor) are client-side views over the same API.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config;

/// Build the API router with all endpoints under `/api/`.
pub fn api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/stats", get(endpoints::stats::dashboard))
        .route(
            "/patients",
            post(endpoints::patients::create).get(endpoints::patients::list),
        )
        .route("/appointments", post(endpoints::appointments::create))
        .route("/appointments/today", get(endpoints::appointments::today))
        .route("/images/upload", post(endpoints::images::upload))
        .route("/images/history", get(endpoints::images::history))
        .route("/images/review", get(endpoints::images::review))
        .route("/image/:filename", get(endpoints::images::fetch_file))
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(config::MAX_UPLOAD_BYTES))
}
