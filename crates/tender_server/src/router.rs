//! Router construction for the procurement server.

use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use tender_core::{BidService, TenderService};

use crate::handlers;

/// Build the full axum router with all routes and middleware.
pub fn build_router(tenders: Arc<TenderService>, bids: Arc<BidService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/ping", get(handlers::ping))
        .route("/api/tenders", get(handlers::tenders::feed))
        .route("/api/tenders/new", post(handlers::tenders::create))
        .route("/api/tenders/my", get(handlers::tenders::my))
        .route(
            "/api/tenders/:id/status",
            get(handlers::tenders::status).put(handlers::tenders::change_status),
        )
        .route("/api/tenders/:id/edit", patch(handlers::tenders::edit))
        .route(
            "/api/tenders/:id/rollback/:version",
            put(handlers::tenders::rollback),
        )
        .route("/api/bids/new", post(handlers::bids::create))
        .route("/api/bids/my", get(handlers::bids::my))
        .route("/api/bids/:id/list", get(handlers::bids::list_for_tender))
        .route(
            "/api/bids/:id/status",
            get(handlers::bids::status).put(handlers::bids::update_status),
        )
        .route("/api/bids/:id/edit", patch(handlers::bids::edit))
        .route(
            "/api/bids/:id/submit_decision",
            put(handlers::bids::submit_decision),
        )
        .route("/api/bids/:id/feedback", put(handlers::bids::feedback))
        .route(
            "/api/bids/:id/rollback/:version",
            put(handlers::bids::rollback),
        )
        .route("/api/bids/:id/reviews", get(handlers::bids::reviews))
        .layer(Extension(tenders))
        .layer(Extension(bids))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
