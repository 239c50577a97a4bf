//! tender_server — standalone REST server for the procurement backend.
//!
//! Configuration comes from `config/<env>.yaml` when `DEV_ENV` is `local`
//! or `stage`, otherwise from the environment:
//!   SERVER_ADDRESS — listen address
//!   POSTGRES_CONN  — Postgres connection string

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use tender_core::{BidService, TenderService};
use tender_postgres::{schema, PgStores};
use tender_server::config::Config;
use tender_server::router::build_router;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tender_server=debug".into()),
        )
        .init();

    let config = Config::load().expect("failed to load configuration");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.postgres_conn)
        .await
        .expect("failed to connect to database");
    tracing::info!("connected to database");

    schema::bootstrap(&pool)
        .await
        .expect("failed to bootstrap database schema");

    let stores = PgStores::new(pool);
    let tender_store = Arc::new(stores.tenders);
    let bid_store = Arc::new(stores.bids);
    let checkers = Arc::new(stores.checkers);

    let tenders = Arc::new(TenderService::new(
        tender_store.clone(),
        tender_store.clone(),
        tender_store,
        bid_store.clone(),
        bid_store.clone(),
        checkers.clone(),
    ));
    let bids = Arc::new(BidService::new(
        bid_store.clone(),
        bid_store.clone(),
        bid_store.clone(),
        bid_store.clone(),
        bid_store,
        checkers,
    ));

    let app = build_router(tenders, bids);

    let listener = TcpListener::bind(&config.server_address)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {}: {e}", config.server_address));
    tracing::info!("tender_server listening on {}", config.server_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutting down");
}
