//! tender_postgres — PostgreSQL implementations of the tender_core port
//! traits. Each adapter is a newtype wrapping `PgPool`; all SQL is
//! runtime-checked (`sqlx::query`, not `sqlx::query!`) to avoid a
//! compile-time database requirement.

pub mod bids;
pub mod checkers;
pub mod rows;
pub mod schema;
pub mod tenders;

pub use bids::PgBidStore;
pub use checkers::PgCheckers;
pub use tenders::PgTenderStore;

use sqlx::PgPool;

/// Convenience struct that constructs all Postgres adapters from a single pool.
pub struct PgStores {
    pub tenders: PgTenderStore,
    pub bids: PgBidStore,
    pub checkers: PgCheckers,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tenders: PgTenderStore::new(pool.clone()),
            bids: PgBidStore::new(pool.clone()),
            checkers: PgCheckers::new(pool),
        }
    }
}
