//! Storage port traits — implemented by tender_postgres.
//! Service logic depends only on these traits, never on sqlx directly.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProcurementError;
use crate::types::*;

pub type Result<T> = std::result::Result<T, ProcurementError>;

// ── Tender capabilities ───────────────────────────────────────

#[async_trait]
pub trait TenderProvider: Send + Sync {
    /// List tenders ordered by name, optionally filtered by service type.
    /// `limit = 0` means no limit.
    async fn tenders(
        &self,
        limit: i32,
        offset: i32,
        service_types: &[ServiceType],
    ) -> Result<Vec<Tender>>;

    /// Tenders owned by any organization the user is responsible for.
    async fn tenders_by_user(&self, limit: i32, offset: i32, username: &str)
        -> Result<Vec<Tender>>;

    async fn status(&self, tender_id: Uuid) -> Result<TenderStatus>;
}

#[async_trait]
pub trait TenderCreator: Send + Sync {
    /// Insert a new tender with `status = Created`, `version = 1`.
    async fn create_tender(&self, input: NewTender) -> Result<Uuid>;
}

/// Every method is a single database transaction: snapshot the pre-state
/// into the version table, mutate the live row, `version += 1`.
#[async_trait]
pub trait TenderEditor: Send + Sync {
    async fn change_status(&self, tender_id: Uuid, status: TenderStatus) -> Result<()>;

    async fn edit(&self, tender_id: Uuid, patch: TenderPatch) -> Result<()>;

    /// Copy the content of historical `version` into the live row. Rollback
    /// is itself a mutation: the live version still increments by 1.
    async fn rollback(&self, tender_id: Uuid, version: i32) -> Result<()>;
}

// ── Bid capabilities ──────────────────────────────────────────

#[async_trait]
pub trait BidProvider: Send + Sync {
    /// Bids whose `author_id` matches, ordered by name. `limit = 0` = no limit.
    async fn bids_by_author(&self, limit: i32, offset: i32, author_id: Uuid) -> Result<Vec<Bid>>;

    async fn bids_for_tender(&self, tender_id: Uuid, limit: i32, offset: i32) -> Result<Vec<Bid>>;

    async fn status(&self, bid_id: Uuid) -> Result<BidStatus>;
}

#[async_trait]
pub trait BidCreator: Send + Sync {
    /// Insert a new bid with `status = Created`, no decision, `version = 1`.
    async fn create_bid(&self, input: NewBid) -> Result<Uuid>;
}

/// Same transactional contract as [`TenderEditor`].
#[async_trait]
pub trait BidEditor: Send + Sync {
    async fn update_status(&self, bid_id: Uuid, status: BidStatus) -> Result<()>;

    async fn edit(&self, bid_id: Uuid, patch: BidPatch) -> Result<()>;

    async fn rollback(&self, bid_id: Uuid, version: i32) -> Result<()>;

    /// One transaction: snapshot, then `status = Canceled`,
    /// `decision = Rejected`, `version += 1`.
    async fn cancel_and_reject(&self, bid_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait BidDecisionMaker: Send + Sync {
    /// Record one Approved vote. The `(bid_id, responsible)` primary key is
    /// the serialization point for concurrent voters; a duplicate insert
    /// surfaces as `Conflict`.
    async fn record_approval(&self, bid_id: Uuid, responsible_id: Uuid) -> Result<()>;

    /// One transaction: `decision = Rejected` (version-neutral), then
    /// snapshot + `status = Canceled` + version bump.
    async fn reject_bid(&self, bid_id: Uuid) -> Result<()>;

    /// Finalize an approved bid in a single transaction, holding a row lock
    /// on the bid. Re-checks inside the transaction that no decision has
    /// been applied yet and that the approval count has reached `quorum`;
    /// returns `false` without mutating otherwise.
    ///
    /// On finalization, in order: the winning bid's decision is set to
    /// Approved (no version bump), the tender is snapshotted and closed,
    /// every still-undecided bid of the tender is canceled and rejected
    /// (snapshot + bump each), and every bid other than the winner is
    /// canceled and rejected once more (snapshot + bump each).
    async fn approve_and_finalize(&self, bid_id: Uuid, tender_id: Uuid, quorum: i64)
        -> Result<bool>;
}

#[async_trait]
pub trait BidFeedbacker: Send + Sync {
    async fn feedback(&self, bid_id: Uuid, description: &str) -> Result<()>;

    /// Feedback on all bids authored by the employee with this username.
    async fn reviews(
        &self,
        author_username: &str,
        limit: i32,
        offset: i32,
    ) -> Result<Vec<Feedback>>;
}

// ── Checker façade ────────────────────────────────────────────

/// Read-only predicates used by the services to enforce authorization and
/// preconditions. Lookups return values; `require_*` methods return `()` or
/// a classified denial. None of these mutate.
#[async_trait]
pub trait Checkers: Send + Sync {
    /// Employee by username or organization by name. `Unauthorized` on miss.
    async fn id_by_name(&self, name: &str) -> Result<Uuid>;

    /// Inverse of [`Checkers::id_by_name`]. `Unauthorized` on miss.
    async fn name_by_id(&self, id: Uuid) -> Result<String>;

    /// The organization this employee is responsible for; when responsible
    /// for several, the lowest organization id wins. `Forbidden` if none.
    async fn responsible_org(&self, username: &str) -> Result<Uuid>;

    async fn responsible_count(&self, org_id: Uuid) -> Result<i64>;

    async fn require_responsible_for_tender(&self, tender_id: Uuid, username: &str) -> Result<()>;

    async fn tender(&self, tender_id: Uuid) -> Result<Tender>;

    async fn require_tender_version(&self, tender_id: Uuid, version: i32) -> Result<()>;

    async fn bid(&self, bid_id: Uuid) -> Result<Bid>;

    async fn require_bid_version(&self, bid_id: Uuid, version: i32) -> Result<()>;

    /// The bid's author is the employee with this username.
    async fn require_bid_author(&self, bid_id: Uuid, username: &str) -> Result<()>;

    /// The bid's tender belongs to the organization; returns the tender id.
    async fn require_bid_tender_owner(&self, bid_id: Uuid, org_id: Uuid) -> Result<Uuid>;

    /// The organization authored the bid or owns the bid's tender.
    async fn require_org_access_to_bid(&self, bid_id: Uuid, org_id: Uuid) -> Result<()>;

    /// Author of the bid, or responsible for an organization with access to
    /// it. Denied only when both paths fail.
    async fn require_bid_viewer(&self, bid_id: Uuid, username: &str) -> Result<()>;

    /// Distinct responsibles of the tender-owning organization that have
    /// approved this bid.
    async fn approval_count(&self, bid_id: Uuid) -> Result<i64>;

    /// The user has not already recorded an Approved vote on this bid.
    async fn require_not_submitted(&self, bid_id: Uuid, username: &str) -> Result<()>;

    /// No decision applied and not canceled.
    async fn require_bid_open(&self, bid_id: Uuid) -> Result<()>;

    async fn require_bid_not_canceled(&self, bid_id: Uuid) -> Result<()>;
}
