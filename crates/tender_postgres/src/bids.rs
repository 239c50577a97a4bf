//! Postgres adapter for the bid capability ports.
//!
//! Versioned mutations follow the same contract as the tender adapter:
//! lock, snapshot into `bid_version`, mutate, `version += 1`, one
//! transaction each. Decision writes never bump the version; the status
//! change that accompanies them does.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tender_core::error::ProcurementError;
use tender_core::ports::{
    BidCreator, BidDecisionMaker, BidEditor, BidFeedbacker, BidProvider, Result,
};
use tender_core::types::{Bid, BidPatch, BidStatus, Feedback, NewBid};

use crate::rows::{BidRow, FeedbackRow};

const SNAPSHOT_BID: &str = r#"
    INSERT INTO bid_version (bid_id, version, name, description, decision,
                             status, tender_id, author_type, author_id, created_at)
    SELECT id, version, name, description, decision,
           status, tender_id, author_type, author_id, created_at
    FROM bid
    WHERE id = $1
"#;

/// Approved votes on the bid from distinct responsibles of the organization
/// that owns the bid's tender.
const COUNT_APPROVALS: &str = r#"
    SELECT COUNT(DISTINCT ba.responsible)
    FROM bid_approval ba
    JOIN organization_responsible r ON r.user_id = ba.responsible
    JOIN bid b ON b.id = ba.bid_id
    JOIN tender t ON t.id = b.tender_id
    WHERE ba.bid_id = $1
      AND r.organization_id = t.organization_id
"#;

pub struct PgBidStore {
    pool: PgPool,
}

impl PgBidStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the bid row and return its current decision, if any.
    /// NotFound when the bid does not exist.
    async fn lock_row(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        bid_id: Uuid,
    ) -> Result<Option<String>> {
        let row: Option<Option<String>> =
            sqlx::query_scalar("SELECT decision::text FROM bid WHERE id = $1 FOR UPDATE")
                .bind(bid_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| anyhow!(e))?;
        row.ok_or_else(|| ProcurementError::not_found("bid not found"))
    }
}

#[async_trait]
impl BidProvider for PgBidStore {
    async fn bids_by_author(&self, limit: i32, offset: i32, author_id: Uuid) -> Result<Vec<Bid>> {
        let rows = sqlx::query_as::<_, BidRow>(
            r#"
            SELECT id, name, description, decision::text AS decision,
                   status::text AS status, tender_id, author_type::text AS author_type,
                   author_id, version, created_at
            FROM bid
            WHERE author_id = $3
            ORDER BY name ASC
            LIMIT CASE WHEN $1 = 0 THEN NULL ELSE $1 END
            OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        rows.into_iter()
            .map(|r| r.try_into().map_err(|e: String| anyhow!(e).into()))
            .collect()
    }

    async fn bids_for_tender(&self, tender_id: Uuid, limit: i32, offset: i32) -> Result<Vec<Bid>> {
        let rows = sqlx::query_as::<_, BidRow>(
            r#"
            SELECT id, name, description, decision::text AS decision,
                   status::text AS status, tender_id, author_type::text AS author_type,
                   author_id, version, created_at
            FROM bid
            WHERE tender_id = $3
            ORDER BY name ASC
            LIMIT CASE WHEN $1 = 0 THEN NULL ELSE $1 END
            OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .bind(tender_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        rows.into_iter()
            .map(|r| r.try_into().map_err(|e: String| anyhow!(e).into()))
            .collect()
    }

    async fn status(&self, bid_id: Uuid) -> Result<BidStatus> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status::text FROM bid WHERE id = $1")
                .bind(bid_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| anyhow!(e))?;

        let status = status.ok_or_else(|| ProcurementError::not_found("bid not found"))?;
        BidStatus::from_str(&status).ok_or_else(|| anyhow!("unknown bid status: {status}").into())
    }
}

#[async_trait]
impl BidCreator for PgBidStore {
    async fn create_bid(&self, input: NewBid) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO bid (name, description, status, tender_id,
                             author_type, author_id, version, created_at)
            VALUES ($1, $2, 'Created'::bid_status, $3, $4::author_type, $5, 1, now())
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.tender_id)
        .bind(input.author_type.as_str())
        .bind(input.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(id)
    }
}

#[async_trait]
impl BidEditor for PgBidStore {
    async fn update_status(&self, bid_id: Uuid, status: BidStatus) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        Self::lock_row(&mut tx, bid_id).await?;
        sqlx::query(SNAPSHOT_BID)
            .bind(bid_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        sqlx::query("UPDATE bid SET status = $2::bid_status, version = version + 1 WHERE id = $1")
            .bind(bid_id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn edit(&self, bid_id: Uuid, patch: BidPatch) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        Self::lock_row(&mut tx, bid_id).await?;
        sqlx::query(SNAPSHOT_BID)
            .bind(bid_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        sqlx::query(
            r#"
            UPDATE bid
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                version = version + 1
            WHERE id = $1
            "#,
        )
        .bind(bid_id)
        .bind(patch.name)
        .bind(patch.description)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn rollback(&self, bid_id: Uuid, version: i32) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        Self::lock_row(&mut tx, bid_id).await?;
        sqlx::query(SNAPSHOT_BID)
            .bind(bid_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        let updated = sqlx::query(
            r#"
            UPDATE bid
            SET name = v.name,
                description = v.description,
                decision = v.decision,
                status = v.status,
                tender_id = v.tender_id,
                author_type = v.author_type,
                author_id = v.author_id,
                version = bid.version + 1
            FROM bid_version v
            WHERE v.bid_id = bid.id
              AND bid.id = $1
              AND v.version = $2
            "#,
        )
        .bind(bid_id)
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        if updated.rows_affected() == 0 {
            return Err(ProcurementError::not_found("no such bid version"));
        }

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn cancel_and_reject(&self, bid_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        Self::lock_row(&mut tx, bid_id).await?;
        sqlx::query(SNAPSHOT_BID)
            .bind(bid_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        sqlx::query(
            r#"
            UPDATE bid
            SET status = 'Canceled'::bid_status,
                decision = 'Rejected'::bid_decision,
                version = version + 1
            WHERE id = $1
            "#,
        )
        .bind(bid_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }
}

#[async_trait]
impl BidDecisionMaker for PgBidStore {
    async fn record_approval(&self, bid_id: Uuid, responsible_id: Uuid) -> Result<()> {
        sqlx::query("INSERT INTO bid_approval (bid_id, responsible) VALUES ($1, $2)")
            .bind(bid_id)
            .bind(responsible_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .and_then(|db| db.code())
                    .is_some_and(|code| code == "23505")
                {
                    ProcurementError::Conflict("approval already recorded".into())
                } else {
                    anyhow!(e).into()
                }
            })?;
        Ok(())
    }

    async fn reject_bid(&self, bid_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        Self::lock_row(&mut tx, bid_id).await?;
        // The decision write is version-neutral; the snapshot taken for the
        // status change below already carries it.
        sqlx::query("UPDATE bid SET decision = 'Rejected'::bid_decision WHERE id = $1")
            .bind(bid_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        sqlx::query(SNAPSHOT_BID)
            .bind(bid_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        sqlx::query(
            "UPDATE bid SET status = 'Canceled'::bid_status, version = version + 1 WHERE id = $1",
        )
        .bind(bid_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn approve_and_finalize(
        &self,
        bid_id: Uuid,
        tender_id: Uuid,
        quorum: i64,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        // The bid row lock serializes concurrent voters: the loser of the
        // race re-reads a decision that is already set and backs off.
        let decision = Self::lock_row(&mut tx, bid_id).await?;
        if decision.is_some() {
            return Ok(false);
        }

        let voted: i64 = sqlx::query_scalar(COUNT_APPROVALS)
            .bind(bid_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        if voted < quorum {
            return Ok(false);
        }

        // Winner first: with its decision applied, the close sweep below
        // leaves it alone.
        sqlx::query("UPDATE bid SET decision = 'Approved'::bid_decision WHERE id = $1")
            .bind(bid_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;

        sqlx::query("SELECT version FROM tender WHERE id = $1 FOR UPDATE")
            .bind(tender_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        sqlx::query(
            r#"
            INSERT INTO tender_version (tender_id, version, name, description, service_type,
                                        status, organization_id, creator_username, created_at)
            SELECT id, version, name, description, service_type,
                   status, organization_id, creator_username, created_at
            FROM tender
            WHERE id = $1
            "#,
        )
        .bind(tender_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;
        sqlx::query(
            "UPDATE tender SET status = 'Closed'::tender_status, version = version + 1 WHERE id = $1",
        )
        .bind(tender_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        // Closing the tender withdraws every still-undecided bid.
        sqlx::query(
            r#"
            INSERT INTO bid_version (bid_id, version, name, description, decision,
                                     status, tender_id, author_type, author_id, created_at)
            SELECT id, version, name, description, decision,
                   status, tender_id, author_type, author_id, created_at
            FROM bid
            WHERE tender_id = $1 AND decision IS NULL
            "#,
        )
        .bind(tender_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;
        sqlx::query(
            r#"
            UPDATE bid
            SET status = 'Canceled'::bid_status,
                decision = 'Rejected'::bid_decision,
                version = version + 1
            WHERE tender_id = $1 AND decision IS NULL
            "#,
        )
        .bind(tender_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        // And every bid other than the winner is canceled as losing.
        sqlx::query(
            r#"
            INSERT INTO bid_version (bid_id, version, name, description, decision,
                                     status, tender_id, author_type, author_id, created_at)
            SELECT id, version, name, description, decision,
                   status, tender_id, author_type, author_id, created_at
            FROM bid
            WHERE tender_id = $1 AND id <> $2
            "#,
        )
        .bind(tender_id)
        .bind(bid_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;
        sqlx::query(
            r#"
            UPDATE bid
            SET status = 'Canceled'::bid_status,
                decision = 'Rejected'::bid_decision,
                version = version + 1
            WHERE tender_id = $1 AND id <> $2
            "#,
        )
        .bind(tender_id)
        .bind(bid_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(true)
    }
}

#[async_trait]
impl BidFeedbacker for PgBidStore {
    async fn feedback(&self, bid_id: Uuid, description: &str) -> Result<()> {
        sqlx::query("INSERT INTO feedback (bid_id, description, created_at) VALUES ($1, $2, now())")
            .bind(bid_id)
            .bind(description)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn reviews(
        &self,
        author_username: &str,
        limit: i32,
        offset: i32,
    ) -> Result<Vec<Feedback>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT f.id, f.bid_id, f.description, f.created_at
            FROM feedback f
            JOIN bid b ON b.id = f.bid_id
            JOIN employee e ON e.id = b.author_id
            WHERE e.username = $1
            ORDER BY f.created_at ASC
            LIMIT CASE WHEN $2 = 0 THEN NULL ELSE $2 END
            OFFSET $3
            "#,
        )
        .bind(author_username)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(rows.into_iter().map(Feedback::from).collect())
    }
}
