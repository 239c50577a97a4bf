//! Postgres implementation of the checker façade. Pure reads; every
//! predicate yields success or a classified denial.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tender_core::error::ProcurementError;
use tender_core::ports::{Checkers, Result};
use tender_core::types::{Bid, BidStatus, Tender};

use crate::rows::{BidRow, TenderRow};

pub struct PgCheckers {
    pool: PgPool,
}

impl PgCheckers {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The bid was authored by the organization itself.
    async fn org_authored_bid(&self, bid_id: Uuid, org_id: Uuid) -> Result<bool> {
        let row: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT o.id
            FROM bid b
            JOIN organization o ON o.id = b.author_id
            WHERE b.id = $1 AND o.id = $2
            "#,
        )
        .bind(bid_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl Checkers for PgCheckers {
    async fn id_by_name(&self, name: &str) -> Result<Uuid> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM employee WHERE username = $1
            UNION
            SELECT id FROM organization WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        id.ok_or_else(|| ProcurementError::unauthorized("user not found"))
    }

    async fn name_by_id(&self, id: Uuid) -> Result<String> {
        let name: Option<String> = sqlx::query_scalar(
            r#"
            SELECT username FROM employee WHERE id = $1
            UNION
            SELECT name FROM organization WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        name.ok_or_else(|| ProcurementError::unauthorized("user or organization not found"))
    }

    async fn responsible_org(&self, username: &str) -> Result<Uuid> {
        // Lowest organization id wins when the employee is responsible for
        // more than one.
        let org: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT r.organization_id
            FROM organization_responsible r
            JOIN employee e ON e.id = r.user_id
            WHERE e.username = $1
            ORDER BY r.organization_id ASC
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        org.ok_or_else(|| {
            ProcurementError::forbidden("user is not responsible for any organization")
        })
    }

    async fn responsible_count(&self, org_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM organization_responsible WHERE organization_id = $1")
                .bind(org_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| anyhow!(e))?;
        Ok(count)
    }

    async fn require_responsible_for_tender(&self, tender_id: Uuid, username: &str) -> Result<()> {
        let row: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT e.id
            FROM employee e
            JOIN organization_responsible r ON r.user_id = e.id
            JOIN tender t ON t.organization_id = r.organization_id
            WHERE t.id = $1 AND e.username = $2
            "#,
        )
        .bind(tender_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        match row {
            Some(_) => Ok(()),
            None => Err(ProcurementError::forbidden("user has no access to tender")),
        }
    }

    async fn tender(&self, tender_id: Uuid) -> Result<Tender> {
        let row: Option<TenderRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, service_type::text AS service_type,
                   status::text AS status, organization_id, creator_username, version, created_at
            FROM tender
            WHERE id = $1
            "#,
        )
        .bind(tender_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        let row = row.ok_or_else(|| ProcurementError::not_found("tender not found"))?;
        row.try_into().map_err(|e: String| anyhow!(e).into())
    }

    async fn require_tender_version(&self, tender_id: Uuid, version: i32) -> Result<()> {
        let row: Option<i32> = sqlx::query_scalar(
            "SELECT version FROM tender_version WHERE tender_id = $1 AND version = $2",
        )
        .bind(tender_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        match row {
            Some(_) => Ok(()),
            None => Err(ProcurementError::not_found("no such tender version")),
        }
    }

    async fn bid(&self, bid_id: Uuid) -> Result<Bid> {
        let row: Option<BidRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, decision::text AS decision,
                   status::text AS status, tender_id, author_type::text AS author_type,
                   author_id, version, created_at
            FROM bid
            WHERE id = $1
            "#,
        )
        .bind(bid_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        let row = row.ok_or_else(|| ProcurementError::not_found("bid not found"))?;
        row.try_into().map_err(|e: String| anyhow!(e).into())
    }

    async fn require_bid_version(&self, bid_id: Uuid, version: i32) -> Result<()> {
        let row: Option<i32> =
            sqlx::query_scalar("SELECT version FROM bid_version WHERE bid_id = $1 AND version = $2")
                .bind(bid_id)
                .bind(version)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| anyhow!(e))?;

        match row {
            Some(_) => Ok(()),
            None => Err(ProcurementError::not_found("no such bid version")),
        }
    }

    async fn require_bid_author(&self, bid_id: Uuid, username: &str) -> Result<()> {
        let row: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT e.id
            FROM bid b
            JOIN employee e ON e.id = b.author_id
            WHERE b.id = $1 AND e.username = $2
            "#,
        )
        .bind(bid_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        match row {
            Some(_) => Ok(()),
            None => Err(ProcurementError::forbidden("user has no access to bid")),
        }
    }

    async fn require_bid_tender_owner(&self, bid_id: Uuid, org_id: Uuid) -> Result<Uuid> {
        let tender_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT t.id
            FROM bid b
            JOIN tender t ON t.id = b.tender_id
            WHERE b.id = $1 AND t.organization_id = $2
            "#,
        )
        .bind(bid_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        tender_id
            .ok_or_else(|| ProcurementError::forbidden("organization has no access to bid"))
    }

    async fn require_org_access_to_bid(&self, bid_id: Uuid, org_id: Uuid) -> Result<()> {
        if self.org_authored_bid(bid_id, org_id).await? {
            return Ok(());
        }
        self.require_bid_tender_owner(bid_id, org_id)
            .await
            .map(|_| ())
            .map_err(|_| ProcurementError::forbidden("organization has no access to bid"))
    }

    async fn require_bid_viewer(&self, bid_id: Uuid, username: &str) -> Result<()> {
        if self.require_bid_author(bid_id, username).await.is_ok() {
            return Ok(());
        }
        if let Ok(org_id) = self.responsible_org(username).await {
            if self.require_org_access_to_bid(bid_id, org_id).await.is_ok() {
                return Ok(());
            }
        }
        Err(ProcurementError::forbidden("user has no access to bid"))
    }

    async fn approval_count(&self, bid_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT ba.responsible)
            FROM bid_approval ba
            JOIN organization_responsible r ON r.user_id = ba.responsible
            JOIN bid b ON b.id = ba.bid_id
            JOIN tender t ON t.id = b.tender_id
            WHERE ba.bid_id = $1
              AND r.organization_id = t.organization_id
            "#,
        )
        .bind(bid_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(count)
    }

    async fn require_not_submitted(&self, bid_id: Uuid, username: &str) -> Result<()> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM bid_approval ba
            JOIN employee e ON e.id = ba.responsible
            WHERE ba.bid_id = $1 AND e.username = $2
            "#,
        )
        .bind(bid_id)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        if count > 0 {
            Err(ProcurementError::forbidden("user already sent a decision"))
        } else {
            Ok(())
        }
    }

    async fn require_bid_open(&self, bid_id: Uuid) -> Result<()> {
        let row: Option<(Option<String>, String)> =
            sqlx::query_as("SELECT decision::text, status::text FROM bid WHERE id = $1")
                .bind(bid_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| anyhow!(e))?;

        let (decision, status) =
            row.ok_or_else(|| ProcurementError::not_found("bid not found"))?;
        if decision.is_some() || BidStatus::from_str(&status) == Some(BidStatus::Canceled) {
            Err(ProcurementError::forbidden("bid is locked"))
        } else {
            Ok(())
        }
    }

    async fn require_bid_not_canceled(&self, bid_id: Uuid) -> Result<()> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status::text FROM bid WHERE id = $1")
                .bind(bid_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| anyhow!(e))?;

        let status = status.ok_or_else(|| ProcurementError::not_found("bid not found"))?;
        if BidStatus::from_str(&status) == Some(BidStatus::Canceled) {
            Err(ProcurementError::forbidden("bid is canceled"))
        } else {
            Ok(())
        }
    }
}
