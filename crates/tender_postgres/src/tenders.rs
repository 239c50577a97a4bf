//! Postgres adapter for the tender capability ports.
//!
//! Every mutation runs as one transaction: lock the live row, copy it into
//! `tender_version`, then mutate and bump `version`.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tender_core::error::ProcurementError;
use tender_core::ports::{Result, TenderCreator, TenderEditor, TenderProvider};
use tender_core::types::{NewTender, ServiceType, Tender, TenderPatch, TenderStatus};

use crate::rows::TenderRow;

const SNAPSHOT_TENDER: &str = r#"
    INSERT INTO tender_version (tender_id, version, name, description, service_type,
                                status, organization_id, creator_username, created_at)
    SELECT id, version, name, description, service_type,
           status, organization_id, creator_username, created_at
    FROM tender
    WHERE id = $1
"#;

pub struct PgTenderStore {
    pool: PgPool,
}

impl PgTenderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the row for the duration of the surrounding transaction.
    /// NotFound when the tender does not exist.
    async fn lock_row(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tender_id: Uuid,
    ) -> Result<()> {
        sqlx::query("SELECT version FROM tender WHERE id = $1 FOR UPDATE")
            .bind(tender_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| anyhow!(e))?
            .ok_or_else(|| ProcurementError::not_found("tender not found"))?;
        Ok(())
    }
}

#[async_trait]
impl TenderProvider for PgTenderStore {
    async fn tenders(
        &self,
        limit: i32,
        offset: i32,
        service_types: &[ServiceType],
    ) -> Result<Vec<Tender>> {
        let filter: Option<Vec<String>> = if service_types.is_empty() {
            None
        } else {
            Some(service_types.iter().map(|s| s.to_string()).collect())
        };

        let rows = sqlx::query_as::<_, TenderRow>(
            r#"
            SELECT id, name, description, service_type::text AS service_type,
                   status::text AS status, organization_id, creator_username, version, created_at
            FROM tender
            WHERE ($3::text[] IS NULL OR service_type::text = ANY($3))
            ORDER BY name ASC
            LIMIT CASE WHEN $1 = 0 THEN NULL ELSE $1 END
            OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .bind(filter)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        rows.into_iter()
            .map(|r| r.try_into().map_err(|e: String| anyhow!(e).into()))
            .collect()
    }

    async fn tenders_by_user(
        &self,
        limit: i32,
        offset: i32,
        username: &str,
    ) -> Result<Vec<Tender>> {
        let rows = sqlx::query_as::<_, TenderRow>(
            r#"
            SELECT t.id, t.name, t.description, t.service_type::text AS service_type,
                   t.status::text AS status, t.organization_id, t.creator_username,
                   t.version, t.created_at
            FROM tender t
            JOIN organization_responsible r ON r.organization_id = t.organization_id
            JOIN employee e ON e.id = r.user_id
            WHERE e.username = $3
            ORDER BY t.name ASC
            LIMIT CASE WHEN $1 = 0 THEN NULL ELSE $1 END
            OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        rows.into_iter()
            .map(|r| r.try_into().map_err(|e: String| anyhow!(e).into()))
            .collect()
    }

    async fn status(&self, tender_id: Uuid) -> Result<TenderStatus> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status::text FROM tender WHERE id = $1")
                .bind(tender_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| anyhow!(e))?;

        let status = status.ok_or_else(|| ProcurementError::not_found("tender not found"))?;
        TenderStatus::from_str(&status)
            .ok_or_else(|| anyhow!("unknown tender status: {status}").into())
    }
}

#[async_trait]
impl TenderCreator for PgTenderStore {
    async fn create_tender(&self, input: NewTender) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO tender (name, description, service_type, status,
                                organization_id, creator_username, version, created_at)
            VALUES ($1, $2, $3::service_type, 'Created'::tender_status, $4, $5, 1, now())
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.service_type.as_str())
        .bind(input.organization_id)
        .bind(&input.creator_username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(id)
    }
}

#[async_trait]
impl TenderEditor for PgTenderStore {
    async fn change_status(&self, tender_id: Uuid, status: TenderStatus) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        Self::lock_row(&mut tx, tender_id).await?;
        sqlx::query(SNAPSHOT_TENDER)
            .bind(tender_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        sqlx::query(
            "UPDATE tender SET status = $2::tender_status, version = version + 1 WHERE id = $1",
        )
        .bind(tender_id)
        .bind(status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn edit(&self, tender_id: Uuid, patch: TenderPatch) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        Self::lock_row(&mut tx, tender_id).await?;
        sqlx::query(SNAPSHOT_TENDER)
            .bind(tender_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        sqlx::query(
            r#"
            UPDATE tender
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                service_type = COALESCE($4::service_type, service_type),
                version = version + 1
            WHERE id = $1
            "#,
        )
        .bind(tender_id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.service_type.map(|s| s.as_str()))
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn rollback(&self, tender_id: Uuid, version: i32) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        Self::lock_row(&mut tx, tender_id).await?;
        sqlx::query(SNAPSHOT_TENDER)
            .bind(tender_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        let updated = sqlx::query(
            r#"
            UPDATE tender
            SET name = v.name,
                description = v.description,
                service_type = v.service_type,
                status = v.status,
                organization_id = v.organization_id,
                creator_username = v.creator_username,
                version = tender.version + 1
            FROM tender_version v
            WHERE v.tender_id = tender.id
              AND tender.id = $1
              AND v.version = $2
            "#,
        )
        .bind(tender_id)
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        if updated.rows_affected() == 0 {
            return Err(ProcurementError::not_found("no such tender version"));
        }

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }
}
