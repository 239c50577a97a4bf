//! sqlx row types. Postgres enums are selected as `::text` and parsed into
//! the domain enums on conversion, so the adapters stay free of
//! compile-time database requirements.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use tender_core::types::{
    AuthorType, Bid, BidDecision, BidStatus, Feedback, ServiceType, Tender, TenderStatus,
};

#[derive(Debug, FromRow)]
pub struct TenderRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: String,
    pub status: String,
    pub organization_id: Uuid,
    pub creator_username: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TenderRow> for Tender {
    type Error = String;

    fn try_from(row: TenderRow) -> Result<Self, String> {
        Ok(Tender {
            id: row.id,
            name: row.name,
            description: row.description,
            service_type: ServiceType::from_str(&row.service_type)
                .ok_or_else(|| format!("unknown service type: {}", row.service_type))?,
            status: TenderStatus::from_str(&row.status)
                .ok_or_else(|| format!("unknown tender status: {}", row.status))?,
            organization_id: row.organization_id,
            creator_username: row.creator_username,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct BidRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub decision: Option<String>,
    pub status: String,
    pub tender_id: Uuid,
    pub author_type: String,
    pub author_id: Uuid,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BidRow> for Bid {
    type Error = String;

    fn try_from(row: BidRow) -> Result<Self, String> {
        let decision = match row.decision {
            Some(d) => Some(
                BidDecision::from_str(&d).ok_or_else(|| format!("unknown bid decision: {d}"))?,
            ),
            None => None,
        };
        Ok(Bid {
            id: row.id,
            name: row.name,
            description: row.description,
            decision,
            status: BidStatus::from_str(&row.status)
                .ok_or_else(|| format!("unknown bid status: {}", row.status))?,
            tender_id: row.tender_id,
            author_type: AuthorType::from_str(&row.author_type)
                .ok_or_else(|| format!("unknown author type: {}", row.author_type))?,
            author_id: row.author_id,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct FeedbackRow {
    pub id: Uuid,
    pub bid_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Feedback {
            id: row.id,
            bid_id: row.bid_id,
            description: row.description,
            created_at: row.created_at,
        }
    }
}
