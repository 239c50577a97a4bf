//! Core domain types for the procurement service.
//! These are pure value types — no sqlx, no DB dependencies.

// Enums use `from_str() -> Option<Self>` instead of `FromStr` because they
// return None for unknown values rather than an error.
#![allow(clippy::should_implement_trait)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Enums ─────────────────────────────────────────────────────

/// Kind of work a tender requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Construction,
    Delivery,
    Manufacture,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Construction => "Construction",
            Self::Delivery => "Delivery",
            Self::Manufacture => "Manufacture",
        }
    }

    /// Case-insensitive parse; None for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "construction" => Some(Self::Construction),
            "delivery" => Some(Self::Delivery),
            "manufacture" => Some(Self::Manufacture),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tender lifecycle status. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenderStatus {
    Created,
    Published,
    Closed,
}

impl TenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Published => "Published",
            Self::Closed => "Closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "created" => Some(Self::Created),
            "published" => Some(Self::Published),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bid lifecycle status. `Canceled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidStatus {
    Created,
    Published,
    Canceled,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Published => "Published",
            Self::Canceled => "Canceled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "created" => Some(Self::Created),
            "published" => Some(Self::Published),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict on a bid. The "no decision yet" state is `Option::None` on the
/// bid itself; once set, the bid is locked against further mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidDecision {
    Approved,
    Rejected,
}

impl BidDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for BidDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who submitted a bid: an employee personally, or an organization acting
/// through a responsible employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorType {
    Organization,
    User,
}

impl AuthorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "Organization",
            Self::User => "User",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "organization" => Some(Self::Organization),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Entities ──────────────────────────────────────────────────

/// A buyer organization's request for work. Versioned; every mutation
/// snapshots the pre-state into the version table and bumps `version` by 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Tender {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub creator_username: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

/// A supplier's offer against a tender. Versioned like `Tender`. The
/// `decision` column itself is version-neutral: applying a decision does
/// not snapshot or bump, the status change that accompanies it does.
#[derive(Debug, Clone, PartialEq)]
pub struct Bid {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub decision: Option<BidDecision>,
    pub status: BidStatus,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

/// Review text left by a buyer-side responsible on a bid. Append-only,
/// does not version the bid.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub id: Uuid,
    pub bid_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// ── Write inputs ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewTender {
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub organization_id: Uuid,
    pub creator_username: String,
}

/// Partial tender edit. `None` preserves the prior value.
#[derive(Debug, Clone, Default)]
pub struct TenderPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_type: Option<ServiceType>,
}

#[derive(Debug, Clone)]
pub struct NewBid {
    pub name: String,
    pub description: String,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
}

/// Partial bid edit. `None` preserves the prior value.
#[derive(Debug, Clone, Default)]
pub struct BidPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

// ── Wire DTOs ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: TenderStatus,
    pub service_type: ServiceType,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Tender> for TenderResponse {
    fn from(t: Tender) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            status: t.status,
            service_type: t.service_type,
            version: t.version,
            created_at: t.created_at,
        }
    }
}

/// Bid as exposed on the wire. Deliberately omits the description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidResponse {
    pub id: Uuid,
    pub name: String,
    pub status: BidStatus,
    pub author_type: AuthorType,
    pub author_id: Uuid,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Bid> for BidResponse {
    fn from(b: Bid) -> Self {
        Self {
            id: b.id,
            name: b.name,
            status: b.status,
            author_type: b.author_type,
            author_id: b.author_id,
            version: b.version,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            description: f.description,
            created_at: f.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_type_parses_case_insensitively() {
        assert_eq!(
            ServiceType::from_str("construction"),
            Some(ServiceType::Construction)
        );
        assert_eq!(
            ServiceType::from_str("DELIVERY"),
            Some(ServiceType::Delivery)
        );
        assert_eq!(ServiceType::from_str("shipping"), None);
    }

    #[test]
    fn statuses_round_trip() {
        for s in [
            TenderStatus::Created,
            TenderStatus::Published,
            TenderStatus::Closed,
        ] {
            assert_eq!(TenderStatus::from_str(s.as_str()), Some(s));
        }
        for s in [BidStatus::Created, BidStatus::Published, BidStatus::Canceled] {
            assert_eq!(BidStatus::from_str(s.as_str()), Some(s));
        }
    }

    #[test]
    fn closed_parses_regardless_of_case() {
        assert_eq!(TenderStatus::from_str("closed"), Some(TenderStatus::Closed));
        assert_eq!(TenderStatus::from_str("Closed"), Some(TenderStatus::Closed));
        assert_eq!(TenderStatus::from_str("CLOSED"), Some(TenderStatus::Closed));
    }

    #[test]
    fn bid_response_omits_description() {
        let bid = Bid {
            id: Uuid::new_v4(),
            name: "offer".into(),
            description: "secret pricing".into(),
            decision: None,
            status: BidStatus::Created,
            tender_id: Uuid::new_v4(),
            author_type: AuthorType::User,
            author_id: Uuid::new_v4(),
            version: 1,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(BidResponse::from(bid)).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["authorType"], "User");
    }
}
