//! Request DTOs and their validation. Schema violations surface as
//! `InvalidInput`, which the error handler renders as 400. Query
//! parameters all default so that a missing field reaches validation
//! instead of a deserializer rejection.

use serde::Deserialize;
use uuid::Uuid;

use tender_core::error::ProcurementError;
use tender_core::types::{
    AuthorType, BidDecision, BidPatch, BidStatus, NewBid, NewTender, ServiceType, TenderPatch,
    TenderStatus,
};

type Result<T> = std::result::Result<T, ProcurementError>;

const MAX_USERNAME: usize = 50;
const MAX_NAME: usize = 100;
const MAX_DESCRIPTION: usize = 500;
const MAX_FEEDBACK: usize = 1000;

pub fn parse_id(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|_| ProcurementError::invalid(format!("{what} must be a uuid")))
}

pub fn parse_version(value: &str) -> Result<i32> {
    match value.parse::<i32>() {
        Ok(v) if v >= 1 => Ok(v),
        _ => Err(ProcurementError::invalid(
            "version must be a positive integer",
        )),
    }
}

fn require_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(ProcurementError::invalid("username is required"));
    }
    if username.len() > MAX_USERNAME {
        return Err(ProcurementError::invalid("username is too long"));
    }
    Ok(())
}

fn page_bounds(limit: i32, offset: i32) -> Result<()> {
    if limit < 0 {
        return Err(ProcurementError::invalid("limit must not be negative"));
    }
    if offset < 0 {
        return Err(ProcurementError::invalid("offset must not be negative"));
    }
    Ok(())
}

/// Empty strings in partial bodies preserve the prior value.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ── Tender requests ───────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeedQuery {
    pub limit: i32,
    pub offset: i32,
    pub service_type: Option<String>,
}

impl FeedQuery {
    /// Parses the comma-separated service type filter; an empty filter
    /// means no filter.
    pub fn validate(&self) -> Result<Vec<ServiceType>> {
        page_bounds(self.limit, self.offset)?;
        let Some(csv) = &self.service_type else {
            return Ok(vec![]);
        };
        csv.split(',')
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| {
                ServiceType::from_str(chunk.trim())
                    .ok_or_else(|| ProcurementError::invalid(format!("unknown service type: {chunk}")))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenderBody {
    pub name: String,
    pub description: String,
    pub service_type: String,
    pub organization_id: String,
    pub creator_username: String,
}

impl CreateTenderBody {
    pub fn validate(self) -> Result<NewTender> {
        if self.name.is_empty() || self.name.len() > MAX_NAME {
            return Err(ProcurementError::invalid(
                "name is required and at most 100 characters",
            ));
        }
        if self.description.is_empty() || self.description.len() > MAX_DESCRIPTION {
            return Err(ProcurementError::invalid(
                "description is required and at most 500 characters",
            ));
        }
        let service_type = ServiceType::from_str(&self.service_type).ok_or_else(|| {
            ProcurementError::invalid(format!("unknown service type: {}", self.service_type))
        })?;
        let organization_id = parse_id(&self.organization_id, "organizationId")?;
        require_username(&self.creator_username)?;

        Ok(NewTender {
            name: self.name,
            description: self.description,
            service_type,
            organization_id,
            creator_username: self.creator_username,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageUserQuery {
    pub limit: i32,
    pub offset: i32,
    pub username: String,
}

impl PageUserQuery {
    pub fn validate(&self) -> Result<()> {
        page_bounds(self.limit, self.offset)?;
        require_username(&self.username)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UsernameQuery {
    pub username: String,
}

impl UsernameQuery {
    pub fn validate(&self) -> Result<()> {
        require_username(&self.username)
    }

    /// Status reads only cap the length; an absent username is an identity
    /// failure for the service, not a schema failure.
    pub fn validate_optional(&self) -> Result<()> {
        if self.username.len() > MAX_USERNAME {
            return Err(ProcurementError::invalid("username is too long"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TenderStatusChangeQuery {
    pub status: String,
    pub username: String,
}

impl TenderStatusChangeQuery {
    pub fn validate(&self) -> Result<TenderStatus> {
        require_username(&self.username)?;
        TenderStatus::from_str(&self.status)
            .ok_or_else(|| ProcurementError::invalid(format!("unknown status: {}", self.status)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditTenderBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_type: Option<String>,
}

impl EditTenderBody {
    pub fn validate(self) -> Result<TenderPatch> {
        let name = non_empty(self.name);
        let description = non_empty(self.description);
        if name.as_ref().is_some_and(|n| n.len() > MAX_NAME) {
            return Err(ProcurementError::invalid("name is at most 100 characters"));
        }
        if description
            .as_ref()
            .is_some_and(|d| d.len() > MAX_DESCRIPTION)
        {
            return Err(ProcurementError::invalid(
                "description is at most 500 characters",
            ));
        }
        let service_type = match non_empty(self.service_type) {
            None => None,
            Some(raw) => Some(ServiceType::from_str(&raw).ok_or_else(|| {
                ProcurementError::invalid(format!("unknown service type: {raw}"))
            })?),
        };

        Ok(TenderPatch {
            name,
            description,
            service_type,
        })
    }
}

// ── Bid requests ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBidBody {
    pub name: String,
    pub description: String,
    pub tender_id: String,
    pub author_type: String,
    pub author_id: String,
}

impl CreateBidBody {
    pub fn validate(self) -> Result<NewBid> {
        if self.name.is_empty() {
            return Err(ProcurementError::invalid("name is required"));
        }
        if self.description.is_empty() || self.description.len() > MAX_DESCRIPTION {
            return Err(ProcurementError::invalid(
                "description is required and at most 500 characters",
            ));
        }
        let tender_id = parse_id(&self.tender_id, "tenderId")?;
        let author_type = AuthorType::from_str(&self.author_type).ok_or_else(|| {
            ProcurementError::invalid(format!("unknown author type: {}", self.author_type))
        })?;
        let author_id = parse_id(&self.author_id, "authorId")?;

        Ok(NewBid {
            name: self.name,
            description: self.description,
            tender_id,
            author_type,
            author_id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BidStatusChangeQuery {
    pub status: String,
    pub username: String,
}

impl BidStatusChangeQuery {
    pub fn validate(&self) -> Result<BidStatus> {
        require_username(&self.username)?;
        BidStatus::from_str(&self.status)
            .ok_or_else(|| ProcurementError::invalid(format!("unknown status: {}", self.status)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditBidBody {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl EditBidBody {
    pub fn validate(self) -> Result<BidPatch> {
        let name = non_empty(self.name);
        let description = non_empty(self.description);
        if name.as_ref().is_some_and(|n| n.len() > MAX_NAME) {
            return Err(ProcurementError::invalid("name is at most 100 characters"));
        }
        if description
            .as_ref()
            .is_some_and(|d| d.len() > MAX_DESCRIPTION)
        {
            return Err(ProcurementError::invalid(
                "description is at most 500 characters",
            ));
        }
        Ok(BidPatch { name, description })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DecisionQuery {
    pub decision: String,
    pub username: String,
}

impl DecisionQuery {
    pub fn validate(&self) -> Result<BidDecision> {
        require_username(&self.username)?;
        BidDecision::from_str(&self.decision).ok_or_else(|| {
            ProcurementError::invalid(format!("unknown decision: {}", self.decision))
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub bid_feedback: String,
    pub username: String,
}

impl FeedbackQuery {
    pub fn validate(&self) -> Result<()> {
        require_username(&self.username)?;
        if self.bid_feedback.is_empty() || self.bid_feedback.len() > MAX_FEEDBACK {
            return Err(ProcurementError::invalid(
                "bidFeedback is required and at most 1000 characters",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewsQuery {
    pub author_username: String,
    pub requester_username: String,
    pub limit: i32,
    pub offset: i32,
}

impl ReviewsQuery {
    pub fn validate(&self) -> Result<()> {
        page_bounds(self.limit, self.offset)?;
        require_username(&self.author_username)?;
        require_username(&self.requester_username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid<T: std::fmt::Debug>(result: Result<T>) {
        match result {
            Err(ProcurementError::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn negative_page_bounds_are_rejected() {
        assert_invalid(
            FeedQuery {
                limit: -1,
                ..Default::default()
            }
            .validate(),
        );
        assert_invalid(
            FeedQuery {
                offset: -1,
                ..Default::default()
            }
            .validate(),
        );
    }

    #[test]
    fn service_type_filter_parses_csv() {
        let query = FeedQuery {
            service_type: Some("Construction,Delivery".into()),
            ..Default::default()
        };
        assert_eq!(
            query.validate().unwrap(),
            vec![ServiceType::Construction, ServiceType::Delivery]
        );

        let bad = FeedQuery {
            service_type: Some("Construction,Shipping".into()),
            ..Default::default()
        };
        assert_invalid(bad.validate());
    }

    #[test]
    fn empty_filter_means_no_filter() {
        assert!(FeedQuery::default().validate().unwrap().is_empty());
    }

    #[test]
    fn username_limits() {
        assert_invalid(
            PageUserQuery {
                username: String::new(),
                ..Default::default()
            }
            .validate(),
        );
        assert_invalid(
            PageUserQuery {
                username: "x".repeat(51),
                ..Default::default()
            }
            .validate(),
        );
    }

    #[test]
    fn create_tender_body_rejects_bad_fields() {
        let body = CreateTenderBody {
            name: "roadworks".into(),
            description: "resurfacing".into(),
            service_type: "Teleportation".into(),
            organization_id: Uuid::new_v4().to_string(),
            creator_username: "jambo".into(),
        };
        assert_invalid(body.validate());

        let body = CreateTenderBody {
            name: "roadworks".into(),
            description: "resurfacing".into(),
            service_type: "Construction".into(),
            organization_id: "not-a-uuid".into(),
            creator_username: "jambo".into(),
        };
        assert_invalid(body.validate());
    }

    #[test]
    fn edit_body_treats_empty_strings_as_absent() {
        let patch = EditTenderBody {
            name: Some(String::new()),
            description: Some("updated".into()),
            service_type: Some(String::new()),
        }
        .validate()
        .unwrap();
        assert_eq!(patch.name, None);
        assert_eq!(patch.description.as_deref(), Some("updated"));
        assert_eq!(patch.service_type, None);
    }

    #[test]
    fn version_must_be_positive() {
        assert_invalid(parse_version("0"));
        assert_invalid(parse_version("-3"));
        assert_invalid(parse_version("seven"));
        assert_eq!(parse_version("2").unwrap(), 2);
    }

    #[test]
    fn decision_parses_case_insensitively() {
        let query = DecisionQuery {
            decision: "approved".into(),
            username: "jambo".into(),
        };
        assert_eq!(query.validate().unwrap(), BidDecision::Approved);
    }
}
