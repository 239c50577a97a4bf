//! Bid handlers.
//!
//! POST  /api/bids/new                    — create
//! GET   /api/bids/my                     — bids of the user (and their org)
//! GET   /api/bids/:id/list               — bids for a tender
//! GET   /api/bids/:id/status             — read status
//! PUT   /api/bids/:id/status             — change status
//! PATCH /api/bids/:id/edit               — partial edit
//! PUT   /api/bids/:id/submit_decision    — quorum vote
//! PUT   /api/bids/:id/feedback           — leave feedback
//! PUT   /api/bids/:id/rollback/:version  — roll back to a version
//! GET   /api/bids/:id/reviews            — feedback on an author's bids

use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use tender_core::types::{BidResponse, FeedbackResponse};
use tender_core::BidService;

use crate::error::AppError;
use crate::requests::{
    parse_id, parse_version, BidStatusChangeQuery, CreateBidBody, DecisionQuery, EditBidBody,
    FeedbackQuery, PageUserQuery, ReviewsQuery, UsernameQuery,
};

pub async fn create(
    Extension(service): Extension<Arc<BidService>>,
    Json(body): Json<CreateBidBody>,
) -> Result<Json<BidResponse>, AppError> {
    let bid = service.create_bid(body.validate()?).await?;
    Ok(Json(bid))
}

pub async fn my(
    Extension(service): Extension<Arc<BidService>>,
    Query(query): Query<PageUserQuery>,
) -> Result<Json<Vec<BidResponse>>, AppError> {
    query.validate()?;
    let bids = service
        .bids_by_user(query.limit, query.offset, &query.username)
        .await?;
    Ok(Json(bids))
}

/// The `:id` here is the tender id.
pub async fn list_for_tender(
    Extension(service): Extension<Arc<BidService>>,
    Path(id): Path<String>,
    Query(query): Query<PageUserQuery>,
) -> Result<Json<Vec<BidResponse>>, AppError> {
    query.validate()?;
    let tender_id = parse_id(&id, "tenderId")?;
    let bids = service
        .bids_for_tender(tender_id, query.limit, query.offset, &query.username)
        .await?;
    Ok(Json(bids))
}

pub async fn status(
    Extension(service): Extension<Arc<BidService>>,
    Path(id): Path<String>,
    Query(query): Query<UsernameQuery>,
) -> Result<String, AppError> {
    query.validate_optional()?;
    let bid_id = parse_id(&id, "bidId")?;
    let status = service.bid_status(bid_id, &query.username).await?;
    Ok(status.to_string())
}

pub async fn update_status(
    Extension(service): Extension<Arc<BidService>>,
    Path(id): Path<String>,
    Query(query): Query<BidStatusChangeQuery>,
) -> Result<Json<BidResponse>, AppError> {
    let status = query.validate()?;
    let bid_id = parse_id(&id, "bidId")?;
    let bid = service
        .update_bid_status(bid_id, status, &query.username)
        .await?;
    Ok(Json(bid))
}

pub async fn edit(
    Extension(service): Extension<Arc<BidService>>,
    Path(id): Path<String>,
    Query(query): Query<UsernameQuery>,
    Json(body): Json<EditBidBody>,
) -> Result<Json<BidResponse>, AppError> {
    query.validate()?;
    let bid_id = parse_id(&id, "bidId")?;
    let bid = service
        .edit_bid(bid_id, &query.username, body.validate()?)
        .await?;
    Ok(Json(bid))
}

pub async fn submit_decision(
    Extension(service): Extension<Arc<BidService>>,
    Path(id): Path<String>,
    Query(query): Query<DecisionQuery>,
) -> Result<Json<BidResponse>, AppError> {
    let decision = query.validate()?;
    let bid_id = parse_id(&id, "bidId")?;
    let bid = service
        .submit_decision(bid_id, decision, &query.username)
        .await?;
    Ok(Json(bid))
}

pub async fn feedback(
    Extension(service): Extension<Arc<BidService>>,
    Path(id): Path<String>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<BidResponse>, AppError> {
    query.validate()?;
    let bid_id = parse_id(&id, "bidId")?;
    let bid = service
        .feedback(bid_id, &query.bid_feedback, &query.username)
        .await?;
    Ok(Json(bid))
}

pub async fn rollback(
    Extension(service): Extension<Arc<BidService>>,
    Path((id, version)): Path<(String, String)>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<BidResponse>, AppError> {
    query.validate()?;
    let bid_id = parse_id(&id, "bidId")?;
    let version = parse_version(&version)?;
    let bid = service
        .rollback_bid(bid_id, version, &query.username)
        .await?;
    Ok(Json(bid))
}

/// The `:id` here is the tender id.
pub async fn reviews(
    Extension(service): Extension<Arc<BidService>>,
    Path(id): Path<String>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<Vec<FeedbackResponse>>, AppError> {
    query.validate()?;
    let tender_id = parse_id(&id, "tenderId")?;
    let feedbacks = service
        .reviews(
            tender_id,
            &query.author_username,
            &query.requester_username,
            query.limit,
            query.offset,
        )
        .await?;
    Ok(Json(feedbacks))
}
