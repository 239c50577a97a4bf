//! Tender handlers.
//!
//! GET   /api/tenders                        — public feed
//! POST  /api/tenders/new                    — create
//! GET   /api/tenders/my                     — tenders of the user's org
//! GET   /api/tenders/:id/status             — read status
//! PUT   /api/tenders/:id/status             — change status
//! PATCH /api/tenders/:id/edit               — partial edit
//! PUT   /api/tenders/:id/rollback/:version  — roll back to a version

use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use tender_core::types::{TenderResponse, TenderStatus};
use tender_core::TenderService;

use crate::error::AppError;
use crate::requests::{
    parse_id, parse_version, CreateTenderBody, EditTenderBody, FeedQuery, PageUserQuery,
    TenderStatusChangeQuery, UsernameQuery,
};

pub async fn feed(
    Extension(service): Extension<Arc<TenderService>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<TenderResponse>>, AppError> {
    let service_types = query.validate()?;
    let tenders = service
        .tenders(query.limit, query.offset, &service_types)
        .await?;
    Ok(Json(tenders))
}

pub async fn create(
    Extension(service): Extension<Arc<TenderService>>,
    Json(body): Json<CreateTenderBody>,
) -> Result<Json<TenderResponse>, AppError> {
    let tender = service.create_tender(body.validate()?).await?;
    Ok(Json(tender))
}

pub async fn my(
    Extension(service): Extension<Arc<TenderService>>,
    Query(query): Query<PageUserQuery>,
) -> Result<Json<Vec<TenderResponse>>, AppError> {
    query.validate()?;
    let tenders = service
        .tenders_by_user(query.limit, query.offset, &query.username)
        .await?;
    Ok(Json(tenders))
}

pub async fn status(
    Extension(service): Extension<Arc<TenderService>>,
    Path(id): Path<String>,
    Query(query): Query<UsernameQuery>,
) -> Result<String, AppError> {
    query.validate_optional()?;
    let tender_id = parse_id(&id, "tenderId")?;
    let status = service.tender_status(tender_id, &query.username).await?;
    Ok(status.to_string())
}

pub async fn change_status(
    Extension(service): Extension<Arc<TenderService>>,
    Path(id): Path<String>,
    Query(query): Query<TenderStatusChangeQuery>,
) -> Result<Json<TenderResponse>, AppError> {
    let status: TenderStatus = query.validate()?;
    let tender_id = parse_id(&id, "tenderId")?;
    let tender = service
        .change_tender_status(tender_id, status, &query.username)
        .await?;
    Ok(Json(tender))
}

pub async fn edit(
    Extension(service): Extension<Arc<TenderService>>,
    Path(id): Path<String>,
    Query(query): Query<UsernameQuery>,
    Json(body): Json<EditTenderBody>,
) -> Result<Json<TenderResponse>, AppError> {
    query.validate()?;
    let tender_id = parse_id(&id, "tenderId")?;
    let tender = service
        .edit_tender(tender_id, &query.username, body.validate()?)
        .await?;
    Ok(Json(tender))
}

pub async fn rollback(
    Extension(service): Extension<Arc<TenderService>>,
    Path((id, version)): Path<(String, String)>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<TenderResponse>, AppError> {
    query.validate()?;
    let tender_id = parse_id(&id, "tenderId")?;
    let version = parse_version(&version)?;
    let tender = service
        .rollback_tender(tender_id, version, &query.username)
        .await?;
    Ok(Json(tender))
}
