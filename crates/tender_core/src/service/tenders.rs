use std::sync::Arc;

use uuid::Uuid;

use crate::error::ProcurementError;
use crate::ports::{
    BidEditor, BidProvider, Checkers, Result, TenderCreator, TenderEditor, TenderProvider,
};
use crate::types::*;

/// Tender operations: the public feed, creation, status transitions, edits
/// and rollback. Closing a tender cancels and rejects its bids.
pub struct TenderService {
    tenders: Arc<dyn TenderProvider>,
    creator: Arc<dyn TenderCreator>,
    editor: Arc<dyn TenderEditor>,
    bids: Arc<dyn BidProvider>,
    bid_editor: Arc<dyn BidEditor>,
    checkers: Arc<dyn Checkers>,
}

impl TenderService {
    pub fn new(
        tenders: Arc<dyn TenderProvider>,
        creator: Arc<dyn TenderCreator>,
        editor: Arc<dyn TenderEditor>,
        bids: Arc<dyn BidProvider>,
        bid_editor: Arc<dyn BidEditor>,
        checkers: Arc<dyn Checkers>,
    ) -> Self {
        Self {
            tenders,
            creator,
            editor,
            bids,
            bid_editor,
            checkers,
        }
    }

    /// Public feed: Published tenders only, ordered by name. The status
    /// filter is applied here, after the store returns its page.
    pub async fn tenders(
        &self,
        limit: i32,
        offset: i32,
        service_types: &[ServiceType],
    ) -> Result<Vec<TenderResponse>> {
        let tenders = self.tenders.tenders(limit, offset, service_types).await?;

        Ok(tenders
            .into_iter()
            .filter(|t| t.status == TenderStatus::Published)
            .map(TenderResponse::from)
            .collect())
    }

    pub async fn create_tender(&self, input: NewTender) -> Result<TenderResponse> {
        self.checkers.id_by_name(&input.creator_username).await?;
        self.checkers.name_by_id(input.organization_id).await?;

        let org_id = self
            .checkers
            .responsible_org(&input.creator_username)
            .await?;
        if org_id != input.organization_id {
            return Err(ProcurementError::forbidden(
                "user is not responsible for this organization",
            ));
        }

        let tender_id = self.creator.create_tender(input).await?;
        tracing::info!(%tender_id, "tender created");

        let tender = self.checkers.tender(tender_id).await?;
        Ok(tender.into())
    }

    pub async fn tenders_by_user(
        &self,
        limit: i32,
        offset: i32,
        username: &str,
    ) -> Result<Vec<TenderResponse>> {
        self.checkers.id_by_name(username).await?;
        self.checkers.responsible_org(username).await?;

        let tenders = self.tenders.tenders_by_user(limit, offset, username).await?;
        Ok(tenders.into_iter().map(TenderResponse::from).collect())
    }

    /// Published status is readable by anyone authenticated; Created and
    /// Closed only by a responsible of the owning organization.
    pub async fn tender_status(&self, tender_id: Uuid, username: &str) -> Result<TenderStatus> {
        self.checkers.id_by_name(username).await?;
        let tender = self.checkers.tender(tender_id).await?;

        if tender.status != TenderStatus::Published {
            self.checkers
                .require_responsible_for_tender(tender_id, username)
                .await?;
        }

        Ok(tender.status)
    }

    pub async fn change_tender_status(
        &self,
        tender_id: Uuid,
        status: TenderStatus,
        username: &str,
    ) -> Result<TenderResponse> {
        self.checkers.id_by_name(username).await?;
        let tender = self.checkers.tender(tender_id).await?;
        self.checkers
            .require_responsible_for_tender(tender_id, username)
            .await?;
        if tender.status == TenderStatus::Closed {
            return Err(ProcurementError::forbidden("tender is closed"));
        }

        self.editor.change_status(tender_id, status).await?;

        // Any status transition withdraws the tender's bids: each open bid
        // is canceled and its decision set to Rejected, one versioned
        // mutation per bid. Decided bids are left untouched.
        let related = self.bids.bids_for_tender(tender_id, 0, 0).await?;
        for bid in related {
            if bid.decision.is_none() {
                self.bid_editor.cancel_and_reject(bid.id).await?;
            }
        }
        tracing::info!(%tender_id, %status, "tender status changed");

        let tender = self.checkers.tender(tender_id).await?;
        Ok(tender.into())
    }

    pub async fn edit_tender(
        &self,
        tender_id: Uuid,
        username: &str,
        patch: TenderPatch,
    ) -> Result<TenderResponse> {
        self.checkers.id_by_name(username).await?;
        let tender = self.checkers.tender(tender_id).await?;
        self.checkers
            .require_responsible_for_tender(tender_id, username)
            .await?;
        if tender.status == TenderStatus::Closed {
            return Err(ProcurementError::forbidden("tender is closed"));
        }

        self.editor.edit(tender_id, patch).await?;

        let tender = self.checkers.tender(tender_id).await?;
        Ok(tender.into())
    }

    pub async fn rollback_tender(
        &self,
        tender_id: Uuid,
        version: i32,
        username: &str,
    ) -> Result<TenderResponse> {
        self.checkers.id_by_name(username).await?;
        let tender = self.checkers.tender(tender_id).await?;
        self.checkers
            .require_tender_version(tender_id, version)
            .await?;
        self.checkers
            .require_responsible_for_tender(tender_id, username)
            .await?;
        if tender.status == TenderStatus::Closed {
            return Err(ProcurementError::forbidden("tender is closed"));
        }

        self.editor.rollback(tender_id, version).await?;
        tracing::info!(%tender_id, version, "tender rolled back");

        let tender = self.checkers.tender(tender_id).await?;
        Ok(tender.into())
    }
}
