use std::sync::Arc;

use uuid::Uuid;

use crate::error::ProcurementError;
use crate::ports::{
    BidCreator, BidDecisionMaker, BidEditor, BidFeedbacker, BidProvider, Checkers, Result,
};
use crate::types::*;

/// Quorum of Approved votes required to finalize a bid: three, or every
/// responsible of the organization when it has fewer.
const QUORUM_CAP: i64 = 3;

/// Bid operations: creation, listing, status transitions, edits, rollback,
/// the quorum decision protocol and feedback.
pub struct BidService {
    bids: Arc<dyn BidProvider>,
    creator: Arc<dyn BidCreator>,
    editor: Arc<dyn BidEditor>,
    decisions: Arc<dyn BidDecisionMaker>,
    feedbacker: Arc<dyn BidFeedbacker>,
    checkers: Arc<dyn Checkers>,
}

impl BidService {
    pub fn new(
        bids: Arc<dyn BidProvider>,
        creator: Arc<dyn BidCreator>,
        editor: Arc<dyn BidEditor>,
        decisions: Arc<dyn BidDecisionMaker>,
        feedbacker: Arc<dyn BidFeedbacker>,
        checkers: Arc<dyn Checkers>,
    ) -> Self {
        Self {
            bids,
            creator,
            editor,
            decisions,
            feedbacker,
            checkers,
        }
    }

    /// Bids may only target a Published tender. When the author acts as an
    /// organization, the effective author id is the organization the acting
    /// user is responsible for, falling back to the organization whose id
    /// was supplied directly.
    pub async fn create_bid(&self, input: NewBid) -> Result<BidResponse> {
        let author_name = self.checkers.name_by_id(input.author_id).await?;
        let tender = self.checkers.tender(input.tender_id).await?;
        if tender.status != TenderStatus::Published {
            return Err(ProcurementError::forbidden("tender is not available"));
        }

        let mut input = input;
        if input.author_type == AuthorType::Organization {
            input.author_id = match self.checkers.responsible_org(&author_name).await {
                Ok(org_id) => org_id,
                Err(_) => self.checkers.id_by_name(&author_name).await?,
            };
        }

        let bid_id = self.creator.create_bid(input).await?;
        tracing::info!(%bid_id, "bid created");

        let bid = self.checkers.bid(bid_id).await?;
        Ok(bid.into())
    }

    /// Bids authored by the user, plus bids authored by the organization the
    /// user is responsible for.
    pub async fn bids_by_user(
        &self,
        limit: i32,
        offset: i32,
        username: &str,
    ) -> Result<Vec<BidResponse>> {
        let user_id = self.checkers.id_by_name(username).await?;

        let mut bids = self.bids.bids_by_author(limit, offset, user_id).await?;
        if let Ok(org_id) = self.checkers.responsible_org(username).await {
            bids.extend(self.bids.bids_by_author(limit, offset, org_id).await?);
        }

        Ok(bids.into_iter().map(BidResponse::from).collect())
    }

    /// A bid still in Created state is visible only to its author.
    pub async fn bids_for_tender(
        &self,
        tender_id: Uuid,
        limit: i32,
        offset: i32,
        username: &str,
    ) -> Result<Vec<BidResponse>> {
        self.checkers.id_by_name(username).await?;
        let tender = self.checkers.tender(tender_id).await?;

        if tender.status != TenderStatus::Published {
            self.checkers
                .require_responsible_for_tender(tender_id, username)
                .await?;
        }

        let bids = self.bids.bids_for_tender(tender_id, limit, offset).await?;

        let mut visible = Vec::with_capacity(bids.len());
        for bid in bids {
            if bid.status != BidStatus::Created
                || self
                    .checkers
                    .require_bid_author(bid.id, username)
                    .await
                    .is_ok()
            {
                visible.push(bid.into());
            }
        }

        Ok(visible)
    }

    pub async fn bid_status(&self, bid_id: Uuid, username: &str) -> Result<BidStatus> {
        let bid = self.checkers.bid(bid_id).await?;
        self.checkers.id_by_name(username).await?;

        if bid.status != BidStatus::Published {
            self.checkers.require_bid_author(bid_id, username).await?;
        }

        Ok(bid.status)
    }

    pub async fn update_bid_status(
        &self,
        bid_id: Uuid,
        status: BidStatus,
        username: &str,
    ) -> Result<BidResponse> {
        self.checkers.bid(bid_id).await?;
        self.checkers.id_by_name(username).await?;
        self.checkers.require_bid_open(bid_id).await?;
        self.checkers.require_bid_viewer(bid_id, username).await?;

        self.editor.update_status(bid_id, status).await?;

        let bid = self.checkers.bid(bid_id).await?;
        Ok(bid.into())
    }

    pub async fn edit_bid(
        &self,
        bid_id: Uuid,
        username: &str,
        patch: BidPatch,
    ) -> Result<BidResponse> {
        self.checkers.bid(bid_id).await?;
        self.checkers.id_by_name(username).await?;
        self.checkers.require_bid_open(bid_id).await?;
        self.checkers.require_bid_viewer(bid_id, username).await?;

        self.editor.edit(bid_id, patch).await?;

        let bid = self.checkers.bid(bid_id).await?;
        Ok(bid.into())
    }

    pub async fn rollback_bid(
        &self,
        bid_id: Uuid,
        version: i32,
        username: &str,
    ) -> Result<BidResponse> {
        self.checkers.bid(bid_id).await?;
        self.checkers.id_by_name(username).await?;
        self.checkers.require_bid_open(bid_id).await?;
        self.checkers.require_bid_version(bid_id, version).await?;
        self.checkers.require_bid_viewer(bid_id, username).await?;

        self.editor.rollback(bid_id, version).await?;
        tracing::info!(%bid_id, version, "bid rolled back");

        let bid = self.checkers.bid(bid_id).await?;
        Ok(bid.into())
    }

    /// The quorum protocol. A single rejection kills the bid. An approval
    /// is tallied; once `min(3, responsibles)` distinct responsibles of the
    /// tender-owning organization have approved, the bid wins: its decision
    /// is applied, the tender closes, and every other bid of the tender is
    /// canceled and rejected.
    pub async fn submit_decision(
        &self,
        bid_id: Uuid,
        decision: BidDecision,
        username: &str,
    ) -> Result<BidResponse> {
        let bid = self.checkers.bid(bid_id).await?;
        self.checkers.id_by_name(username).await?;

        if bid.status == BidStatus::Created {
            return Err(ProcurementError::forbidden(
                "organization has no access to just-created bids",
            ));
        }
        self.checkers.require_bid_open(bid_id).await?;

        let org_id = self.checkers.responsible_org(username).await?;
        let tender_id = self
            .checkers
            .require_bid_tender_owner(bid_id, org_id)
            .await?;
        self.checkers.require_not_submitted(bid_id, username).await?;

        match decision {
            BidDecision::Rejected => {
                self.decisions.reject_bid(bid_id).await?;
                tracing::info!(%bid_id, "bid rejected");
            }
            BidDecision::Approved => {
                let responsible_id = self.checkers.id_by_name(username).await?;
                self.decisions
                    .record_approval(bid_id, responsible_id)
                    .await?;

                let voted = self.checkers.approval_count(bid_id).await?;
                let responsibles = self.checkers.responsible_count(org_id).await?;
                let quorum = responsibles.min(QUORUM_CAP);

                if voted >= quorum {
                    let finalized = self
                        .decisions
                        .approve_and_finalize(bid_id, tender_id, quorum)
                        .await?;
                    tracing::info!(%bid_id, %tender_id, voted, quorum, finalized, "bid approved");
                }
            }
        }

        let bid = self.checkers.bid(bid_id).await?;
        Ok(bid.into())
    }

    /// Feedback may be left by a responsible of the tender-owning
    /// organization, never by the bid's own author, and never on a bid that
    /// is still a draft. Appending feedback does not version the bid.
    pub async fn feedback(
        &self,
        bid_id: Uuid,
        description: &str,
        username: &str,
    ) -> Result<BidResponse> {
        let bid = self.checkers.bid(bid_id).await?;
        self.checkers.id_by_name(username).await?;

        if bid.status == BidStatus::Created {
            return Err(ProcurementError::forbidden(
                "organization has no access to just-created bids",
            ));
        }
        if self
            .checkers
            .require_bid_author(bid_id, username)
            .await
            .is_ok()
        {
            return Err(ProcurementError::forbidden(
                "author cannot leave feedback on own bid",
            ));
        }

        let org_id = self.checkers.responsible_org(username).await?;
        self.checkers
            .require_bid_tender_owner(bid_id, org_id)
            .await?;

        self.feedbacker.feedback(bid_id, description).await?;

        let bid = self.checkers.bid(bid_id).await?;
        Ok(bid.into())
    }

    /// Reviews of an author's work, requested by a responsible of the
    /// tender. The author must have at least one bid on this tender; the
    /// returned feedback spans all of the author's bids.
    pub async fn reviews(
        &self,
        tender_id: Uuid,
        author_username: &str,
        requester_username: &str,
        limit: i32,
        offset: i32,
    ) -> Result<Vec<FeedbackResponse>> {
        self.checkers.tender(tender_id).await?;
        let author_id = self.checkers.id_by_name(author_username).await?;
        self.checkers.id_by_name(requester_username).await?;
        self.checkers
            .require_responsible_for_tender(tender_id, requester_username)
            .await?;

        let author_bids = self.bids.bids_by_author(0, 0, author_id).await?;
        if author_bids.is_empty() {
            return Err(ProcurementError::not_found("no bids by this user"));
        }
        if !author_bids.iter().any(|b| b.tender_id == tender_id) {
            return Err(ProcurementError::not_found(
                "no bids on this tender by the specified author",
            ));
        }

        let feedbacks = self
            .feedbacker
            .reviews(author_username, limit, offset)
            .await?;
        if feedbacks.is_empty() {
            return Err(ProcurementError::not_found(
                "no feedback for bids by this author",
            ));
        }

        Ok(feedbacks.into_iter().map(FeedbackResponse::from).collect())
    }
}
