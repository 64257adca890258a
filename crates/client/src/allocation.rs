//! Allocation actions: single (round-robin over chosen users) and bulk
//! (campaign-wide, discovered by the backend).

use std::sync::Arc;

use leadconsole_core::allocation::{plan_allocation, AllocationBatch, AllocationPlan};
use leadconsole_core::error::CoreError;
use leadconsole_core::types::{CampaignId, LeadId, UserId};
use leadconsole_core::wire::join_ids;

use crate::backend::LeadBackend;
use crate::error::ClientResult;
use crate::guard::InFlight;
use crate::models::{ActionReply, AllocateRequest, BulkAllocateRequest, BulkAllocationCandidates};

/// A batch the backend did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub batch: AllocationBatch,
    /// Operator-facing reason.
    pub message: String,
}

/// Result of a single-allocate action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationReport {
    pub plan: AllocationPlan,
    pub allocated: Vec<AllocationBatch>,
    pub failed: Vec<BatchFailure>,
}

impl AllocationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn allocated_leads(&self) -> usize {
        self.allocated.iter().map(|b| b.lead_ids.len()).sum()
    }
}

/// Result of a bulk allocation: the backend reply plus the local preview
/// of how the leads were split.
#[derive(Debug, Clone)]
pub struct BulkAllocationOutcome {
    pub plan: AllocationPlan,
    pub reply: ActionReply,
}

pub struct AllocationService<B: LeadBackend + ?Sized> {
    backend: Arc<B>,
    in_flight: InFlight,
}

impl<B: LeadBackend + ?Sized> AllocationService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            in_flight: InFlight::new(),
        }
    }

    /// Plan without sending anything.
    pub fn preview(
        &self,
        lead_ids: &[LeadId],
        assignee_ids: &[UserId],
    ) -> ClientResult<AllocationPlan> {
        Ok(plan_allocation(lead_ids, assignee_ids)?)
    }

    /// Split `lead_ids` round-robin across `assignee_ids` and send one
    /// request per assignee, sequentially.
    ///
    /// A batch the backend refuses is reported in
    /// [`AllocationReport::failed`]; the remaining batches are still sent.
    pub async fn allocate(
        &self,
        lead_ids: &[LeadId],
        assignee_ids: &[UserId],
    ) -> ClientResult<AllocationReport> {
        let plan = plan_allocation(lead_ids, assignee_ids)?;
        let _guard = self.in_flight.try_begin("lead allocation")?;

        let mut allocated = Vec::new();
        let mut failed = Vec::new();
        for batch in plan.batches() {
            let request = AllocateRequest::new(&batch.lead_ids, batch.assignee_id);
            let result = match self.backend.allocate(&request).await {
                Ok(reply) => reply.into_result(),
                Err(err) => Err(err),
            };
            match result {
                Ok(_) => allocated.push(batch),
                Err(err) => {
                    tracing::warn!(
                        assignee_id = batch.assignee_id,
                        leads = batch.lead_ids.len(),
                        error = %err,
                        "Allocation batch failed"
                    );
                    failed.push(BatchFailure {
                        message: err.user_message(),
                        batch,
                    });
                }
            }
        }

        tracing::info!(
            leads = plan.len(),
            assignees = plan.assignees().len(),
            failed_batches = failed.len(),
            "Allocation finished"
        );

        Ok(AllocationReport {
            plan,
            allocated,
            failed,
        })
    }

    /// First bulk round trip: eligible leads and users for a campaign.
    pub async fn discover_bulk(
        &self,
        campaign_id: Option<CampaignId>,
    ) -> ClientResult<BulkAllocationCandidates> {
        let candidates = self.backend.discover_bulk_allocation(campaign_id).await?;
        tracing::debug!(
            ?campaign_id,
            leads = candidates.lead_ids.len(),
            "Discovered bulk allocation candidates"
        );
        Ok(candidates)
    }

    /// Second bulk round trip. Fails before sending anything when there is
    /// nothing to allocate or nobody to allocate to.
    pub async fn execute_bulk(
        &self,
        campaign_id: CampaignId,
        lead_ids: &[LeadId],
        user_ids: &[UserId],
    ) -> ClientResult<BulkAllocationOutcome> {
        if lead_ids.is_empty() {
            return Err(CoreError::Configuration(
                "There are no unallocated leads in this campaign".to_string(),
            )
            .into());
        }
        if user_ids.is_empty() {
            return Err(CoreError::Configuration(
                "Select at least one user to allocate leads to".to_string(),
            )
            .into());
        }

        let plan = plan_allocation(lead_ids, user_ids)?;
        let _guard = self.in_flight.try_begin("bulk allocation")?;

        let ordered: Vec<LeadId> = plan.assignments().iter().map(|a| a.lead_id).collect();
        let request = BulkAllocateRequest {
            campaign_id,
            lead_ids: join_ids(&ordered),
            user_ids: plan.assignees().to_vec(),
        };
        let reply = self.backend.bulk_allocate(&request).await?.into_result()?;

        tracing::info!(
            campaign_id,
            leads = plan.len(),
            users = plan.assignees().len(),
            "Bulk allocation executed"
        );
        Ok(BulkAllocationOutcome { plan, reply })
    }
}
