//! Transfer action: move every lead matching a predicate to one user
//! and/or team.

use std::sync::Arc;

use leadconsole_core::filter::LeadQuery;
use leadconsole_core::lead::Lead;
use leadconsole_core::transfer::{plan_transfer, TransferCriteria, TransferPlan, TransferTarget};
use leadconsole_core::wire::join_ids;

use crate::backend::{fetch_all_leads, LeadBackend};
use crate::error::{ClientError, ClientResult};
use crate::guard::InFlight;
use crate::models::{TransferReply, TransferRequest};

pub struct TransferService<B: LeadBackend + ?Sized> {
    backend: Arc<B>,
    snapshot_page_size: u32,
    in_flight: InFlight,
}

impl<B: LeadBackend + ?Sized> TransferService<B> {
    pub fn new(backend: Arc<B>, snapshot_page_size: u32) -> Self {
        Self {
            backend,
            snapshot_page_size,
            in_flight: InFlight::new(),
        }
    }

    /// Plan against leads already in memory (client-mode backing set).
    pub fn preview(
        &self,
        leads: &[Lead],
        criteria: &TransferCriteria,
        target: TransferTarget,
    ) -> TransferPlan {
        plan_transfer(leads, criteria, target)
    }

    /// Plan against the backend: fetch every lead the criteria select
    /// server-side, then apply the same predicate locally.
    pub async fn preview_from_backend(
        &self,
        criteria: &TransferCriteria,
        target: TransferTarget,
    ) -> ClientResult<TransferPlan> {
        let mut query = LeadQuery::unfiltered(1, self.snapshot_page_size);
        query.user_filter = criteria.from_user.constraint().map(str::to_string);
        query.status_filter = criteria.from_status.constraint().map(str::to_string);
        query.campaign_filter = criteria.from_campaign.constraint().map(str::to_string);

        let leads = fetch_all_leads(self.backend.as_ref(), &query, self.snapshot_page_size).await?;
        Ok(plan_transfer(&leads, criteria, target))
    }

    /// Send the transfer. An empty plan fails without a request.
    pub async fn execute(&self, plan: &TransferPlan) -> ClientResult<TransferReply> {
        plan.ensure_executable()?;
        let _guard = self.in_flight.try_begin("lead transfer")?;

        let request = TransferRequest {
            lead_ids: join_ids(&plan.lead_ids),
            user_id: plan.target.user_id,
            team_id: plan.target.team_id,
        };
        let reply = self.backend.transfer(&request).await?;
        if !reply.success {
            return Err(ClientError::rejected(
                reply
                    .message
                    .unwrap_or_else(|| "The server rejected the transfer".to_string()),
            ));
        }

        tracing::info!(
            leads = plan.total(),
            transferred = ?reply.transferred_count,
            user_id = ?plan.target.user_id,
            team_id = ?plan.target.team_id,
            "Leads transferred"
        );
        Ok(reply)
    }
}
