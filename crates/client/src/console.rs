//! One console session: the lead list, its filter options and the actions
//! that change leads.
//!
//! Every action that succeeds in changing leads on the backend drops the
//! cached filter options and reloads the list (including the client-mode
//! backing set), so the next view reflects the backend rather than a stale
//! snapshot.

use std::path::Path;
use std::sync::Arc;

use leadconsole_core::error::CoreError;
use leadconsole_core::filter::SourceMode;
use leadconsole_core::import::ImportOutcome;
use leadconsole_core::options::FilterOptions;
use leadconsole_core::status_update::{StatusUpdate, StatusUpdateResponse};
use leadconsole_core::transfer::{TransferCriteria, TransferPlan, TransferTarget};
use leadconsole_core::types::{CampaignId, LeadId, UserId};

use crate::allocation::{AllocationReport, AllocationService, BulkAllocationOutcome};
use crate::backend::LeadBackend;
use crate::config::ClientConfig;
use crate::coordinator::LeadListCoordinator;
use crate::error::ClientResult;
use crate::import::ImportService;
use crate::models::{ImportUpload, TransferReply};
use crate::options::FilterOptionsProvider;
use crate::status::update_lead_status;
use crate::transfer::TransferService;

pub struct LeadConsole<B: LeadBackend + ?Sized> {
    backend: Arc<B>,
    list: LeadListCoordinator<B>,
    options: FilterOptionsProvider<B>,
    allocation: AllocationService<B>,
    transfer: TransferService<B>,
    import: ImportService<B>,
}

impl<B: LeadBackend + ?Sized> LeadConsole<B> {
    pub fn new(backend: Arc<B>, config: &ClientConfig) -> Result<Self, CoreError> {
        Ok(Self {
            list: LeadListCoordinator::from_config(backend.clone(), config)?,
            options: FilterOptionsProvider::new(backend.clone()),
            allocation: AllocationService::new(backend.clone()),
            transfer: TransferService::new(backend.clone(), config.snapshot_page_size),
            import: ImportService::new(backend.clone()),
            backend,
        })
    }

    pub fn list(&self) -> &LeadListCoordinator<B> {
        &self.list
    }

    pub fn allocation(&self) -> &AllocationService<B> {
        &self.allocation
    }

    pub fn import_service(&self) -> &ImportService<B> {
        &self.import
    }

    /// Filter options for the list's current mode.
    pub async fn filter_options(&self) -> FilterOptions {
        self.options.load_for(&self.list).await
    }

    // ── Actions ──────────────────────────────────────────────────────

    pub async fn allocate(
        &self,
        lead_ids: &[LeadId],
        assignee_ids: &[UserId],
    ) -> ClientResult<AllocationReport> {
        let report = self.allocation.allocate(lead_ids, assignee_ids).await?;
        if !report.allocated.is_empty() {
            self.leads_changed("allocation").await;
        }
        Ok(report)
    }

    pub async fn execute_bulk(
        &self,
        campaign_id: CampaignId,
        lead_ids: &[LeadId],
        user_ids: &[UserId],
    ) -> ClientResult<BulkAllocationOutcome> {
        let outcome = self
            .allocation
            .execute_bulk(campaign_id, lead_ids, user_ids)
            .await?;
        self.leads_changed("bulk allocation").await;
        Ok(outcome)
    }

    /// Preview a transfer. A loaded client-mode backing set is used as is;
    /// otherwise the matching leads are fetched from the backend.
    pub async fn preview_transfer(
        &self,
        criteria: &TransferCriteria,
        target: TransferTarget,
    ) -> ClientResult<TransferPlan> {
        if self.list.mode().await == SourceMode::Client {
            if let Some(leads) = self.list.backing_set().await {
                return Ok(self.transfer.preview(&leads, criteria, target));
            }
        }
        self.transfer.preview_from_backend(criteria, target).await
    }

    pub async fn transfer(&self, plan: &TransferPlan) -> ClientResult<TransferReply> {
        let reply = self.transfer.execute(plan).await?;
        self.leads_changed("transfer").await;
        Ok(reply)
    }

    pub async fn import(&self, upload: ImportUpload) -> ClientResult<ImportOutcome> {
        let outcome = self.import.import(upload).await?;
        self.after_import(&outcome).await;
        Ok(outcome)
    }

    pub async fn import_file(
        &self,
        path: impl AsRef<Path>,
        campaign_id: CampaignId,
    ) -> ClientResult<ImportOutcome> {
        let outcome = self.import.import_file(path, campaign_id).await?;
        self.after_import(&outcome).await;
        Ok(outcome)
    }

    pub async fn update_status(
        &self,
        update: &StatusUpdate,
    ) -> ClientResult<StatusUpdateResponse> {
        let response = update_lead_status(self.backend.as_ref(), update).await?;
        self.leads_changed("status update").await;
        Ok(response)
    }

    async fn after_import(&self, outcome: &ImportOutcome) {
        if outcome.imported_count > 0 {
            self.leads_changed("import").await;
        }
    }

    /// Drop cached options and reload the list. A failed reload leaves the
    /// list empty with its filters intact, same as any failed fetch.
    async fn leads_changed(&self, action: &str) {
        self.options.invalidate().await;
        if let Err(err) = self.list.refresh_after_mutation().await {
            tracing::warn!(action, error = %err, "Reload after lead change failed");
        }
    }
}
