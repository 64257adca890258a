//! The seam between session logic and the lead API.
//!
//! [`LeadBackend`] is implemented over HTTP by
//! [`HttpLeadBackend`](crate::http::HttpLeadBackend); tests inject an
//! in-process double.

use async_trait::async_trait;
use serde_json::Value;

use leadconsole_core::filter::LeadQuery;
use leadconsole_core::import::ImportResponse;
use leadconsole_core::lead::Lead;
use leadconsole_core::listing::LeadPage;
use leadconsole_core::status_update::{StatusUpdatePayload, StatusUpdateResponse};
use leadconsole_core::types::CampaignId;

use crate::error::{ClientError, ClientResult};
use crate::models::{
    ActionReply, AllocateRequest, BulkAllocateRequest, BulkAllocationCandidates, ImportUpload,
    TransferReply, TransferRequest,
};

/// Upper bound on pages walked by [`fetch_all_leads`].
const MAX_SNAPSHOT_PAGES: u32 = 10_000;

/// Every backend call the console makes. One request per call.
#[async_trait]
pub trait LeadBackend: Send + Sync {
    /// One filtered, paginated page of leads.
    async fn query_leads(&self, query: &LeadQuery) -> ClientResult<LeadPage>;

    /// Raw filter-options payload; normalized by the caller.
    async fn filter_options(&self) -> ClientResult<Value>;

    async fn allocate(&self, request: &AllocateRequest) -> ClientResult<ActionReply>;

    /// Eligible leads and users for bulk allocation within a campaign.
    async fn discover_bulk_allocation(
        &self,
        campaign_id: Option<CampaignId>,
    ) -> ClientResult<BulkAllocationCandidates>;

    async fn bulk_allocate(&self, request: &BulkAllocateRequest) -> ClientResult<ActionReply>;

    async fn transfer(&self, request: &TransferRequest) -> ClientResult<TransferReply>;

    async fn import_leads(&self, upload: &ImportUpload) -> ClientResult<ImportResponse>;

    async fn update_status(
        &self,
        payload: &StatusUpdatePayload,
    ) -> ClientResult<StatusUpdateResponse>;
}

/// Walk every page of `base` and collect the leads.
///
/// `base.page` is ignored; pages are requested from 1 with `page_size`
/// rows each until the backend reports the last page.
pub async fn fetch_all_leads<B: LeadBackend + ?Sized>(
    backend: &B,
    base: &LeadQuery,
    page_size: u32,
) -> ClientResult<Vec<Lead>> {
    let mut query = base.clone();
    query.per_page = page_size.max(1);
    let mut leads = Vec::new();

    for page in 1..=MAX_SNAPSHOT_PAGES {
        query.page = page;
        let response = backend.query_leads(&query).await?;
        if !response.result {
            return Err(ClientError::rejected(
                response
                    .message
                    .clone()
                    .unwrap_or_else(|| "The server could not list leads".to_string()),
            ));
        }
        let last = response.is_last();
        leads.extend(response.data);
        if last {
            tracing::debug!(pages = page, leads = leads.len(), "Fetched full lead set");
            return Ok(leads);
        }
    }

    tracing::warn!(
        pages = MAX_SNAPSHOT_PAGES,
        leads = leads.len(),
        "Stopped walking lead pages at the page limit"
    );
    Ok(leads)
}
