//! HTTP implementation of [`LeadBackend`] using [`reqwest`].
//!
//! Every request carries `Authorization: Bearer <token>` and a fresh
//! `x-request-id`. A missing token fails before any I/O.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use leadconsole_core::filter::LeadQuery;
use leadconsole_core::import::ImportResponse;
use leadconsole_core::listing::LeadPage;
use leadconsole_core::status_update::{StatusUpdatePayload, StatusUpdateResponse};
use leadconsole_core::types::CampaignId;

use crate::auth::AuthContext;
use crate::backend::LeadBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    ActionReply, AllocateRequest, BulkAllocateRequest, BulkAllocationCandidates, ImportUpload,
    TransferReply, TransferRequest,
};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client for one lead API.
pub struct HttpLeadBackend {
    client: reqwest::Client,
    api_url: String,
    auth: AuthContext,
}

impl HttpLeadBackend {
    /// Build a backend with a client honoring the configured timeout.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(
            client,
            config.api_url.clone(),
            config.auth_context(),
        ))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        auth: AuthContext,
    ) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_url,
            auth,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Start a request with auth and correlation headers attached.
    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> ClientResult<reqwest::RequestBuilder> {
        let token = self.auth.token()?;
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(%method, path, %request_id, "Lead API request");
        Ok(self
            .client
            .request(method, self.url(path))
            .bearer_auth(token)
            .header(REQUEST_ID_HEADER, request_id))
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ClientError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl LeadBackend for HttpLeadBackend {
    async fn query_leads(&self, query: &LeadQuery) -> ClientResult<LeadPage> {
        let response = self
            .request(reqwest::Method::GET, "/leads")?
            .query(query)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn filter_options(&self) -> ClientResult<Value> {
        let response = self
            .request(reqwest::Method::GET, "/leads/filter-options")?
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn allocate(&self, request: &AllocateRequest) -> ClientResult<ActionReply> {
        let response = self
            .request(reqwest::Method::POST, "/leads/allocate")?
            .json(request)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn discover_bulk_allocation(
        &self,
        campaign_id: Option<CampaignId>,
    ) -> ClientResult<BulkAllocationCandidates> {
        let mut request = self.request(reqwest::Method::GET, "/leads/bulk-allocate")?;
        if let Some(campaign_id) = campaign_id {
            request = request.query(&[("campaignId", campaign_id)]);
        }
        let response = request.send().await?;
        Self::parse_response(response).await
    }

    async fn bulk_allocate(&self, request: &BulkAllocateRequest) -> ClientResult<ActionReply> {
        let response = self
            .request(reqwest::Method::POST, "/leads/bulk-allocate")?
            .json(request)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn transfer(&self, request: &TransferRequest) -> ClientResult<TransferReply> {
        let response = self
            .request(reqwest::Method::POST, "/leads/transfer")?
            .json(request)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn import_leads(&self, upload: &ImportUpload) -> ClientResult<ImportResponse> {
        let part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        let form = Form::new()
            .part("file", part)
            .text("campaignId", upload.campaign_id.to_string());
        let response = self
            .request(reqwest::Method::POST, "/leads/import")?
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn update_status(
        &self,
        payload: &StatusUpdatePayload,
    ) -> ClientResult<StatusUpdateResponse> {
        let response = self
            .request(reqwest::Method::POST, "/leads/status")?
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use leadconsole_core::error::CoreError;

    #[test]
    fn trailing_slash_is_trimmed() {
        let backend = HttpLeadBackend::with_client(
            reqwest::Client::new(),
            "http://localhost:8000/api/",
            AuthContext::anonymous(),
        );
        assert_eq!(backend.api_url(), "http://localhost:8000/api");
        assert_eq!(backend.url("/leads"), "http://localhost:8000/api/leads");
    }

    #[test]
    fn new_does_not_panic() {
        assert!(HttpLeadBackend::new(&ClientConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn anonymous_requests_fail_before_io() {
        // Port 9 (discard) would fail at transport level if a request were sent.
        let backend = HttpLeadBackend::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            AuthContext::anonymous(),
        );
        assert_matches!(
            backend.query_leads(&LeadQuery::unfiltered(1, 10)).await,
            Err(ClientError::Core(CoreError::Unauthorized(_)))
        );
    }
}
