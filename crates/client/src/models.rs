//! Request and response bodies of the action endpoints.
//!
//! The list, options, import and status bodies live in `leadconsole_core`
//! next to the logic that interprets them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use leadconsole_core::filter::FilterDimension;
use leadconsole_core::options::{normalize_options, FilterOption};
use leadconsole_core::types::{CampaignId, LeadId, TeamId, UserId};
use leadconsole_core::wire;

use crate::error::ClientError;

// ---------------------------------------------------------------------------
// Shared reply
// ---------------------------------------------------------------------------

/// `{result, message}` reply shared by the allocation endpoints. Bulk
/// execution answers with `success` instead of `result`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionReply {
    #[serde(default, alias = "success", deserialize_with = "wire::flag")]
    pub result: bool,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub message: Option<String>,
}

impl ActionReply {
    /// `Rejected` when the backend reported failure.
    pub fn into_result(self) -> Result<Self, ClientError> {
        if self.result {
            Ok(self)
        } else {
            Err(ClientError::rejected(
                self.message
                    .unwrap_or_else(|| "The server rejected the request".to_string()),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Body of the single-allocate endpoint. Lead ids travel comma-joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateRequest {
    pub lead_ids: String,
    pub assignee_id: UserId,
}

impl AllocateRequest {
    pub fn new(lead_ids: &[LeadId], assignee_id: UserId) -> Self {
        Self {
            lead_ids: wire::join_ids(lead_ids),
            assignee_id,
        }
    }
}

/// Reply of bulk-allocation discovery: what can be allocated for a
/// campaign and to whom.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAllocationCandidates {
    #[serde(default)]
    pub campaigns: Value,
    #[serde(default)]
    pub users: Value,
    #[serde(default, deserialize_with = "wire::id_list")]
    pub lead_ids: Vec<LeadId>,
}

impl BulkAllocationCandidates {
    /// Campaign choices, normalized like filter options (sentinel first).
    pub fn campaign_options(&self) -> Vec<FilterOption> {
        options_of(FilterDimension::Campaign, "campaigns", &self.campaigns)
    }

    /// Assignable users, sentinel excluded.
    pub fn user_options(&self) -> Vec<FilterOption> {
        options_of(FilterDimension::Assignee, "users", &self.users)
            .into_iter()
            .filter(|option| !option.is_sentinel())
            .collect()
    }
}

fn options_of(dimension: FilterDimension, key: &str, rows: &Value) -> Vec<FilterOption> {
    let mut payload = serde_json::Map::new();
    payload.insert(key.to_string(), rows.clone());
    normalize_options(&Value::Object(payload))
        .for_dimension(dimension)
        .to_vec()
}

/// Body of bulk-allocation execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAllocateRequest {
    pub campaign_id: CampaignId,
    pub lead_ids: String,
    pub user_ids: Vec<UserId>,
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub lead_ids: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReply {
    #[serde(default, alias = "result", deserialize_with = "wire::flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_id")]
    pub transferred_count: Option<i64>,
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// A file ready to be posted to the import endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub campaign_id: CampaignId,
}

impl ImportUpload {
    /// Lowercased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }
}
