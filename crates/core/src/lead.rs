//! The lead record as returned by the backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{CampaignId, LeadId, StatusId, TeamId, Timestamp, UserId};
use crate::wire;

/// A sales prospect tracked through the contact/status pipeline.
///
/// `status_name`, `status_color`, `username`, `campaign_name` and
/// `team_name` are denormalized copies supplied by the backend for display.
/// Status color and stage should be resolved through
/// [`StatusLookup`](crate::options::StatusLookup) rather than read from the
/// copies directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(alias = "id", deserialize_with = "wire::id")]
    pub lead_id: LeadId,

    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub detail: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub remarks: Option<String>,

    #[serde(default, deserialize_with = "wire::opt_id")]
    pub campaign_id: Option<CampaignId>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub campaign_name: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_id")]
    pub status_id: Option<StatusId>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub status_name: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub status_color: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub stage: Option<String>,

    #[serde(default, deserialize_with = "wire::opt_id")]
    pub assigned_user_id: Option<UserId>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_id")]
    pub team_id: Option<TeamId>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub team_name: Option<String>,

    #[serde(default, deserialize_with = "wire::flag")]
    pub followup_enabled: bool,
    #[serde(default, deserialize_with = "wire::opt_date")]
    pub followup_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub activity: Option<String>,

    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub added_by: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub updated_by: Option<String>,
}

impl Lead {
    /// A lead with only its id and name set. Handy for building fixtures and
    /// for optimistic placeholders.
    pub fn new(lead_id: LeadId, name: impl Into<String>) -> Self {
        Self {
            lead_id,
            name: name.into(),
            phone: None,
            email: None,
            address: None,
            purpose: None,
            detail: None,
            remarks: None,
            campaign_id: None,
            campaign_name: None,
            status_id: None,
            status_name: None,
            status_color: None,
            stage: None,
            assigned_user_id: None,
            username: None,
            team_id: None,
            team_name: None,
            followup_enabled: false,
            followup_date: None,
            activity: None,
            created_at: None,
            updated_at: None,
            added_by: None,
            updated_by: None,
        }
    }

    pub fn with_campaign(mut self, id: CampaignId, name: impl Into<String>) -> Self {
        self.campaign_id = Some(id);
        self.campaign_name = Some(name.into());
        self
    }

    pub fn with_status(mut self, id: StatusId, name: impl Into<String>) -> Self {
        self.status_id = Some(id);
        self.status_name = Some(name.into());
        self
    }

    pub fn with_owner(mut self, id: UserId, username: impl Into<String>) -> Self {
        self.assigned_user_id = Some(id);
        self.username = Some(username.into());
        self
    }

    pub fn with_team(mut self, id: TeamId, name: impl Into<String>) -> Self {
        self.team_id = Some(id);
        self.team_name = Some(name.into());
        self
    }

    pub fn with_contact(mut self, phone: impl Into<String>, email: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self.email = Some(email.into());
        self
    }

    /// Whether the lead currently has no owner.
    pub fn is_unassigned(&self) -> bool {
        self.assigned_user_id.is_none()
    }
}
