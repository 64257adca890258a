//! Lead transfer: reassign every lead matching a predicate to one target.
//!
//! Unlike allocation this is not a partition. All matches go to the same
//! user and/or team. An all-sentinel predicate matches the whole lead set;
//! that is allowed, and the plan reports it through
//! [`TransferPlan::matches_all`] so the count can be shown before the
//! operator confirms.

use serde::Serialize;

use crate::error::CoreError;
use crate::filter::{FilterDimension, FilterValue};
use crate::lead::Lead;
use crate::types::{LeadId, TeamId, UserId};

/// Which leads to move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferCriteria {
    pub from_user: FilterValue,
    pub from_status: FilterValue,
    pub from_campaign: FilterValue,
}

impl TransferCriteria {
    /// Build criteria from raw UI values (`"all"` / "All X" mean no
    /// constraint).
    pub fn parse(from_user: &str, from_status: &str, from_campaign: &str) -> Self {
        Self {
            from_user: FilterValue::parse(FilterDimension::Assignee, from_user),
            from_status: FilterValue::parse(FilterDimension::Status, from_status),
            from_campaign: FilterValue::parse(FilterDimension::Campaign, from_campaign),
        }
    }

    /// `true` when no field constrains the match.
    pub fn matches_all(&self) -> bool {
        self.from_user.is_all() && self.from_status.is_all() && self.from_campaign.is_all()
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        [
            (&self.from_user, FilterDimension::Assignee),
            (&self.from_status, FilterDimension::Status),
            (&self.from_campaign, FilterDimension::Campaign),
        ]
        .into_iter()
        .all(|(value, dimension)| {
            let (name, id) = dimension.lead_field(lead);
            value.matches(name, id)
        })
    }
}

/// Where transferred leads go. At least one of user or team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTarget {
    pub user_id: Option<UserId>,
    pub team_id: Option<TeamId>,
}

impl TransferTarget {
    pub fn new(user_id: Option<UserId>, team_id: Option<TeamId>) -> Result<Self, CoreError> {
        if user_id.is_none() && team_id.is_none() {
            return Err(CoreError::Configuration(
                "A transfer needs a target user or team".to_string(),
            ));
        }
        Ok(Self { user_id, team_id })
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            team_id: None,
        }
    }

    pub fn team(team_id: TeamId) -> Self {
        Self {
            user_id: None,
            team_id: Some(team_id),
        }
    }
}

/// The leads a transfer would move, ready for preview and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPlan {
    pub lead_ids: Vec<LeadId>,
    pub target: TransferTarget,
    /// The criteria had no constraint; every lead in scope was selected.
    pub matches_all: bool,
    /// How many leads were evaluated.
    pub scanned: usize,
}

impl TransferPlan {
    /// Number of leads that would move ("Total Lead" preview).
    pub fn total(&self) -> usize {
        self.lead_ids.len()
    }

    /// Reject plans that would send an empty request.
    pub fn ensure_executable(&self) -> Result<(), CoreError> {
        if self.lead_ids.is_empty() {
            return Err(CoreError::Configuration(
                "No leads match the transfer criteria".to_string(),
            ));
        }
        Ok(())
    }
}

/// Select every lead in `leads` matching `criteria`.
pub fn plan_transfer(
    leads: &[Lead],
    criteria: &TransferCriteria,
    target: TransferTarget,
) -> TransferPlan {
    let lead_ids: Vec<LeadId> = leads
        .iter()
        .filter(|lead| criteria.matches(lead))
        .map(|lead| lead.lead_id)
        .collect();

    if criteria.matches_all() {
        tracing::warn!(
            total = lead_ids.len(),
            "Transfer criteria are unconstrained; every lead is selected"
        );
    }

    TransferPlan {
        lead_ids,
        target,
        matches_all: criteria.matches_all(),
        scanned: leads.len(),
    }
}
