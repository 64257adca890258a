//! Round-robin allocation of leads to assignees.
//!
//! The planner only partitions the ids it is given. Discovering which leads
//! are eligible (e.g. unowned leads of a campaign) is the backend's job.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{LeadId, UserId};

/// One lead → assignee pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub lead_id: LeadId,
    pub assignee_id: UserId,
}

/// All leads going to one assignee, in candidate order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBatch {
    pub assignee_id: UserId,
    pub lead_ids: Vec<LeadId>,
}

/// A complete partition of the candidate leads.
///
/// Per-assignee counts differ by at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
    assignees: Vec<UserId>,
    assignments: Vec<Assignment>,
}

impl AllocationPlan {
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Distinct assignees in the order they receive leads.
    pub fn assignees(&self) -> &[UserId] {
        &self.assignees
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn assignee_for(&self, lead_id: LeadId) -> Option<UserId> {
        self.assignments
            .iter()
            .find(|a| a.lead_id == lead_id)
            .map(|a| a.assignee_id)
    }

    /// Lead count per assignee, in assignee order. Assignees that receive
    /// nothing (fewer leads than assignees) are listed with zero.
    pub fn counts(&self) -> Vec<(UserId, usize)> {
        self.assignees
            .iter()
            .map(|assignee| {
                let n = self
                    .assignments
                    .iter()
                    .filter(|a| a.assignee_id == *assignee)
                    .count();
                (*assignee, n)
            })
            .collect()
    }

    /// Group the plan into one batch per assignee, skipping assignees with
    /// no leads. Each batch maps onto one single-allocate request.
    pub fn batches(&self) -> Vec<AllocationBatch> {
        self.assignees
            .iter()
            .map(|assignee| AllocationBatch {
                assignee_id: *assignee,
                lead_ids: self
                    .assignments
                    .iter()
                    .filter(|a| a.assignee_id == *assignee)
                    .map(|a| a.lead_id)
                    .collect(),
            })
            .filter(|batch| !batch.lead_ids.is_empty())
            .collect()
    }
}

/// Keep the first occurrence of every id, preserving order.
fn dedup_in_order(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Assign the i-th candidate to `assignees[i mod K]`.
///
/// Duplicate ids in either input are collapsed to their first occurrence.
/// No candidates gives an empty plan; no assignees is a configuration
/// error, returned before anything else happens.
pub fn plan_allocation(
    candidates: &[LeadId],
    assignees: &[UserId],
) -> Result<AllocationPlan, CoreError> {
    let assignees = dedup_in_order(assignees);
    if assignees.is_empty() {
        return Err(CoreError::Configuration(
            "At least one assignee is required to allocate leads".to_string(),
        ));
    }

    let assignments: Vec<Assignment> = dedup_in_order(candidates)
        .into_iter()
        .enumerate()
        .map(|(i, lead_id)| Assignment {
            lead_id,
            assignee_id: assignees[i % assignees.len()],
        })
        .collect();

    tracing::debug!(
        leads = assignments.len(),
        assignees = assignees.len(),
        "Computed allocation plan"
    );

    Ok(AllocationPlan {
        assignees,
        assignments,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
