//! Filter option lists (users, campaigns, statuses, teams).
//!
//! Options come from one of two places depending on source mode:
//!
//! - [`normalize_options`] turns the backend's filter-options payload into
//!   typed lists, accepting the several row shapes the backend emits.
//! - [`derive_options`] scans a client-mode backing set.
//!
//! Either way every list starts with the dimension's "All X" sentinel and is
//! deduplicated by name (case-insensitive, first spelling wins) in first-seen
//! order. Malformed input yields sentinel-only lists, never an error.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::{FilterDimension, ALL_VALUE};
use crate::lead::Lead;
use crate::types::DbId;
use crate::wire::value_to_id;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One selectable filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: String,
    pub name: String,
    /// Display color (statuses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Reporting stage (statuses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl FilterOption {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: None,
            stage: None,
        }
    }

    /// The "All X" entry for `dimension`.
    pub fn sentinel(dimension: FilterDimension) -> Self {
        Self::new(ALL_VALUE, dimension.sentinel_label())
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == ALL_VALUE
    }
}

/// Option lists for every filter dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub users: Vec<FilterOption>,
    pub campaigns: Vec<FilterOption>,
    pub statuses: Vec<FilterOption>,
    pub teams: Vec<FilterOption>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self::empty()
    }
}

impl FilterOptions {
    /// Sentinel-only lists.
    pub fn empty() -> Self {
        Self {
            users: vec![FilterOption::sentinel(FilterDimension::Assignee)],
            campaigns: vec![FilterOption::sentinel(FilterDimension::Campaign)],
            statuses: vec![FilterOption::sentinel(FilterDimension::Status)],
            teams: vec![FilterOption::sentinel(FilterDimension::Team)],
        }
    }

    pub fn for_dimension(&self, dimension: FilterDimension) -> &[FilterOption] {
        match dimension {
            FilterDimension::Assignee => &self.users,
            FilterDimension::Campaign => &self.campaigns,
            FilterDimension::Status => &self.statuses,
            FilterDimension::Team => &self.teams,
        }
    }

    /// Whether every list holds only its sentinel.
    pub fn is_empty(&self) -> bool {
        FilterDimension::ALL
            .iter()
            .all(|d| self.for_dimension(*d).iter().all(FilterOption::is_sentinel))
    }

    pub fn status_lookup(&self) -> StatusLookup {
        StatusLookup::new(&self.statuses)
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Accumulates options for one dimension, deduplicating by name.
struct OptionCollector {
    seen: HashSet<String>,
    options: Vec<FilterOption>,
}

impl OptionCollector {
    fn new(dimension: FilterDimension) -> Self {
        Self {
            seen: HashSet::new(),
            options: vec![FilterOption::sentinel(dimension)],
        }
    }

    fn push(&mut self, option: FilterOption) {
        let name = option.name.trim();
        if name.is_empty() {
            return;
        }
        let key = name.to_lowercase();
        // A backend row literally named "All Users" would collide with the
        // sentinel; keep the sentinel.
        if self.options[0].name.to_lowercase() == key {
            return;
        }
        if self.seen.insert(key) {
            self.options.push(FilterOption {
                name: name.to_string(),
                ..option
            });
        }
    }

    fn finish(self) -> Vec<FilterOption> {
        self.options
    }
}

/// Derive option lists from the denormalized fields of a backing set.
pub fn derive_options(leads: &[Lead]) -> FilterOptions {
    let mut users = OptionCollector::new(FilterDimension::Assignee);
    let mut campaigns = OptionCollector::new(FilterDimension::Campaign);
    let mut statuses = OptionCollector::new(FilterDimension::Status);
    let mut teams = OptionCollector::new(FilterDimension::Team);

    for lead in leads {
        if let Some(name) = lead.username.as_deref() {
            users.push(FilterOption::new(id_or_name(lead.assigned_user_id, name), name));
        }
        if let Some(name) = lead.campaign_name.as_deref() {
            campaigns.push(FilterOption::new(id_or_name(lead.campaign_id, name), name));
        }
        if let Some(name) = lead.status_name.as_deref() {
            statuses.push(FilterOption {
                color: lead.status_color.clone(),
                stage: lead.stage.clone(),
                ..FilterOption::new(id_or_name(lead.status_id, name), name)
            });
        }
        if let Some(name) = lead.team_name.as_deref() {
            teams.push(FilterOption::new(id_or_name(lead.team_id, name), name));
        }
    }

    FilterOptions {
        users: users.finish(),
        campaigns: campaigns.finish(),
        statuses: statuses.finish(),
        teams: teams.finish(),
    }
}

fn id_or_name(id: Option<DbId>, name: &str) -> String {
    id.map(|id| id.to_string())
        .unwrap_or_else(|| name.trim().to_string())
}

// ---------------------------------------------------------------------------
// Normalization of the backend payload
// ---------------------------------------------------------------------------

/// Keys a backend row may use, per dimension.
struct RowKeys {
    list: &'static [&'static str],
    id: &'static [&'static str],
    name: &'static [&'static str],
}

fn row_keys(dimension: FilterDimension) -> RowKeys {
    match dimension {
        FilterDimension::Assignee => RowKeys {
            list: &["users"],
            id: &["id", "userId", "user_id"],
            name: &["name", "username", "userName", "user_name"],
        },
        FilterDimension::Campaign => RowKeys {
            list: &["campaigns"],
            id: &["id", "campaignId", "campaign_id"],
            name: &["name", "campaignName", "campaign_name"],
        },
        FilterDimension::Status => RowKeys {
            list: &["status", "statuses"],
            id: &["id", "statusId", "status_id"],
            name: &["name", "statusName", "status_name"],
        },
        FilterDimension::Team => RowKeys {
            list: &["teams"],
            id: &["id", "teamId", "team_id"],
            name: &["name", "teamName", "team_name"],
        },
    }
}

const COLOR_KEYS: &[&str] = &["color", "statusColor", "status_color"];
const STAGE_KEYS: &[&str] = &["stage", "stageName", "stage_name"];

/// First key present with a usable text value (numbers are stringified).
fn text_field(row: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match row.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn normalize_row(dimension: FilterDimension, row: &Value) -> Option<FilterOption> {
    let keys = row_keys(dimension);
    let option = match row {
        // Some endpoints send bare names.
        Value::String(name) => FilterOption::new(name.trim(), name.trim()),
        Value::Object(map) => {
            let name = text_field(map, keys.name)?;
            let id = keys
                .id
                .iter()
                .find_map(|key| map.get(*key).and_then(value_to_id))
                .map(|id| id.to_string())
                .or_else(|| text_field(map, keys.id))
                .unwrap_or_else(|| name.clone());
            FilterOption {
                id,
                name,
                color: text_field(map, COLOR_KEYS),
                stage: text_field(map, STAGE_KEYS),
            }
        }
        _ => return None,
    };
    Some(option)
}

/// Normalize the backend's `{users, teams, campaigns, status}` payload.
pub fn normalize_options(payload: &Value) -> FilterOptions {
    // Accept both a bare object and one wrapped in `{ "data": ... }`.
    let root = payload.get("data").filter(|v| v.is_object()).unwrap_or(payload);

    let collect = |dimension: FilterDimension| {
        let mut collector = OptionCollector::new(dimension);
        let rows = row_keys(dimension)
            .list
            .iter()
            .find_map(|key| root.get(*key).and_then(Value::as_array));
        let mut dropped = 0usize;
        for row in rows.into_iter().flatten() {
            match normalize_row(dimension, row) {
                Some(option) => collector.push(option),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::warn!(?dimension, dropped, "Skipped malformed filter option rows");
        }
        collector.finish()
    };

    FilterOptions {
        users: collect(FilterDimension::Assignee),
        campaigns: collect(FilterDimension::Campaign),
        statuses: collect(FilterDimension::Status),
        teams: collect(FilterDimension::Team),
    }
}

// ---------------------------------------------------------------------------
// StatusLookup
// ---------------------------------------------------------------------------

/// Status entries indexed by id and by name.
///
/// This is the source of truth for a lead's status color and stage; the
/// copies denormalized onto the lead are only a fallback.
#[derive(Debug, Clone, Default)]
pub struct StatusLookup {
    by_id: HashMap<String, FilterOption>,
    by_name: HashMap<String, FilterOption>,
}

impl StatusLookup {
    pub fn new(statuses: &[FilterOption]) -> Self {
        let mut lookup = Self::default();
        for status in statuses.iter().filter(|s| !s.is_sentinel()) {
            lookup.by_id.insert(status.id.clone(), status.clone());
            lookup
                .by_name
                .insert(status.name.to_lowercase(), status.clone());
        }
        lookup
    }

    /// The status entry a lead refers to, by id first, then by name.
    pub fn resolve(&self, lead: &Lead) -> Option<&FilterOption> {
        lead.status_id
            .and_then(|id| self.by_id.get(&id.to_string()))
            .or_else(|| {
                lead.status_name
                    .as_deref()
                    .and_then(|name| self.by_name.get(&name.trim().to_lowercase()))
            })
    }

    /// Whether the lead's status is a known entry.
    pub fn is_known(&self, lead: &Lead) -> bool {
        self.resolve(lead).is_some()
    }

    pub fn color_for<'a>(&'a self, lead: &'a Lead) -> Option<&'a str> {
        match self.resolve(lead) {
            Some(status) => status.color.as_deref(),
            None => lead.status_color.as_deref(),
        }
    }

    pub fn stage_for<'a>(&'a self, lead: &'a Lead) -> Option<&'a str> {
        match self.resolve(lead) {
            Some(status) => status.stage.as_deref(),
            None => lead.stage.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
