//! Resolution of the visible lead page in either source mode.
//!
//! [`resolve`] is the single entry point: given the filter state and either a
//! backend page (server mode) or the full backing set (client mode) it
//! produces the same [`ListView`] shape, so callers never branch on mode to
//! render.

use serde::{Deserialize, Deserializer, Serialize};

use crate::filter::FilterState;
use crate::lead::Lead;
use crate::pagination::{page_bounds, PaginationInfo};

// ---------------------------------------------------------------------------
// Backend page
// ---------------------------------------------------------------------------

/// Response body of the lead query endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPage {
    #[serde(default = "default_result")]
    pub result: bool,
    #[serde(default, deserialize_with = "leads_skipping_invalid")]
    pub data: Vec<Lead>,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_result() -> bool {
    true
}

/// Decode the `data` array row by row, dropping rows that are not leads
/// instead of failing the page.
fn leads_skipping_invalid<'de, D>(deserializer: D) -> Result<Vec<Lead>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    let total = rows.len();
    let leads: Vec<Lead> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    if leads.len() < total {
        tracing::warn!(
            skipped = total - leads.len(),
            total,
            "Dropped malformed lead rows from page"
        );
    }
    Ok(leads)
}

impl LeadPage {
    /// Pagination exactly as the backend reported it.
    pub fn pagination(&self) -> PaginationInfo {
        PaginationInfo {
            current_page: self.current_page,
            page_size: self.per_page,
            total_records: self.total_records,
            total_pages: self.total_pages,
        }
    }

    /// Whether this is the last page of the result set.
    pub fn is_last(&self) -> bool {
        self.data.is_empty() || self.current_page >= self.total_pages
    }
}

// ---------------------------------------------------------------------------
// ListView
// ---------------------------------------------------------------------------

/// The visible page: items plus pagination, independent of source mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub items: Vec<Lead>,
    pub pagination: PaginationInfo,
}

impl ListView {
    /// No items, page 1 of 1. The state after a failed fetch.
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: PaginationInfo::reset(page_size),
        }
    }
}

/// Where the items for [`resolve`] come from.
#[derive(Debug)]
pub enum ListSource<'a> {
    /// A page already filtered and paginated by the backend.
    Server(LeadPage),
    /// The full, unfiltered backing set.
    Client(&'a [Lead]),
}

/// Produce the visible page for `filter`.
pub fn resolve(filter: &FilterState, source: ListSource<'_>) -> ListView {
    match source {
        ListSource::Server(page) => resolve_server(page),
        ListSource::Client(backing) => resolve_client(filter, backing),
    }
}

/// Server mode: trust the backend page verbatim.
pub fn resolve_server(page: LeadPage) -> ListView {
    let pagination = page.pagination();
    ListView {
        items: page.data,
        pagination,
    }
}

/// Client mode: filter the backing set, then slice out the requested page.
pub fn resolve_client(filter: &FilterState, backing: &[Lead]) -> ListView {
    let filtered: Vec<&Lead> = backing.iter().filter(|lead| filter.matches(lead)).collect();
    let bounds = page_bounds(filter.page(), filter.page_size(), filtered.len());
    let items = filtered[bounds].iter().map(|lead| (*lead).clone()).collect();

    ListView {
        items,
        pagination: PaginationInfo::compute(
            filter.page(),
            filter.page_size(),
            filtered.len() as u64,
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
