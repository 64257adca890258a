//! Filter selections, the pagination cursor, and the shared lead predicate.
//!
//! Both list modes speak the same filter vocabulary. In server mode a
//! [`FilterState`] becomes a [`LeadQuery`]; in client mode the same state is
//! evaluated locally with [`FilterState::matches`]. Sentinel values ("All
//! Users", "All Campaigns", ...) mean "no constraint" in both.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::lead::Lead;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Page sizes the list screen offers.
pub const PAGE_SIZES: &[u32] = &[10, 25, 50, 100];

/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Raw filter value that means "no constraint" regardless of dimension.
pub const ALL_VALUE: &str = "all";

/// Check whether a page size is one the list screen offers.
pub fn is_valid_page_size(size: u32) -> bool {
    PAGE_SIZES.contains(&size)
}

// ---------------------------------------------------------------------------
// SourceMode
// ---------------------------------------------------------------------------

/// Where filtering and pagination are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// The backend filters and paginates per request.
    #[default]
    Server,
    /// The full lead set is fetched once and filtered locally.
    Client,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "client" => Ok(Self::Client),
            other => Err(CoreError::Configuration(format!(
                "Unknown source mode '{other}' (expected 'server' or 'client')"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterDimension / FilterValue
// ---------------------------------------------------------------------------

/// One of the four filterable lead attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDimension {
    Assignee,
    Campaign,
    Status,
    Team,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 4] = [
        FilterDimension::Assignee,
        FilterDimension::Campaign,
        FilterDimension::Status,
        FilterDimension::Team,
    ];

    /// Display label of the "no constraint" option.
    pub fn sentinel_label(&self) -> &'static str {
        match self {
            Self::Assignee => "All Users",
            Self::Campaign => "All Campaigns",
            Self::Status => "All Statuses",
            Self::Team => "All Teams",
        }
    }

    /// Query-string key used by the lead query endpoint.
    pub fn query_key(&self) -> &'static str {
        match self {
            Self::Assignee => "userFilter",
            Self::Campaign => "campaignFilter",
            Self::Status => "statusFilter",
            Self::Team => "teamFilter",
        }
    }

    /// The denormalized name and the id a lead carries for this dimension.
    pub fn lead_field<'a>(&self, lead: &'a Lead) -> (Option<&'a str>, Option<DbId>) {
        match self {
            Self::Assignee => (lead.username.as_deref(), lead.assigned_user_id),
            Self::Campaign => (lead.campaign_name.as_deref(), lead.campaign_id),
            Self::Status => (lead.status_name.as_deref(), lead.status_id),
            Self::Team => (lead.team_name.as_deref(), lead.team_id),
        }
    }
}

/// A single filter selection: the sentinel or one concrete name/id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterValue {
    #[default]
    All,
    Only(String),
}

impl FilterValue {
    /// Interpret a raw UI value for `dimension`.
    ///
    /// The dimension's sentinel label, `"all"`, and blank input all map to
    /// [`FilterValue::All`] (case-insensitive).
    pub fn parse(dimension: FilterDimension, raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case(ALL_VALUE)
            || trimmed.eq_ignore_ascii_case(dimension.sentinel_label())
        {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    pub fn only(value: impl Into<String>) -> Self {
        Self::Only(value.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// The concrete constraint, or `None` for the sentinel.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(v) => Some(v),
        }
    }

    /// Case-insensitive exact match against a denormalized name, or against
    /// the entity id rendered as text.
    pub fn matches(&self, name: Option<&str>, id: Option<DbId>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => {
                name.is_some_and(|n| n.trim().eq_ignore_ascii_case(wanted))
                    || id.is_some_and(|id| id.to_string() == *wanted)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FilterState
// ---------------------------------------------------------------------------

/// Active filter selections plus the pagination cursor.
///
/// Any change to a filter field or the search term resets `page` to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    assignee: FilterValue,
    campaign: FilterValue,
    status: FilterValue,
    team: FilterValue,
    search: Option<String>,
    page: u32,
    page_size: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            assignee: FilterValue::All,
            campaign: FilterValue::All,
            status: FilterValue::All,
            team: FilterValue::All,
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterState {
    /// Default state with the given page size.
    pub fn with_page_size(page_size: u32) -> Result<Self, CoreError> {
        let mut state = Self::default();
        state.set_page_size(page_size)?;
        Ok(state)
    }

    pub fn get(&self, dimension: FilterDimension) -> &FilterValue {
        match dimension {
            FilterDimension::Assignee => &self.assignee,
            FilterDimension::Campaign => &self.campaign,
            FilterDimension::Status => &self.status,
            FilterDimension::Team => &self.team,
        }
    }

    /// Set one filter field and reset the page.
    pub fn set(&mut self, dimension: FilterDimension, value: FilterValue) {
        let slot = match dimension {
            FilterDimension::Assignee => &mut self.assignee,
            FilterDimension::Campaign => &mut self.campaign,
            FilterDimension::Status => &mut self.status,
            FilterDimension::Team => &mut self.team,
        };
        *slot = value;
        self.page = 1;
    }

    /// Builder form of [`set`](Self::set).
    pub fn filtered(mut self, dimension: FilterDimension, value: FilterValue) -> Self {
        self.set(dimension, value);
        self
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Set the free-text search term (blank clears it) and reset the page.
    pub fn set_search(&mut self, term: Option<&str>) {
        self.search = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self.page = 1;
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Move the cursor. Pages are 1-based.
    pub fn set_page(&mut self, page: u32) -> Result<(), CoreError> {
        if page == 0 {
            return Err(CoreError::Validation("Page numbers start at 1".to_string()));
        }
        self.page = page;
        Ok(())
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Change the page size (must be one of [`PAGE_SIZES`]) and reset the page.
    pub fn set_page_size(&mut self, page_size: u32) -> Result<(), CoreError> {
        if !is_valid_page_size(page_size) {
            return Err(CoreError::Validation(format!(
                "Page size {page_size} is not one of {PAGE_SIZES:?}"
            )));
        }
        self.page_size = page_size;
        self.page = 1;
        Ok(())
    }

    /// Clear every filter and the search term, keeping the page size.
    pub fn reset(&mut self) {
        *self = Self {
            page_size: self.page_size,
            ..Self::default()
        };
    }

    /// `true` when every dimension is the sentinel and there is no search.
    pub fn is_unconstrained(&self) -> bool {
        FilterDimension::ALL.iter().all(|d| self.get(*d).is_all()) && self.search.is_none()
    }

    /// The client-mode predicate. A lead matches when every non-sentinel
    /// dimension matches and the search term (if any) is a case-insensitive
    /// substring of its name, phone, or email.
    pub fn matches(&self, lead: &Lead) -> bool {
        let dimensions_match = FilterDimension::ALL.iter().all(|dimension| {
            let (name, id) = dimension.lead_field(lead);
            self.get(*dimension).matches(name, id)
        });
        dimensions_match && self.matches_search(lead)
    }

    fn matches_search(&self, lead: &Lead) -> bool {
        let Some(term) = self.search.as_deref() else {
            return true;
        };
        let needle = term.to_lowercase();
        [Some(lead.name.as_str()), lead.phone.as_deref(), lead.email.as_deref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Translate into a backend query. Sentinels are omitted.
    pub fn to_query(&self) -> LeadQuery {
        let constraint = |d: FilterDimension| self.get(d).constraint().map(str::to_string);
        LeadQuery {
            page: self.page,
            per_page: self.page_size,
            user_filter: constraint(FilterDimension::Assignee),
            campaign_filter: constraint(FilterDimension::Campaign),
            status_filter: constraint(FilterDimension::Status),
            team_filter: constraint(FilterDimension::Team),
            search: self.search.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// LeadQuery
// ---------------------------------------------------------------------------

/// Query parameters of the lead listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadQuery {
    pub page: u32,
    pub per_page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl LeadQuery {
    /// An unfiltered query for one page; used to walk the full lead set.
    pub fn unfiltered(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            user_filter: None,
            campaign_filter: None,
            status_filter: None,
            team_filter: None,
            search: None,
        }
    }

    /// Rebuild the filter state this query encodes, without the cursor.
    ///
    /// Lets a backend (or a test double of one) evaluate the query with the
    /// same predicate client mode uses.
    pub fn filter_state(&self) -> FilterState {
        let constraints = [
            (FilterDimension::Assignee, &self.user_filter),
            (FilterDimension::Campaign, &self.campaign_filter),
            (FilterDimension::Status, &self.status_filter),
            (FilterDimension::Team, &self.team_filter),
        ];
        let mut state = FilterState::default();
        for (dimension, raw) in constraints {
            if let Some(raw) = raw.as_deref() {
                state.set(dimension, FilterValue::parse(dimension, raw));
            }
        }
        state.set_search(self.search.as_deref());
        state
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn lead() -> Lead {
        Lead::new(1, "Kiran Shah")
            .with_contact("9000000001", "kiran@example.com")
            .with_campaign(4, "Summer Promo")
            .with_status(2, "Interested")
            .with_owner(7, "anita")
            .with_team(3, "North")
    }

    #[test]
    fn sentinel_labels_parse_as_all() {
        for d in FilterDimension::ALL {
            assert!(FilterValue::parse(d, d.sentinel_label()).is_all());
            assert!(FilterValue::parse(d, "ALL").is_all());
            assert!(FilterValue::parse(d, "  ").is_all());
        }
        assert_eq!(
            FilterValue::parse(FilterDimension::Campaign, " Summer Promo "),
            FilterValue::only("Summer Promo")
        );
    }

    #[test]
    fn every_filter_change_resets_page() {
        for d in FilterDimension::ALL {
            let mut state = FilterState::default();
            state.set_page(7).unwrap();
            state.set(d, FilterValue::only("x"));
            assert_eq!(state.page(), 1, "dimension {d:?}");

            state.set_page(4).unwrap();
            state.set(d, FilterValue::All);
            assert_eq!(state.page(), 1, "dimension {d:?}");
        }

        let mut state = FilterState::default();
        state.set_page(3).unwrap();
        state.set_search(Some("kiran"));
        assert_eq!(state.page(), 1);

        state.set_page(3).unwrap();
        state.set_page_size(25).unwrap();
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn page_zero_is_rejected() {
        let mut state = FilterState::default();
        assert_matches!(state.set_page(0), Err(CoreError::Validation(_)));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn unknown_page_size_is_rejected() {
        let mut state = FilterState::default();
        assert_matches!(state.set_page_size(13), Err(CoreError::Validation(_)));
        assert_eq!(state.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn all_sentinel_state_matches_every_lead() {
        let state = FilterState::default();
        assert!(state.is_unconstrained());
        assert!(state.matches(&lead()));
        assert!(state.matches(&Lead::new(2, "")));
    }

    #[test]
    fn matches_are_case_insensitive_and_exact() {
        let state = FilterState::default()
            .filtered(FilterDimension::Campaign, FilterValue::only("summer promo"))
            .filtered(FilterDimension::Assignee, FilterValue::only("ANITA"));
        assert!(state.matches(&lead()));

        let partial = FilterState::default()
            .filtered(FilterDimension::Campaign, FilterValue::only("Summer"));
        assert!(!partial.matches(&lead()));
    }

    #[test]
    fn id_text_matches_too() {
        let state =
            FilterState::default().filtered(FilterDimension::Status, FilterValue::only("2"));
        assert!(state.matches(&lead()));
    }

    #[test]
    fn constrained_dimension_rejects_missing_field() {
        let state =
            FilterState::default().filtered(FilterDimension::Team, FilterValue::only("North"));
        assert!(!state.matches(&Lead::new(9, "No team")));
    }

    #[test]
    fn search_matches_name_phone_or_email() {
        let mut state = FilterState::default();
        state.set_search(Some("kIrAn"));
        assert!(state.matches(&lead()));
        state.set_search(Some("0000001"));
        assert!(state.matches(&lead()));
        state.set_search(Some("nobody"));
        assert!(!state.matches(&lead()));
        state.set_search(Some("   "));
        assert_eq!(state.search(), None);
    }

    #[test]
    fn query_omits_sentinels() {
        let state = FilterState::default()
            .filtered(FilterDimension::Campaign, FilterValue::only("Summer Promo"));
        let query = state.to_query();
        assert_eq!(query.campaign_filter.as_deref(), Some("Summer Promo"));
        assert_eq!(query.user_filter, None);

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["perPage"], 10);
        assert!(json.get("userFilter").is_none());
    }

    #[test]
    fn query_round_trips_to_the_same_predicate() {
        let mut state = FilterState::default()
            .filtered(FilterDimension::Team, FilterValue::only("North"));
        state.set_search(Some("kiran"));
        let rebuilt = state.to_query().filter_state();
        assert_eq!(rebuilt.get(FilterDimension::Team), &FilterValue::only("North"));
        assert_eq!(rebuilt.search(), Some("kiran"));
    }

    #[test]
    fn reset_keeps_page_size() {
        let mut state = FilterState::with_page_size(50)
            .unwrap()
            .filtered(FilterDimension::Status, FilterValue::only("Lost"));
        state.reset();
        assert!(state.is_unconstrained());
        assert_eq!(state.page_size(), 50);
    }

    #[test]
    fn source_mode_parses() {
        assert_eq!("Client".parse::<SourceMode>().unwrap(), SourceMode::Client);
        assert_matches!("hybrid".parse::<SourceMode>(), Err(CoreError::Configuration(_)));
    }
}
