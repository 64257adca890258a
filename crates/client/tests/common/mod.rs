//! Mock lead API served by axum on an ephemeral port.
//!
//! Filters with the same predicate client mode uses, so server- and
//! client-mode results can be compared over real HTTP.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use leadconsole_client::auth::AuthContext;
use leadconsole_client::http::HttpLeadBackend;
use leadconsole_core::filter::LeadQuery;
use leadconsole_core::lead::Lead;
use leadconsole_core::pagination::{page_bounds, total_pages};

pub const TOKEN: &str = "test-token";

/// Mobile number the status endpoint refuses.
pub const TAKEN_MOBILE: &str = "9999999999";

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// One request as the mock saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: &'static str,
    pub request_id: Option<String>,
    pub body: Value,
}

pub struct MockState {
    leads: Vec<Lead>,
    lead_queries: AtomicUsize,
    requests: Mutex<Vec<Recorded>>,
}

impl MockState {
    fn authorize(
        &self,
        headers: &HeaderMap,
        path: &'static str,
        body: Value,
    ) -> Result<(), (StatusCode, Json<Value>)> {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if bearer != Some(TOKEN) {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthenticated." })),
            ));
        }
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(Recorded {
            path,
            request_id,
            body,
        });
        Ok(())
    }
}

pub struct MockServer {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockServer {
    pub async fn start(leads: Vec<Lead>) -> Self {
        let state = Arc::new(MockState {
            leads,
            lead_queries: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/leads", get(list_leads))
            .route("/api/leads/filter-options", get(filter_options))
            .route("/api/leads/allocate", post(allocate))
            .route("/api/leads/bulk-allocate", get(discover_bulk).post(bulk_allocate))
            .route("/api/leads/transfer", post(transfer))
            .route("/api/leads/import", post(import))
            .route("/api/leads/status", post(update_status))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    pub fn backend(&self) -> HttpLeadBackend {
        self.backend_with(AuthContext::bearer(TOKEN))
    }

    pub fn backend_with(&self, auth: AuthContext) -> HttpLeadBackend {
        HttpLeadBackend::with_client(reqwest::Client::new(), self.base_url.clone(), auth)
    }

    pub fn lead_queries(&self) -> usize {
        self.state.lead_queries.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }
}

/// A base URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

/// `count` leads; every third (from the first) in "Summer Promo", owners
/// and statuses cycling through three values, teams alternating.
pub fn sample_leads(count: usize) -> Vec<Lead> {
    let users = [(1, "asha"), (2, "ravi"), (3, "meera")];
    let statuses = [(1, "New"), (2, "Interested"), (3, "Closed")];
    (1..=count as i64)
        .map(|id| {
            let i = (id - 1) as usize;
            let (campaign_id, campaign) = if i % 3 == 0 {
                (10, "Summer Promo")
            } else {
                (11, "Winter Sale")
            };
            let (user_id, username) = users[i % 3];
            let (status_id, status) = statuses[(i / 2) % 3];
            let (team_id, team) = if i % 2 == 0 { (20, "North") } else { (21, "South") };
            Lead::new(id, format!("Lead {id}"))
                .with_campaign(campaign_id, campaign)
                .with_status(status_id, status)
                .with_owner(user_id, username)
                .with_team(team_id, team)
                .with_contact(format!("98765{id:05}"), format!("lead{id}@example.com"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_leads(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<LeadQuery>,
) -> ApiResult {
    state.authorize(&headers, "/leads", serde_json::to_value(&query).unwrap())?;
    state.lead_queries.fetch_add(1, Ordering::SeqCst);

    let filter = query.filter_state();
    let matching: Vec<&Lead> = state.leads.iter().filter(|lead| filter.matches(lead)).collect();
    let bounds = page_bounds(query.page, query.per_page, matching.len());
    let data: Vec<Value> = matching[bounds]
        .iter()
        .map(|lead| serde_json::to_value(lead).unwrap())
        .collect();
    Ok(Json(json!({
        "result": true,
        "data": data,
        "currentPage": query.page,
        "perPage": query.per_page,
        "totalRecords": matching.len(),
        "totalPages": total_pages(matching.len() as u64, query.per_page),
    })))
}

async fn filter_options(State(state): State<Arc<MockState>>, headers: HeaderMap) -> ApiResult {
    state.authorize(&headers, "/leads/filter-options", Value::Null)?;
    Ok(Json(json!({
        "users": [
            { "user_id": 1, "username": "asha" },
            { "user_id": 2, "username": "ravi" },
            { "user_id": 3, "username": "meera" },
        ],
        "campaigns": [
            { "campaignId": "10", "campaignName": "Summer Promo" },
            { "campaignId": "11", "campaignName": "Winter Sale" },
        ],
        "status": [
            { "id": 1, "statusName": "New", "statusColor": "#2196f3", "stage": "Open" },
            { "id": 2, "statusName": "Interested", "statusColor": "#4caf50", "stage": "Open" },
            { "id": 3, "statusName": "Closed", "statusColor": "#9e9e9e", "stage": "Won" },
        ],
        "teams": ["North", "South", "north"],
    })))
}

async fn allocate(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    state.authorize(&headers, "/leads/allocate", body)?;
    Ok(Json(json!({ "result": 1, "message": "Leads allocated successfully" })))
}

async fn discover_bulk(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    state.authorize(&headers, "/leads/bulk-allocate", json!(params))?;
    let campaign = params.get("campaignId").cloned().unwrap_or_default();
    let lead_ids: Vec<String> = state
        .leads
        .iter()
        .filter(|lead| lead.campaign_id.map(|id| id.to_string()) == Some(campaign.clone()))
        .map(|lead| lead.lead_id.to_string())
        .collect();
    Ok(Json(json!({
        "campaigns": [{ "id": 10, "name": "Summer Promo" }, { "id": 11, "name": "Winter Sale" }],
        "users": [{ "id": 1, "username": "asha" }, { "id": 2, "username": "ravi" }],
        "leadIds": lead_ids.join(","),
    })))
}

async fn bulk_allocate(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    state.authorize(&headers, "/leads/bulk-allocate", body)?;
    Ok(Json(json!({ "success": true, "message": "Leads allocated" })))
}

async fn transfer(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    let count = body["leadIds"]
        .as_str()
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.is_empty())
        .count();
    state.authorize(&headers, "/leads/transfer", body)?;
    Ok(Json(json!({ "success": true, "message": "Transferred", "transferredCount": count })))
}

/// Counts data rows; rows with an email seen before are duplicates, rows
/// without a name are errors.
async fn import(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult {
    let mut file_name = None;
    let mut contents = String::new();
    let mut campaign_id = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                contents = String::from_utf8_lossy(&field.bytes().await.unwrap()).into_owned();
            }
            Some("campaignId") => campaign_id = Some(field.text().await.unwrap()),
            _ => {}
        }
    }
    state.authorize(
        &headers,
        "/leads/import",
        json!({ "fileName": file_name, "campaignId": campaign_id }),
    )?;

    let mut seen = std::collections::HashSet::new();
    let mut imported = 0;
    let mut duplicates = Vec::new();
    let mut errors = Vec::new();
    for (index, line) in contents.lines().skip(1).enumerate() {
        let row = index + 2;
        let cols: Vec<&str> = line.split(',').map(str::trim).collect();
        let name = cols.first().copied().unwrap_or_default();
        let email = cols.get(2).copied().unwrap_or_default();
        if name.is_empty() {
            errors.push(json!({ "row": row, "field": "Name", "message": "Name is required" }));
        } else if !seen.insert(email.to_lowercase()) {
            duplicates.push(json!({
                "row": row,
                "email": email,
                "reason": "Email already exists",
            }));
        } else {
            imported += 1;
        }
    }
    Ok(Json(json!({
        "success": true,
        "imported": imported,
        "duplicates": duplicates,
        "errors": errors,
    })))
}

async fn update_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    let mobile = body["mobileNo"].as_str().unwrap_or_default().to_string();
    state.authorize(&headers, "/leads/status", body)?;
    if mobile == TAKEN_MOBILE {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "result": false,
                "message": "Validation failed",
                "errors": { "mobileNo": ["The mobile number is already in use"] },
            })),
        ));
    }
    Ok(Json(json!({ "result": true, "message": "Status updated" })))
}
