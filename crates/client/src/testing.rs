//! In-process [`LeadBackend`] double for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use leadconsole_core::filter::LeadQuery;
use leadconsole_core::import::ImportResponse;
use leadconsole_core::lead::Lead;
use leadconsole_core::listing::LeadPage;
use leadconsole_core::pagination::{page_bounds, total_pages};
use leadconsole_core::status_update::{StatusUpdatePayload, StatusUpdateResponse};
use leadconsole_core::types::{CampaignId, TeamId, UserId};
use leadconsole_core::wire::parse_id_list;

use crate::backend::LeadBackend;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    ActionReply, AllocateRequest, BulkAllocateRequest, BulkAllocationCandidates, ImportUpload,
    TransferReply, TransferRequest,
};

const USERS: [(UserId, &str); 3] = [(1, "asha"), (2, "ravi"), (3, "meera")];
const TEAMS: [(TeamId, &str); 2] = [(20, "North"), (21, "South")];
const STATUSES: [(i64, &str, &str); 3] = [
    (1, "New", "#2196f3"),
    (2, "Interested", "#4caf50"),
    (3, "Closed", "#9e9e9e"),
];

/// `count` leads with ids `1..=count`. Every third lead (starting with the
/// first) is in "Summer Promo", the rest in "Winter Sale"; owners, statuses
/// and teams cycle.
pub fn sample_leads(count: usize) -> Vec<Lead> {
    (1..=count as i64)
        .map(|id| {
            let i = (id - 1) as usize;
            let (campaign_id, campaign) = if i % 3 == 0 {
                (10, "Summer Promo")
            } else {
                (11, "Winter Sale")
            };
            let (user_id, username) = USERS[i % USERS.len()];
            let (status_id, status, color) = STATUSES[i % STATUSES.len()];
            let (team_id, team) = TEAMS[i % TEAMS.len()];
            let mut lead = Lead::new(id, format!("Lead {id}"))
                .with_campaign(campaign_id, campaign)
                .with_status(status_id, status)
                .with_owner(user_id, username)
                .with_team(team_id, team)
                .with_contact(format!("98765{id:05}"), format!("lead{id}@example.com"));
            lead.status_color = Some(color.to_string());
            lead
        })
        .collect()
}

/// Build a transport-level [`ClientError`] without touching the network.
pub fn transport_error() -> ClientError {
    let err = reqwest::Client::new()
        .get("://unreachable")
        .build()
        .expect_err("invalid URL must fail to build");
    ClientError::Request(err)
}

/// How the fake answers an import.
#[derive(Debug, Clone)]
pub enum ImportBehavior {
    Respond(ImportResponse),
    Transport,
    Status(u16, String),
}

/// Backend double holding its leads in memory and recording every call.
pub struct FakeBackend {
    leads: Mutex<Vec<Lead>>,
    options: Mutex<Value>,
    candidates: Mutex<BulkAllocationCandidates>,
    import_behavior: Mutex<ImportBehavior>,
    status_reply: Mutex<Value>,
    rejected_assignees: Mutex<Vec<UserId>>,

    query_gates: Mutex<VecDeque<Arc<Notify>>>,
    import_gates: Mutex<VecDeque<Arc<Notify>>>,

    fail_queries: AtomicBool,
    fail_options: AtomicBool,

    query_count: AtomicUsize,
    options_count: AtomicUsize,
    queries: Mutex<Vec<LeadQuery>>,
    allocations: Mutex<Vec<AllocateRequest>>,
    bulk_allocations: Mutex<Vec<BulkAllocateRequest>>,
    transfers: Mutex<Vec<TransferRequest>>,
    imports: Mutex<Vec<ImportUpload>>,
    status_updates: Mutex<Vec<StatusUpdatePayload>>,
}

impl FakeBackend {
    pub fn new(leads: Vec<Lead>) -> Self {
        let users: Vec<Value> = USERS
            .iter()
            .map(|(id, name)| json!({ "id": id, "username": name }))
            .collect();
        let statuses: Vec<Value> = STATUSES
            .iter()
            .map(|(id, name, color)| json!({ "id": id, "name": name, "color": color }))
            .collect();
        Self {
            leads: Mutex::new(leads),
            options: Mutex::new(json!({
                "users": users,
                "campaigns": [
                    { "id": 10, "name": "Summer Promo" },
                    { "id": 11, "name": "Winter Sale" },
                ],
                "status": statuses,
                "teams": [{ "id": 20, "name": "North" }, { "id": 21, "name": "South" }],
            })),
            candidates: Mutex::new(BulkAllocationCandidates::default()),
            import_behavior: Mutex::new(ImportBehavior::Respond(ImportResponse {
                success: true,
                imported: Some(0),
                duplicates: Vec::new(),
                errors: Vec::new(),
                message: None,
            })),
            status_reply: Mutex::new(json!({ "result": 1, "message": "Status updated" })),
            rejected_assignees: Mutex::new(Vec::new()),
            query_gates: Mutex::new(VecDeque::new()),
            import_gates: Mutex::new(VecDeque::new()),
            fail_queries: AtomicBool::new(false),
            fail_options: AtomicBool::new(false),
            query_count: AtomicUsize::new(0),
            options_count: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            allocations: Mutex::new(Vec::new()),
            bulk_allocations: Mutex::new(Vec::new()),
            transfers: Mutex::new(Vec::new()),
            imports: Mutex::new(Vec::new()),
            status_updates: Mutex::new(Vec::new()),
        }
    }

    // ---- configuration ----

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_options(&self, fail: bool) {
        self.fail_options.store(fail, Ordering::SeqCst);
    }

    pub fn set_options(&self, payload: Value) {
        *self.options.lock().unwrap() = payload;
    }

    pub fn set_candidates(&self, candidates: BulkAllocationCandidates) {
        *self.candidates.lock().unwrap() = candidates;
    }

    pub fn set_import_behavior(&self, behavior: ImportBehavior) {
        *self.import_behavior.lock().unwrap() = behavior;
    }

    pub fn set_status_reply(&self, reply: Value) {
        *self.status_reply.lock().unwrap() = reply;
    }

    pub fn reject_assignee(&self, user_id: UserId) {
        self.rejected_assignees.lock().unwrap().push(user_id);
    }

    /// The next lead query computes its page on arrival, then waits until
    /// the returned gate is notified.
    pub fn hold_next_query(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.query_gates.lock().unwrap().push_back(gate.clone());
        gate
    }

    /// The next import waits until the returned gate is notified.
    pub fn hold_next_import(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.import_gates.lock().unwrap().push_back(gate.clone());
        gate
    }

    // ---- inspection ----

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    pub fn options_count(&self) -> usize {
        self.options_count.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<LeadQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn allocations(&self) -> Vec<AllocateRequest> {
        self.allocations.lock().unwrap().clone()
    }

    pub fn bulk_allocations(&self) -> Vec<BulkAllocateRequest> {
        self.bulk_allocations.lock().unwrap().clone()
    }

    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn imports(&self) -> Vec<ImportUpload> {
        self.imports.lock().unwrap().clone()
    }

    pub fn status_updates(&self) -> Vec<StatusUpdatePayload> {
        self.status_updates.lock().unwrap().clone()
    }

    /// Apply an allocation or transfer to the stored leads. Returns how many
    /// leads were listed.
    fn reassign(
        &self,
        lead_ids: &str,
        user_id: Option<UserId>,
        team_id: Option<TeamId>,
    ) -> usize {
        let ids = parse_id_list(lead_ids);
        let mut leads = self.leads.lock().unwrap();
        for lead in leads.iter_mut().filter(|lead| ids.contains(&lead.lead_id)) {
            if let Some(user_id) = user_id {
                lead.assigned_user_id = Some(user_id);
                lead.username = USERS
                    .iter()
                    .find(|(id, _)| *id == user_id)
                    .map(|(_, name)| name.to_string());
            }
            if let Some(team_id) = team_id {
                lead.team_id = Some(team_id);
                lead.team_name = TEAMS
                    .iter()
                    .find(|(id, _)| *id == team_id)
                    .map(|(_, name)| name.to_string());
            }
        }
        ids.len()
    }

    fn page_for(&self, query: &LeadQuery) -> LeadPage {
        let filter = query.filter_state();
        let leads = self.leads.lock().unwrap();
        let matching: Vec<&Lead> = leads.iter().filter(|lead| filter.matches(lead)).collect();
        let bounds = page_bounds(query.page, query.per_page, matching.len());
        LeadPage {
            result: true,
            data: matching[bounds].iter().map(|lead| (*lead).clone()).collect(),
            current_page: query.page,
            per_page: query.per_page,
            total_records: matching.len() as u64,
            total_pages: total_pages(matching.len() as u64, query.per_page),
            message: None,
        }
    }
}

#[async_trait]
impl LeadBackend for FakeBackend {
    async fn query_leads(&self, query: &LeadQuery) -> ClientResult<LeadPage> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        let failing = self.fail_queries.load(Ordering::SeqCst);
        let page = self.page_for(query);
        let gate = self.query_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if failing {
            return Err(ClientError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(page)
    }

    async fn filter_options(&self) -> ClientResult<Value> {
        self.options_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_options.load(Ordering::SeqCst) {
            return Err(transport_error());
        }
        Ok(self.options.lock().unwrap().clone())
    }

    async fn allocate(&self, request: &AllocateRequest) -> ClientResult<ActionReply> {
        self.allocations.lock().unwrap().push(request.clone());
        let rejected = self
            .rejected_assignees
            .lock()
            .unwrap()
            .contains(&request.assignee_id);
        if !rejected {
            self.reassign(&request.lead_ids, Some(request.assignee_id), None);
        }
        let message = if rejected {
            "User is inactive"
        } else {
            "Leads allocated"
        };
        Ok(ActionReply {
            result: !rejected,
            message: Some(message.to_string()),
        })
    }

    async fn discover_bulk_allocation(
        &self,
        _campaign_id: Option<CampaignId>,
    ) -> ClientResult<BulkAllocationCandidates> {
        Ok(self.candidates.lock().unwrap().clone())
    }

    async fn bulk_allocate(&self, request: &BulkAllocateRequest) -> ClientResult<ActionReply> {
        self.bulk_allocations.lock().unwrap().push(request.clone());
        Ok(ActionReply {
            result: true,
            message: Some("Leads allocated".to_string()),
        })
    }

    async fn transfer(&self, request: &TransferRequest) -> ClientResult<TransferReply> {
        self.transfers.lock().unwrap().push(request.clone());
        let count = self.reassign(&request.lead_ids, request.user_id, request.team_id);
        Ok(TransferReply {
            success: true,
            message: Some("Leads transferred".to_string()),
            transferred_count: Some(count as i64),
        })
    }

    async fn import_leads(&self, upload: &ImportUpload) -> ClientResult<ImportResponse> {
        self.imports.lock().unwrap().push(upload.clone());
        let gate = self.import_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let behavior = self.import_behavior.lock().unwrap().clone();
        match behavior {
            ImportBehavior::Respond(response) => Ok(response),
            ImportBehavior::Transport => Err(transport_error()),
            ImportBehavior::Status(status, body) => Err(ClientError::Api { status, body }),
        }
    }

    async fn update_status(
        &self,
        payload: &StatusUpdatePayload,
    ) -> ClientResult<StatusUpdateResponse> {
        self.status_updates.lock().unwrap().push(payload.clone());
        let reply = self.status_reply.lock().unwrap().clone();
        Ok(serde_json::from_value(reply).map_err(|e| {
            ClientError::Api {
                status: 500,
                body: e.to_string(),
            }
        })?)
    }
}
