//! Session state of the lead list.
//!
//! [`LeadListCoordinator`] owns the [`FilterState`], the source mode, the
//! client-mode backing set and the visible page. Every mutation issues a
//! fetch tagged with a new generation; a response is applied only if its
//! generation is still the latest when it arrives, so the visible page
//! always reflects the most recent request (last-write-wins).
//!
//! [`detach`](LeadListCoordinator::detach) models navigating away: pending
//! fetches are cancelled and never applied, and the session returns to its
//! initial filter state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use leadconsole_core::error::CoreError;
use leadconsole_core::filter::{FilterDimension, FilterState, FilterValue, SourceMode};
use leadconsole_core::lead::Lead;
use leadconsole_core::listing::{resolve, ListSource, ListView};

use crate::backend::{fetch_all_leads, LeadBackend};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// What happened to a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The fetch was the latest and its page is now visible.
    Applied(ListView),
    /// A newer fetch was issued before this one settled; its result was
    /// discarded.
    Superseded,
    /// The session was detached while the fetch was pending.
    Detached,
}

impl Resolution {
    pub fn view(&self) -> Option<&ListView> {
        match self {
            Resolution::Applied(view) => Some(view),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct SessionState {
    filter: FilterState,
    mode: SourceMode,
    /// Full unfiltered lead set, loaded once per client-mode session.
    backing: Option<Arc<Vec<Lead>>>,
    view: ListView,
    loading: bool,
    cancel: CancellationToken,
}

/// Everything a fetch needs, captured under the lock when it is issued.
struct FetchTicket {
    generation: u64,
    filter: FilterState,
    mode: SourceMode,
    backing: Option<Arc<Vec<Lead>>>,
    cancel: CancellationToken,
}

/// Coordinates the visible lead page for one console session.
pub struct LeadListCoordinator<B: LeadBackend + ?Sized> {
    backend: Arc<B>,
    snapshot_page_size: u32,
    initial_filter: FilterState,
    state: Mutex<SessionState>,
    generation: AtomicU64,
}

impl<B: LeadBackend + ?Sized> LeadListCoordinator<B> {
    /// Create a session. Nothing is fetched until the first
    /// [`refresh`](Self::refresh).
    pub fn new(
        backend: Arc<B>,
        mode: SourceMode,
        page_size: u32,
        snapshot_page_size: u32,
    ) -> Result<Self, CoreError> {
        let initial_filter = FilterState::with_page_size(page_size)?;
        Ok(Self {
            backend,
            snapshot_page_size,
            state: Mutex::new(SessionState {
                filter: initial_filter.clone(),
                mode,
                backing: None,
                view: ListView::empty(page_size),
                loading: false,
                cancel: CancellationToken::new(),
            }),
            initial_filter,
            generation: AtomicU64::new(0),
        })
    }

    pub fn from_config(backend: Arc<B>, config: &ClientConfig) -> Result<Self, CoreError> {
        Self::new(
            backend,
            config.source_mode,
            config.page_size,
            config.snapshot_page_size,
        )
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub async fn view(&self) -> ListView {
        self.state.lock().await.view.clone()
    }

    pub async fn filter(&self) -> FilterState {
        self.state.lock().await.filter.clone()
    }

    pub async fn mode(&self) -> SourceMode {
        self.state.lock().await.mode
    }

    /// `true` from the moment a fetch is issued until the latest one settles.
    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    /// The client-mode backing set, if loaded.
    pub async fn backing_set(&self) -> Option<Arc<Vec<Lead>>> {
        self.state.lock().await.backing.clone()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Set one filter field (page resets to 1) and refetch.
    pub async fn set_filter(
        &self,
        dimension: FilterDimension,
        value: FilterValue,
    ) -> ClientResult<Resolution> {
        self.state.lock().await.filter.set(dimension, value);
        self.refresh().await
    }

    pub async fn set_search(&self, term: Option<&str>) -> ClientResult<Resolution> {
        self.state.lock().await.filter.set_search(term);
        self.refresh().await
    }

    pub async fn set_page(&self, page: u32) -> ClientResult<Resolution> {
        self.state.lock().await.filter.set_page(page)?;
        self.refresh().await
    }

    pub async fn set_page_size(&self, page_size: u32) -> ClientResult<Resolution> {
        self.state.lock().await.filter.set_page_size(page_size)?;
        self.refresh().await
    }

    /// Clear every filter (page size is kept) and refetch.
    pub async fn reset_filters(&self) -> ClientResult<Resolution> {
        self.state.lock().await.filter.reset();
        self.refresh().await
    }

    /// Switch source mode. The filter state carries over unchanged.
    pub async fn set_mode(&self, mode: SourceMode) -> ClientResult<Resolution> {
        {
            let mut state = self.state.lock().await;
            if state.mode != mode {
                tracing::info!(from = %state.mode, to = %mode, "Switching lead source mode");
                state.mode = mode;
            }
        }
        self.refresh().await
    }

    /// Drop the client-mode backing set so the next refresh reloads it.
    pub async fn invalidate(&self) {
        self.state.lock().await.backing = None;
    }

    /// Reload after an allocation, transfer or import changed the leads.
    pub async fn refresh_after_mutation(&self) -> ClientResult<Resolution> {
        self.invalidate().await;
        self.refresh().await
    }

    /// Navigate away: cancel pending fetches and restore the initial state.
    pub async fn detach(&self) {
        let mut state = self.state.lock().await;
        state.cancel.cancel();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mode = state.mode;
        *state = SessionState {
            filter: self.initial_filter.clone(),
            mode,
            backing: None,
            view: ListView::empty(self.initial_filter.page_size()),
            loading: false,
            cancel: CancellationToken::new(),
        };
        tracing::debug!("Lead list session detached");
    }

    // ── Fetch ────────────────────────────────────────────────────────

    /// Resolve the visible page for the current filter state.
    ///
    /// In client mode with a loaded backing set this performs no I/O. On
    /// failure the visible page becomes empty (page 1 of 1), the filter
    /// state is kept, and the error is returned.
    pub async fn refresh(&self) -> ClientResult<Resolution> {
        let ticket = self.issue().await;
        let generation = ticket.generation;
        let cancel = ticket.cancel.clone();

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(generation, "Lead fetch cancelled by detach");
                return Ok(Resolution::Detached);
            }
            outcome = self.fetch(&ticket) => outcome,
        };

        self.settle(ticket, outcome).await
    }

    async fn issue(&self) -> FetchTicket {
        let mut state = self.state.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        state.loading = true;
        FetchTicket {
            generation,
            filter: state.filter.clone(),
            mode: state.mode,
            backing: state.backing.clone(),
            cancel: state.cancel.clone(),
        }
    }

    /// Produce the view for a ticket, loading the backing set if needed.
    async fn fetch(
        &self,
        ticket: &FetchTicket,
    ) -> ClientResult<(ListView, Option<Arc<Vec<Lead>>>)> {
        match ticket.mode {
            SourceMode::Server => {
                let query = ticket.filter.to_query();
                tracing::debug!(
                    generation = ticket.generation,
                    page = query.page,
                    "Fetching lead page"
                );
                let page = self.backend.query_leads(&query).await?;
                if !page.result {
                    return Err(ClientError::rejected(
                        page.message
                            .clone()
                            .unwrap_or_else(|| "The server could not list leads".to_string()),
                    ));
                }
                Ok((resolve(&ticket.filter, ListSource::Server(page)), None))
            }
            SourceMode::Client => {
                let backing = match &ticket.backing {
                    Some(backing) => backing.clone(),
                    None => {
                        let base = FilterState::default().to_query();
                        let leads =
                            fetch_all_leads(self.backend.as_ref(), &base, self.snapshot_page_size)
                                .await?;
                        tracing::info!(leads = leads.len(), "Loaded client-mode lead set");
                        Arc::new(leads)
                    }
                };
                let view = resolve(&ticket.filter, ListSource::Client(&backing));
                Ok((view, Some(backing)))
            }
        }
    }

    /// Apply the outcome if the ticket is still the latest.
    async fn settle(
        &self,
        ticket: FetchTicket,
        outcome: ClientResult<(ListView, Option<Arc<Vec<Lead>>>)>,
    ) -> ClientResult<Resolution> {
        let mut state = self.state.lock().await;

        if ticket.cancel.is_cancelled() {
            return Ok(Resolution::Detached);
        }
        let latest = self.generation.load(Ordering::SeqCst);
        if ticket.generation != latest {
            tracing::debug!(
                generation = ticket.generation,
                latest,
                "Discarded stale lead response"
            );
            return Ok(Resolution::Superseded);
        }

        state.loading = false;
        match outcome {
            Ok((view, backing)) => {
                if state.mode == SourceMode::Client && backing.is_some() {
                    state.backing = backing;
                }
                tracing::debug!(
                    generation = ticket.generation,
                    mode = %ticket.mode,
                    page = view.pagination.current_page,
                    items = view.items.len(),
                    total_records = view.pagination.total_records,
                    "Applied lead page"
                );
                state.view = view.clone();
                Ok(Resolution::Applied(view))
            }
            Err(err) => {
                tracing::warn!(generation = ticket.generation, error = %err, "Lead fetch failed");
                state.view = ListView::empty(ticket.filter.page_size());
                Err(err)
            }
        }
    }
}
