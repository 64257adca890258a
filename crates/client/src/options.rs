//! Filter option lists for the current session.

use std::sync::Arc;

use tokio::sync::RwLock;

use leadconsole_core::filter::SourceMode;
use leadconsole_core::lead::Lead;
use leadconsole_core::options::{derive_options, normalize_options, FilterOptions};

use crate::backend::LeadBackend;
use crate::coordinator::LeadListCoordinator;

/// Loads the users/campaigns/statuses/teams lists shown in the filter bar.
///
/// Server-mode options are fetched once and cached until
/// [`invalidate`](Self::invalidate). Client-mode options are derived from
/// the backing set on every call, which needs no I/O.
pub struct FilterOptionsProvider<B: LeadBackend + ?Sized> {
    backend: Arc<B>,
    cached: RwLock<Option<FilterOptions>>,
}

impl<B: LeadBackend + ?Sized> FilterOptionsProvider<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            cached: RwLock::new(None),
        }
    }

    /// Option lists for `mode`. Never fails: a failed fetch is logged and
    /// yields sentinel-only lists, which are not cached.
    pub async fn load_options(&self, mode: SourceMode, backing: Option<&[Lead]>) -> FilterOptions {
        match mode {
            SourceMode::Client => match backing {
                Some(leads) => derive_options(leads),
                None => {
                    tracing::warn!("Client-mode options requested before the lead set was loaded");
                    FilterOptions::empty()
                }
            },
            SourceMode::Server => self.server_options().await,
        }
    }

    /// Options matching a coordinator's current mode and backing set.
    pub async fn load_for<C: LeadBackend + ?Sized>(
        &self,
        coordinator: &LeadListCoordinator<C>,
    ) -> FilterOptions {
        let mode = coordinator.mode().await;
        let backing = coordinator.backing_set().await;
        self.load_options(mode, backing.as_deref().map(Vec::as_slice))
            .await
    }

    /// Drop cached options so the next load refetches.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    async fn server_options(&self) -> FilterOptions {
        if let Some(options) = self.cached.read().await.as_ref() {
            return options.clone();
        }

        match self.backend.filter_options().await {
            Ok(payload) => {
                let options = normalize_options(&payload);
                tracing::debug!(
                    users = options.users.len(),
                    campaigns = options.campaigns.len(),
                    statuses = options.statuses.len(),
                    teams = options.teams.len(),
                    "Loaded filter options"
                );
                *self.cached.write().await = Some(options.clone());
                options
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load filter options, using empty lists");
                FilterOptions::empty()
            }
        }
    }
}
