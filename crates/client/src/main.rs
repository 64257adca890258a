use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadconsole_client::config::ClientConfig;
use leadconsole_client::console::LeadConsole;
use leadconsole_client::http::HttpLeadBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadconsole_client=info,leadconsole_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ClientConfig::from_env().context("Invalid lead console configuration")?;
    tracing::info!(
        api_url = %config.api_url,
        mode = %config.source_mode,
        page_size = config.page_size,
        authenticated = config.api_token.is_some(),
        "Loaded client configuration"
    );

    // --- Backend ---
    let backend = Arc::new(HttpLeadBackend::new(&config).context("Failed to build HTTP client")?);

    // --- First page ---
    let console = LeadConsole::new(backend, &config)?;
    if let Err(err) = console.list().refresh().await {
        tracing::error!(kind = ?err.kind(), "{}", err.user_message());
        anyhow::bail!("Failed to load leads: {}", err.user_message());
    }

    // --- Filter options ---
    let options = console.filter_options().await;

    let view = console.list().view().await;
    tracing::info!(
        page = view.pagination.current_page,
        total_pages = view.pagination.total_pages,
        total_records = view.pagination.total_records,
        visible = view.items.len(),
        users = options.users.len().saturating_sub(1),
        campaigns = options.campaigns.len().saturating_sub(1),
        statuses = options.statuses.len().saturating_sub(1),
        teams = options.teams.len().saturating_sub(1),
        "Lead console ready"
    );

    let statuses = options.status_lookup();
    for lead in &view.items {
        tracing::info!(
            lead_id = lead.lead_id,
            name = %lead.name,
            owner = lead.username.as_deref().unwrap_or("-"),
            status = lead.status_name.as_deref().unwrap_or("-"),
            color = statuses.color_for(lead).unwrap_or("-"),
            "Lead"
        );
    }

    Ok(())
}
