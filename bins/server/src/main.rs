//! Custody approval API server.
//!
//! Main entry point for the approval back office service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use custody_api::{AppState, TracingNotifier, create_router};
use custody_core::currency::FixedRateTable;
use custody_core::policy::{PolicyResolver, PolicyTable};
use custody_core::workflow::WorkflowService;
use custody_db::{RequestRepository, WorkflowRepository};
use custody_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "custody=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let rates = FixedRateTable::from_config(&config.rates).context("invalid rate table")?;
    info!(
        base_currency = %rates.base(),
        currencies = config.rates.table.len(),
        "Exchange rates loaded"
    );

    let table = PolicyTable::reference();
    info!(
        bands = table.approval_policies().len(),
        transaction_types = table.transaction_type_policies().len(),
        "Approval policies loaded"
    );
    let resolver = PolicyResolver::new(table, Arc::new(rates)).context("invalid policy table")?;

    let service = WorkflowService::new(resolver, config.workflow);
    info!(
        discard_approvals_on_reapprove = config.workflow.discard_approvals_on_reapprove,
        "Workflow configured"
    );

    let state = AppState {
        workflow: Arc::new(WorkflowRepository::new(
            Arc::new(RequestRepository::new()),
            service,
        )),
        notifier: Arc::new(TracingNotifier),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
