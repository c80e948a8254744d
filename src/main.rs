//! # basket-sync — headless basket builder
//!
//! ```text
//!  draft.json ──▶ normalize ──▶ POST /baskets ──▶ log response / error
//!                                                        │
//!  Ctrl-C ◀── log every SyncState change ◀── poll GET /baskets
//!                                            or SSE /baskets/stream
//! ```
//!
//! ## Environment Variables
//!
//! | Variable                  | Default                  | Description                 |
//! |---------------------------|--------------------------|-----------------------------|
//! | `BASKET_API_URL`          | `http://localhost:8000/` | Pricing service base URL    |
//! | `BASKET_SYNC_MODE`        | `poll`                   | `poll` or `push`            |
//! | `BASKET_POLL_INTERVAL_MS` | `1000`                   | Delay between polls         |
//! | `BASKET_DRAFT_PATH`       | *(sample basket)*        | Draft JSON to submit        |
//! | `RUST_LOG`                | `basket_sync=debug`      | Tracing filter              |

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use basket_sync::{
    config::Config,
    display,
    models::BasketDraft,
    normalize, BasketSyncClient, SyncState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional; CI/prod can use real env vars) ──────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("basket_sync=debug".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════╗
  ║        BASKET SYNC — Custom Basket Builder    ║
  ║        normalize · submit · live prices       ║
  ╚═══════════════════════════════════════════════╝"#);

    // ── 3. Config ─────────────────────────────────────────────────────────────
    let config = Config::from_env().context("Failed to load config")?;
    let client = BasketSyncClient::new(&config);

    info!(
        base_url = %config.base_url,
        mode     = %config.sync_mode,
        interval = ?config.poll_interval,
        "Basket sync started"
    );

    // ── 4. Draft → canonical request → submit ────────────────────────────────
    let draft = load_draft(config.draft_path.as_deref()).await?;
    let request = normalize(&draft);

    for warning in request.validation_warnings() {
        warn!(warning = %warning, "Basket request looks suspicious — sending anyway");
    }

    match client.submit(&request).await {
        Ok(response) => {
            let body = serde_json::to_string_pretty(&response).unwrap_or_default();
            info!(basket_id = response.basket_id().unwrap_or("-"), "Response:\n{body}");
        }
        Err(e) => {
            error!(error = %e, details = ?e.details, "Add basket request failed");
        }
    }

    // ── 5. Live prices until Ctrl-C ───────────────────────────────────────────
    let subscription = client.start_sync(config.sync_mode);
    let mut updates = client.watch_sync();

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received — shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    };
    log_live_prices(&mut updates, shutdown).await;

    subscription.cancel();
    Ok(())
}

/// Log every state change until `shutdown` resolves or the client goes away.
/// `shutdown` is polled across iterations, so a signal that lands while an
/// update is being logged is still seen. Returns how many updates were logged.
async fn log_live_prices(
    updates: &mut watch::Receiver<Arc<SyncState>>,
    shutdown: impl Future<Output = ()>,
) -> usize {
    tokio::pin!(shutdown);
    let mut logged = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                info!(
                    status  = display::status_badge(&state),
                    as_of   = state.as_of.as_deref().unwrap_or("—"),
                    baskets = state.baskets.len(),
                    "📈 Live basket prices"
                );
                for row in display::rows(&state) {
                    info!("  {row}");
                }
                if let Some(err) = &state.error {
                    warn!(error = %err, "Basket stream");
                }
                logged += 1;
            }
        }
    }
    logged
}

/// Draft from `path`, or the sample basket when no path is configured.
async fn load_draft(path: Option<&str>) -> anyhow::Result<BasketDraft> {
    let Some(path) = path else {
        info!("BASKET_DRAFT_PATH not set — using the sample basket");
        return Ok(BasketDraft::sample());
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read draft file {path}"))?;

    serde_json::from_str(&raw).with_context(|| format!("Draft file {path} is not a valid basket"))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
