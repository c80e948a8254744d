//! # client::sync — live basket view
//!
//! Keeps a [`SyncState`] current by polling `GET /baskets` or listening to the
//! `/baskets/stream` server push channel.
//!
//! ## State rules
//! * starts empty and disconnected
//! * every successful update replaces `baskets` / `as_of` wholesale
//! * any failure flips `connected` off and records `error`, but the last
//!   known `baskets` stay (stale-but-available)
//! * a malformed push payload only records `error`
//!
//! ## Lifecycle
//! [`SyncClient::start`] spawns one task and returns a [`SyncSubscription`].
//! All writes go through a guard that shares a lock with
//! [`SyncSubscription::cancel`], so once `cancel` returns no late response
//! can touch the state.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::sse::{SseDecoder, SseEvent};
use crate::config::{ServiceUrl, SyncMode, DEFAULT_POLL_INTERVAL};
use crate::error::{status_text, TransportError};
use crate::models::{BasketSnapshot, StreamPayload, SyncPayload};

/// Name of the SSE event carrying basket prices.
pub const PRICES_EVENT: &str = "prices";

/// Reconnect delay when the stream never advertised `retry:`.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

pub const CONNECTION_LOST: &str = "Basket stream connection lost";

// ─── SyncState ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    pub baskets: Vec<BasketSnapshot>,
    pub as_of: Option<String>,
    pub connected: bool,
    pub error: Option<String>,
}

impl SyncState {
    fn refreshed(as_of: Option<String>, baskets: Vec<BasketSnapshot>) -> Self {
        Self {
            baskets,
            as_of,
            connected: true,
            error: None,
        }
    }

    fn disconnected(&self, error: String) -> Self {
        Self {
            connected: false,
            error: Some(error),
            ..self.clone()
        }
    }

    fn with_error(&self, error: String) -> Self {
        Self {
            error: Some(error),
            ..self.clone()
        }
    }

    fn opened(&self) -> Self {
        Self {
            connected: true,
            error: None,
            ..self.clone()
        }
    }
}

// ─── Guarded writer ───────────────────────────────────────────────────────────

/// The only way the sync task mutates shared state.
#[derive(Clone)]
struct StateWriter {
    active: Arc<RwLock<bool>>,
    tx: Arc<watch::Sender<Arc<SyncState>>>,
}

impl StateWriter {
    fn is_active(&self) -> bool {
        *self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the state with `f(current)`. Returns `false` (and writes
    /// nothing) once the subscription is cancelled.
    fn replace(&self, f: impl FnOnce(&SyncState) -> SyncState) -> bool {
        // Held for the whole write so `cancel` cannot slip in between.
        let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
        if !*active {
            return false;
        }

        let next = {
            let current = self.tx.borrow();
            f(&current)
        };
        self.tx.send_replace(Arc::new(next));
        true
    }
}

// ─── SyncSubscription ─────────────────────────────────────────────────────────

/// Handle to a running sync loop. Cancelled on drop.
#[derive(Debug)]
pub struct SyncSubscription {
    mode: SyncMode,
    active: Arc<RwLock<bool>>,
    task: JoinHandle<()>,
}

impl SyncSubscription {
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        *self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop syncing. Safe to call any number of times; after it returns the
    /// state is never written again by this subscription.
    pub fn cancel(&self) {
        let was_active = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *active, false)
        };
        self.task.abort();

        if was_active {
            info!(mode = %self.mode, "🔌 [SYNC] Subscription cancelled");
        }
    }
}

impl Drop for SyncSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ─── SyncClient ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SyncClient {
    http: reqwest::Client,
    baskets_url: String,
    stream_url: String,
    poll_interval: Duration,
    state: Arc<watch::Sender<Arc<SyncState>>>,
}

impl SyncClient {
    pub fn new(http: reqwest::Client, base_url: &ServiceUrl) -> Self {
        let (tx, _) = watch::channel(Arc::new(SyncState::default()));
        Self {
            http,
            baskets_url: base_url.baskets(),
            stream_url: base_url.stream(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: Arc::new(tx),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Current state. Compare with `Arc::ptr_eq` to detect replacement.
    pub fn state(&self) -> Arc<SyncState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<SyncState>> {
        self.state.subscribe()
    }

    /// Spawn the sync loop. Must be called from within a tokio runtime.
    pub fn start(&self, mode: SyncMode) -> SyncSubscription {
        let active = Arc::new(RwLock::new(true));
        let writer = StateWriter {
            active: Arc::clone(&active),
            tx: Arc::clone(&self.state),
        };

        info!(mode = %mode, "📡 [SYNC] Starting basket sync");

        let task = match mode {
            SyncMode::Poll => tokio::spawn(run_poll(
                self.http.clone(),
                self.baskets_url.clone(),
                self.poll_interval,
                writer,
            )),
            SyncMode::Push => tokio::spawn(run_push(self.http.clone(), self.stream_url.clone(), writer)),
        };

        SyncSubscription { mode, active, task }
    }
}

// ─── Poll mode ────────────────────────────────────────────────────────────────

/// Fetch, apply, then wait `interval` before the next fetch. Polls never
/// overlap because the next one is only scheduled once this one settles.
async fn run_poll(http: reqwest::Client, url: String, interval: Duration, writer: StateWriter) {
    while writer.is_active() {
        match fetch_baskets(&http, &url).await {
            Ok((as_of, baskets)) => {
                debug!(count = baskets.len(), as_of = ?as_of, "[SYNC] Poll ok");
                writer.replace(|_| SyncState::refreshed(as_of, baskets));
            }
            Err(err) => {
                let message = format!("Failed to fetch baskets: {}", poll_error_text(&err));
                warn!(error = %message, "[SYNC] Poll failed — keeping last known baskets");
                writer.replace(|current| current.disconnected(message));
            }
        }

        if !writer.is_active() {
            break;
        }
        tokio::time::sleep(interval).await;
    }
}

async fn fetch_baskets(
    http: &reqwest::Client,
    url: &str,
) -> Result<(Option<String>, Vec<BasketSnapshot>), TransportError> {
    let response = http
        .get(url)
        .header(CONTENT_TYPE, "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        return Err(TransportError::Status {
            status,
            message: status_text(status),
        });
    }

    let bytes = response.bytes().await?;
    let payload: SyncPayload = serde_json::from_slice(&bytes)?;
    Ok(payload.into_parts())
}

/// For non-2xx this is the status reason; otherwise the transport message.
fn poll_error_text(err: &TransportError) -> String {
    match err {
        TransportError::Status { status, .. } => status_text(*status),
        other => other.to_string(),
    }
}

// ─── Push mode ────────────────────────────────────────────────────────────────

/// Hold the event stream open; when it drops, mark the view disconnected and
/// reconnect after the server-advertised delay.
async fn run_push(http: reqwest::Client, url: String, writer: StateWriter) {
    let mut reconnect_delay = DEFAULT_RECONNECT_DELAY;

    while writer.is_active() {
        let mut decoder = SseDecoder::new();

        match open_stream(&http, &url).await {
            Ok(response) => {
                info!(url = %url, "🔌 [SYNC] Basket stream open");
                writer.replace(SyncState::opened);

                let mut body = response.bytes_stream();
                let reason = loop {
                    match body.next().await {
                        Some(Ok(chunk)) => {
                            for event in decoder.feed(&chunk) {
                                apply_stream_event(&writer, event);
                            }
                        }
                        Some(Err(e)) => break e.to_string(),
                        None => break "stream closed by server".to_string(),
                    }
                };
                warn!(reason = %reason, "[SYNC] Basket stream dropped");
            }
            Err(err) => {
                warn!(error = %err, "[SYNC] Basket stream unavailable");
            }
        }

        writer.replace(|current| current.disconnected(CONNECTION_LOST.to_string()));

        if let Some(delay) = decoder.retry() {
            reconnect_delay = delay;
        }
        if !writer.is_active() {
            break;
        }
        debug!(delay = ?reconnect_delay, "[SYNC] Reconnecting basket stream");
        tokio::time::sleep(reconnect_delay).await;
    }
}

async fn open_stream(http: &reqwest::Client, url: &str) -> Result<reqwest::Response, TransportError> {
    let response = http
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        return Err(TransportError::Status {
            status,
            message: status_text(status),
        });
    }
    Ok(response)
}

fn apply_stream_event(writer: &StateWriter, event: SseEvent) {
    if event.event != PRICES_EVENT {
        debug!(event = %event.event, "[SYNC] Ignoring stream event");
        return;
    }

    match serde_json::from_str::<StreamPayload>(&event.data) {
        Ok(payload) => {
            debug!(count = payload.baskets.len(), as_of = %payload.as_of, "[SYNC] Prices pushed");
            writer.replace(|_| SyncState::refreshed(Some(payload.as_of), payload.baskets));
        }
        Err(e) => {
            let message = format!("Failed to parse basket stream payload: {e}");
            warn!(error = %message, "[SYNC] Malformed prices event — keeping last known baskets");
            writer.replace(|current| current.with_error(message));
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
