//! # client — talking to the basket pricing service
//!
//! ```text
//!  ┌──────────────┐  normalize()   ┌────────────────────────┐  POST /baskets
//!  │ BasketDraft  │ ─────────────▶ │ CanonicalBasketRequest │ ───────────────▶ ┐
//!  └──────────────┘                └────────────────────────┘                  │
//!                                                                              ▼
//!  ┌──────────────────────────┐    GET /baskets (poll)          ┌──────────────────┐
//!  │ SyncState (watch)        │ ◀────────────────────────────── │ pricing service  │
//!  │ baskets · as_of · conn.  │    /baskets/stream (push, SSE)  └──────────────────┘
//!  └──────────────────────────┘
//! ```
//!
//! [`BasketSyncClient`] bundles both halves over one shared `reqwest::Client`
//! and one immutable base URL.

pub mod sse;
pub mod submit;
pub mod sync;

use tokio::sync::watch;

use crate::config::{Config, ServiceUrl, SyncMode};
use crate::error::ApiError;
use crate::models::{CanonicalBasketRequest, CreateBasketResponse};

pub use submit::{SubmitClient, SubmitState};
pub use sync::{SyncClient, SyncState, SyncSubscription};

#[derive(Clone)]
pub struct BasketSyncClient {
    base_url: ServiceUrl,
    submit: SubmitClient,
    sync: SyncClient,
}

impl BasketSyncClient {
    pub fn new(config: &Config) -> Self {
        Self::with_http(reqwest::Client::new(), config)
    }

    /// Build on an existing HTTP client (connection pool is shared).
    pub fn with_http(http: reqwest::Client, config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            submit: SubmitClient::new(http.clone(), &config.base_url),
            sync: SyncClient::new(http, &config.base_url).with_poll_interval(config.poll_interval),
        }
    }

    pub fn base_url(&self) -> &ServiceUrl {
        &self.base_url
    }

    pub async fn submit(
        &self,
        request: &CanonicalBasketRequest,
    ) -> Result<CreateBasketResponse, ApiError> {
        self.submit.submit(request).await
    }

    pub fn start_sync(&self, mode: SyncMode) -> SyncSubscription {
        self.sync.start(mode)
    }

    pub fn submit_state(&self) -> SubmitState {
        self.submit.state()
    }

    pub fn sync_state(&self) -> std::sync::Arc<SyncState> {
        self.sync.state()
    }

    pub fn watch_submit(&self) -> watch::Receiver<SubmitState> {
        self.submit.subscribe()
    }

    pub fn watch_sync(&self) -> watch::Receiver<std::sync::Arc<SyncState>> {
        self.sync.subscribe()
    }
}
