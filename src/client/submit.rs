//! # client::submit — POST a canonical basket to the pricing service
//!
//! One call per submit: no retry, no timeout. Progress is observable through a
//! `watch` channel of [`SubmitState`]; the outcome is also returned to the
//! awaiting caller.
//!
//! Submits are not serialized. If two overlap, whichever *completes* last
//! owns the observable state.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::ServiceUrl;
use crate::error::{ApiError, TransportError};
use crate::models::{CanonicalBasketRequest, CreateBasketResponse};

/// Observable state of the most recent submit.
#[derive(Debug, Clone, Default)]
pub struct SubmitState {
    pub loading: bool,
    /// Response of the last successful submit
    pub data: Option<CreateBasketResponse>,
    /// Failure of the last submit
    pub error: Option<ApiError>,
}

#[derive(Clone)]
pub struct SubmitClient {
    http: reqwest::Client,
    endpoint: String,
    state: Arc<watch::Sender<SubmitState>>,
}

impl SubmitClient {
    pub fn new(http: reqwest::Client, base_url: &ServiceUrl) -> Self {
        let (tx, _) = watch::channel(SubmitState::default());
        Self {
            http,
            endpoint: base_url.baskets(),
            state: Arc::new(tx),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current submit state (cloned out so no lock is held).
    pub fn state(&self) -> SubmitState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmitState> {
        self.state.subscribe()
    }

    /// `POST {base}baskets` with the request as JSON.
    ///
    /// Sets `loading` before sending and clears it on completion. A failure
    /// is stored in the observable state *and* returned.
    pub async fn submit(
        &self,
        request: &CanonicalBasketRequest,
    ) -> Result<CreateBasketResponse, ApiError> {
        self.state.send_replace(SubmitState {
            loading: true,
            ..SubmitState::default()
        });

        let result = self.post(request).await;

        match &result {
            Ok(data) => {
                info!(
                    basket_id = data.basket_id().unwrap_or("-"),
                    basket    = %request.basket_name,
                    "✅ [SUBMIT] Basket accepted"
                );
                self.state.send_replace(SubmitState {
                    loading: false,
                    data: Some(data.clone()),
                    error: None,
                });
            }
            Err(err) => {
                error!(error = %err.message, basket = %request.basket_name, "❌ [SUBMIT] Basket rejected");
                self.state.send_replace(SubmitState {
                    loading: false,
                    data: None,
                    error: Some(err.clone()),
                });
            }
        }

        result
    }

    async fn post(&self, request: &CanonicalBasketRequest) -> Result<CreateBasketResponse, ApiError> {
        info!(
            url       = %self.endpoint,
            basket    = %request.basket_name,
            currency  = %request.base_currency,
            positions = request.positions.len(),
            notional  = request.notional,
            "🚀 [SUBMIT] Posting basket"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(status, &body).into());
        }

        let bytes = response.bytes().await?;
        let data = serde_json::from_slice(&bytes).map_err(TransportError::from)?;
        Ok(data)
    }
}
