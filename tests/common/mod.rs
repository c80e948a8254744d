//! In-process mock of the basket pricing service.
//!
//! | Method | Path              | Behaviour                                      |
//! |--------|-------------------|------------------------------------------------|
//! | POST   | `/baskets`        | records the body, answers `create_reply` or a fresh id |
//! | GET    | `/baskets`        | scripted replies, optional delay, tracks overlap |
//! | GET    | `/baskets/stream` | SSE body fed by the test through `push_raw`    |

#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use basket_sync::{config::Config, ServiceUrl};
use futures_util::stream;
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Default)]
pub struct MockState {
    /// Every POST /baskets body, parsed
    pub posts: Mutex<Vec<Value>>,
    /// Content-Type of every POST /baskets
    pub post_content_types: Mutex<Vec<String>>,
    pub create_reply: Mutex<Option<(StatusCode, String)>>,
    pub create_delay: Mutex<Duration>,

    pub gets: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    /// Front reply is served; the last one repeats forever
    pub get_replies: Mutex<VecDeque<(StatusCode, String)>>,
    pub get_delay: Mutex<Duration>,

    pub stream_connections: AtomicUsize,
    pub stream_senders: Mutex<Vec<mpsc::UnboundedSender<String>>>,
}

pub struct MockService {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockService {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/baskets", get(list_baskets).post(create_basket))
            .route("/baskets/stream", get(stream_baskets))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn config(&self, poll_ms: u64) -> Config {
        Config {
            base_url: ServiceUrl::resolve(Some(&self.base_url)),
            poll_interval: Duration::from_millis(poll_ms),
            ..Config::default()
        }
    }

    pub fn reply_create(&self, status: StatusCode, body: &str) {
        *self.state.create_reply.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn delay_create(&self, delay: Duration) {
        *self.state.create_delay.lock().unwrap() = delay;
    }

    pub fn script_gets(&self, replies: &[(StatusCode, &str)]) {
        let mut queue = self.state.get_replies.lock().unwrap();
        queue.clear();
        queue.extend(replies.iter().map(|(s, b)| (*s, b.to_string())));
    }

    pub fn delay_gets(&self, delay: Duration) {
        *self.state.get_delay.lock().unwrap() = delay;
    }

    pub fn gets(&self) -> usize {
        self.state.gets.load(Ordering::SeqCst)
    }

    pub fn posts(&self) -> Vec<Value> {
        self.state.posts.lock().unwrap().clone()
    }

    pub fn stream_connections(&self) -> usize {
        self.state.stream_connections.load(Ordering::SeqCst)
    }

    /// Write raw SSE text to every open stream.
    pub fn push_raw(&self, text: &str) {
        let senders = self.state.stream_senders.lock().unwrap();
        for tx in senders.iter() {
            let _ = tx.send(text.to_string());
        }
    }

    pub fn push_prices(&self, payload: &str) {
        self.push_raw(&format!("event: prices\ndata: {payload}\n\n"));
    }

    /// End every open stream from the server side.
    pub fn close_streams(&self) {
        self.state.stream_senders.lock().unwrap().clear();
    }
}

async fn create_basket(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.post_content_types.lock().unwrap().push(content_type);
    state
        .posts
        .lock()
        .unwrap()
        .push(serde_json::from_str(&body).unwrap_or(Value::Null));

    let delay = *state.create_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = state
        .create_reply
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| {
            let id = uuid::Uuid::new_v4();
            (StatusCode::OK, format!(r#"{{"basket_id":"{id}"}}"#))
        });
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn list_baskets(State(state): State<Arc<MockState>>) -> Response {
    state.gets.fetch_add(1, Ordering::SeqCst);
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);

    let delay = *state.get_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let reply = {
        let mut queue = state.get_replies.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    };
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    let (status, body) = reply.unwrap_or((StatusCode::OK, "[]".to_string()));
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn stream_baskets(State(state): State<Arc<MockState>>) -> Response {
    state.stream_connections.fetch_add(1, Ordering::SeqCst);

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let _ = tx.send(": connected\n\n".to_string());
    state.stream_senders.lock().unwrap().push(tx);

    let body = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(body))
        .unwrap()
}

/// Poll `check` every 10 ms until it holds, panicking after 5 s.
pub async fn wait_until<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check().await {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Base URL of a port nothing listens on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub const WRAPPED_TWO: &str = r#"{
    "as_of": "2024-05-01T10:00:00Z",
    "baskets": [
        {"basket_id":"b-1","basket_name":"Tech","base_currency":"USD","weight_sum":1.0,
         "basket_price":101.5,"total_notional":1000000.0,"positions":[],"messages":[],
         "created_at":"2024-05-01T09:00:00Z","updated_at":"2024-05-01T10:00:00Z"},
        {"basket_id":"b-2","basket_name":"Energy","base_currency":"EUR","weight_sum":1.0,
         "basket_price":55.25,"total_notional":250000.0,"positions":[],"messages":["fx stale"],
         "created_at":"2024-05-01T09:30:00Z","updated_at":"2024-05-01T10:00:00Z"}
    ]
}"#;

pub const BARE_ONE: &str = r#"[{"basket_id":"b-3","basket_name":"Solo","base_currency":"GBP"}]"#;
