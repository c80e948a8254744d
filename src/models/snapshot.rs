//! # models::snapshot
//!
//! Read-only data produced by the pricing service: priced basket snapshots,
//! the create-basket response, and the two shapes `GET /baskets` may return.
//!
//! The client never edits these. Deserialization is tolerant: any field the
//! service leaves out or sends as `null` falls back to its default instead of
//! failing the whole update.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ─── BasketSnapshot ───────────────────────────────────────────────────────────

/// One priced leg of a basket. Numbers are `None` when the service sends
/// `null` or leaves them out (an unpriced leg, a missing FX rate).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionSnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub ticker: String,
    pub weight: Option<f64>,
    pub normalized_weight: Option<f64>,
    pub price: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub price_currency: String,
    pub price_in_base: Option<f64>,
    pub fx_rate_to_base: Option<f64>,
    pub contribution: Option<f64>,
    pub position_notional: Option<f64>,
    pub quantity: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
}

/// Server-computed view of a basket at a point in time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BasketSnapshot {
    pub basket_id: Option<String>,
    pub basket_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub base_currency: String,
    pub weight_sum: Option<f64>,
    pub basket_price: Option<f64>,
    pub total_notional: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub positions: Vec<PositionSnapshot>,
    #[serde(deserialize_with = "null_as_default")]
    pub messages: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// `null` reads as the field's default, same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl BasketSnapshot {
    /// Row identity for list reconciliation in a display.
    ///
    /// Tie-break order: `basket_id`, then `name:{basket_name}`, then
    /// `basket-price-{price}`, then the serialized snapshot. This is a
    /// display concern only and must not be used as a primary key.
    pub fn row_key(&self) -> String {
        if let Some(id) = self.basket_id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        if let Some(name) = self.basket_name.as_deref().filter(|n| !n.is_empty()) {
            return format!("name:{name}");
        }
        if let Some(price) = self.basket_price {
            return format!("basket-price-{price}");
        }
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("snapshot-{json}")
    }

    pub fn updated_at_time(&self) -> Option<DateTime<FixedOffset>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }
}

// ─── Create response ──────────────────────────────────────────────────────────

/// Body returned by `POST /baskets`. The shape is owned by the service; only
/// `basket_id` is expected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreateBasketResponse(pub Map<String, Value>);

impl CreateBasketResponse {
    pub fn basket_id(&self) -> Option<&str> {
        self.0.get("basket_id").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

// ─── Sync payloads ────────────────────────────────────────────────────────────

/// The `prices` event of `/baskets/stream`, and the wrapped form of
/// `GET /baskets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamPayload {
    pub as_of: String,
    pub baskets: Vec<BasketSnapshot>,
}

/// `GET /baskets` answers either a bare array or `{ as_of, baskets }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SyncPayload {
    Bare(Vec<BasketSnapshot>),
    Wrapped {
        #[serde(default)]
        as_of: Option<String>,
        #[serde(default)]
        baskets: Option<Vec<BasketSnapshot>>,
    },
}

impl SyncPayload {
    /// Resolve into `(as_of, baskets)`. A bare array is stamped with the
    /// current time.
    pub fn into_parts(self) -> (Option<String>, Vec<BasketSnapshot>) {
        match self {
            SyncPayload::Bare(baskets) => (Some(now_timestamp()), baskets),
            SyncPayload::Wrapped { as_of, baskets } => (as_of, baskets.unwrap_or_default()),
        }
    }
}

// ─── Timestamps ───────────────────────────────────────────────────────────────

/// `2024-01-01T12:00:00.000Z` style, millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
