//! # models::basket
//!
//! The basket the user is composing ([`BasketDraft`]) and the canonical
//! request the pricing service accepts ([`CanonicalBasketRequest`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::numeric::NumericInput;

/// Free-form per-position tags, e.g. `{"sector": "tech"}`.
pub type Metadata = BTreeMap<String, String>;

// ─── Draft ────────────────────────────────────────────────────────────────────

/// One editable row of the positions grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPosition {
    pub ticker: String,

    #[serde(default)]
    pub weight: NumericInput,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl DraftPosition {
    pub fn new(ticker: impl Into<String>, weight: impl Into<NumericInput>) -> Self {
        Self {
            ticker: ticker.into(),
            weight: weight.into(),
            metadata: None,
        }
    }

    /// A freshly added grid row: blank ticker, zero weight, empty metadata.
    pub fn empty() -> Self {
        Self {
            ticker: String::new(),
            weight: NumericInput::Number(0.0),
            metadata: Some(Metadata::new()),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
        self
    }

    /// Apply a weight typed into the grid. The editor is lenient: anything
    /// that is not a finite number is stored as 0.
    pub fn set_weight_from_editor(&mut self, raw: impl Into<NumericInput>) {
        self.weight = NumericInput::Number(raw.into().number_or_zero());
    }
}

/// The basket as edited in the form. Owned by the caller; normalization reads
/// it and never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketDraft {
    pub basket_name: String,
    pub base_currency: String,

    #[serde(default)]
    pub notional: NumericInput,

    #[serde(default)]
    pub positions: Vec<DraftPosition>,
}

impl BasketDraft {
    /// The starter basket the form is reset to.
    pub fn sample() -> Self {
        Self {
            basket_name: "Sample Basket".to_string(),
            base_currency: "USD".to_string(),
            notional: NumericInput::Number(1_000_000.0),
            positions: vec![DraftPosition::new("AAPL", 0.5)],
        }
    }

    pub fn add_position(&mut self) {
        self.positions.push(DraftPosition::empty());
    }

    /// Remove the rows at `indices` (any order, duplicates and out-of-range
    /// indices ignored). Returns how many rows were removed.
    pub fn remove_positions(&mut self, indices: &[usize]) -> usize {
        let before = self.positions.len();
        let mut index = 0;
        self.positions.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });
        before - self.positions.len()
    }
}

// ─── Canonical request ────────────────────────────────────────────────────────

/// A position as sent to `POST /baskets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    /// `NaN` serializes as JSON `null`.
    pub weight: f64,
    /// Never `Some` of an empty map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Service-ready body of `POST /baskets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBasketRequest {
    pub basket_name: String,
    pub base_currency: String,
    pub positions: Vec<Position>,
    /// Rounded to 2 decimals.
    pub notional: f64,
}

impl CanonicalBasketRequest {
    /// Non-fatal findings about the request. Nothing is rejected: malformed
    /// numbers still go out as `NaN` (`null` on the wire), but callers can
    /// surface these before submitting.
    pub fn validation_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.notional.is_finite() {
            warnings.push(format!("notional is not a finite number ({})", self.notional));
        }

        for (i, p) in self.positions.iter().enumerate() {
            if !p.weight.is_finite() {
                warnings.push(format!(
                    "position {i} ({}) has a non-numeric weight ({})",
                    p.ticker, p.weight
                ));
            }
            if p.ticker.trim().is_empty() {
                warnings.push(format!("position {i} has an empty ticker"));
            }
        }

        warnings
    }
}

impl From<Position> for DraftPosition {
    fn from(p: Position) -> Self {
        Self {
            ticker: p.ticker,
            weight: NumericInput::Number(p.weight),
            metadata: p.metadata,
        }
    }
}

impl From<CanonicalBasketRequest> for BasketDraft {
    fn from(req: CanonicalBasketRequest) -> Self {
        Self {
            basket_name: req.basket_name,
            base_currency: req.base_currency,
            notional: NumericInput::Number(req.notional),
            positions: req.positions.into_iter().map(DraftPosition::from).collect(),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
