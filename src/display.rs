//! # display — console rendering of the live basket view

use std::fmt;

use crate::client::SyncState;
use crate::models::BasketSnapshot;

/// Fixed-decimal number with thousands separators; empty for NaN.
pub fn format_number(value: f64, fraction_digits: usize) -> String {
    if value.is_nan() {
        return String::new();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞".into() } else { "-∞".into() };
    }

    let fixed = format!("{:.*}", fraction_digits, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Empty when the service sent no number.
pub fn format_optional(value: Option<f64>, fraction_digits: usize) -> String {
    value.map(|v| format_number(v, fraction_digits)).unwrap_or_default()
}

/// One line of the live prices table.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketRow {
    pub key: String,
    pub name: String,
    pub id: String,
    pub base: String,
    pub weight_sum: String,
    pub price: String,
    pub notional: String,
    pub positions: usize,
    pub updated_at: String,
}

impl From<&BasketSnapshot> for BasketRow {
    fn from(s: &BasketSnapshot) -> Self {
        Self {
            key: s.row_key(),
            name: s.basket_name.clone().unwrap_or_default(),
            id: s.basket_id.clone().unwrap_or_default(),
            base: s.base_currency.clone(),
            weight_sum: format_optional(s.weight_sum, 3),
            price: format_optional(s.basket_price, 3),
            notional: format_optional(s.total_notional, 0),
            positions: s.positions.len(),
            updated_at: s
                .updated_at_time()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S %:z").to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for BasketRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<20} {:<14} {:<4} w={:>7} px={:>12} ntl={:>14} legs={:<3} {}",
            self.name, self.id, self.base, self.weight_sum, self.price, self.notional,
            self.positions, self.updated_at
        )
    }
}

pub fn rows(state: &SyncState) -> Vec<BasketRow> {
    state.baskets.iter().map(BasketRow::from).collect()
}

/// `Live` / `Offline` badge text.
pub fn status_badge(state: &SyncState) -> &'static str {
    if state.connected { "Live" } else { "Offline" }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
