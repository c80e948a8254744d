//! # normalize
//!
//! Turns a [`BasketDraft`] into the [`CanonicalBasketRequest`] the pricing
//! service accepts.
//!
//! ## Rules
//! 1. Metadata entries with a blank key (after trimming) are dropped; values
//!    are passed through untouched.
//! 2. If nothing is left, `metadata` is omitted rather than sent as `{}`.
//! 3. `weight` is coerced to a number; garbage becomes `NaN`.
//! 4. `notional` is coerced, then rounded to cents via the fixed-point path.
//! 5. Name, currency, tickers and position order are untouched.
//!
//! Never fails. Malformed input degrades to `NaN` / `0`.

use crate::models::{
    round_to_cents, BasketDraft, CanonicalBasketRequest, DraftPosition, Metadata, Position,
};

/// Build the canonical request from a draft. Pure; the draft is only read.
pub fn normalize(draft: &BasketDraft) -> CanonicalBasketRequest {
    CanonicalBasketRequest {
        basket_name: draft.basket_name.clone(),
        base_currency: draft.base_currency.clone(),
        positions: draft.positions.iter().map(normalize_position).collect(),
        notional: round_to_cents(draft.notional.value()),
    }
}

fn normalize_position(position: &DraftPosition) -> Position {
    Position {
        ticker: position.ticker.clone(),
        weight: position.weight.value(),
        metadata: position.metadata.as_ref().and_then(filter_metadata),
    }
}

/// Keep entries whose key has a non-zero trimmed length. The kept key is the
/// original, untrimmed one.
fn filter_metadata(metadata: &Metadata) -> Option<Metadata> {
    let kept: Metadata = metadata
        .iter()
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    (!kept.is_empty()).then_some(kept)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
