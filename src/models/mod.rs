//! Domain models shared across the basket builder core.

pub mod basket;
pub mod numeric;
pub mod snapshot;

pub use basket::{BasketDraft, CanonicalBasketRequest, DraftPosition, Metadata, Position};
pub use numeric::{js_number, round_to_cents, NumericInput};
pub use snapshot::{BasketSnapshot, CreateBasketResponse, PositionSnapshot, StreamPayload, SyncPayload};
