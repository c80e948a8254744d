//! # basket_sync
//!
//! Core of the custom basket builder: turn a user-edited basket draft into a
//! canonical request, submit it to the pricing service, and keep a live view
//! of every priced basket.
//!
//! * [`normalize`]: draft → canonical request (pure)
//! * [`client`]: submit + poll / push synchronization
//! * [`config`]: base URL and sync settings from the environment

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod normalize;

pub use client::{BasketSyncClient, SubmitState, SyncState, SyncSubscription};
pub use config::{Config, ServiceUrl, SyncMode};
pub use error::{ApiError, ConfigError, TransportError};
pub use normalize::normalize;
