//! Data access for the backtester.
//!
//! This crate provides:
//! - Atomic JSON state files ([`JsonStore`])
//! - Discovery of historical report artifacts ([`ArtifactDirectory`])
//! - Daily price data with a persistent cache and outcome resolution

pub mod artifacts;
pub mod price;
pub mod retry;
pub mod store;

pub use artifacts::{ArtifactDirectory, ArtifactFile};
pub use price::{
    MarketDataClient, PriceBar, PriceCache, PriceError, PriceOutcomeResolver, PriceSource,
    ResolvedChange,
};
pub use retry::RetryPolicy;
pub use store::{JsonStore, StoreError};
