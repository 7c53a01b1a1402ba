//! Grouping collaborators for the atlas layout engine.
//!
//! A [`Grouper`] turns a batch of items into a [`Grouping`](atlas_layout::Grouping).
//! [`RemoteGrouper`] asks an OpenAI-compatible chat model; [`LocalGrouper`]
//! clusters embeddings with DBSCAN. [`GroupingDriver`] retries the primary
//! with exponential backoff and falls back to the local one.

pub mod config;
pub(crate) mod dbscan;
pub mod driver;
pub mod error;
pub mod grouper;
pub mod local;
pub mod remote;
mod retry;

pub use config::{GroupingConfig, LocalConfig, RemoteConfig, RetryConfig};
pub use driver::{GroupingDriver, Resolved, Source};
pub use error::GroupingError;
pub use grouper::{Grouper, GroupingItem, GroupingRequest, build_grouping};
pub use local::LocalGrouper;
pub use remote::RemoteGrouper;
