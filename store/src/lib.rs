//! Persistence for item embeddings, direction hints and the last group
//! assignment, so a layout can be recomputed without regrouping.
//!
//! [`MemoryStore`] keeps everything in memory; [`FileStore`] mirrors every
//! change to a MessagePack snapshot on disk.

mod error;
mod file;
mod snapshot;
mod store;

pub use error::StoreError;
pub use file::FileStore;
pub use snapshot::Snapshot;
pub use store::{EmbeddingStore, MemoryStore};
