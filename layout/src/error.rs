use thiserror::Error;

use crate::types::GroupId;

/// Errors returned by layout operations.
///
/// Every variant is raised at the engine boundary, before any stage runs.
/// Degenerate geometry never produces an error.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout: empty input")]
    EmptyInput,

    #[error("layout: duplicate item id {0:?}")]
    DuplicateItem(String),

    #[error("layout: grouping assigns unknown item {0:?}")]
    UnknownItem(String),

    #[error("layout: item {0:?} has no group assignment")]
    UnassignedItem(String),

    #[error("layout: group {0} has no name")]
    UnnamedGroup(GroupId),

    #[error("layout: dimension mismatch for item {id:?}: expected {expected}, got {got}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        got: usize,
    },

    #[error("layout: item {0:?} has a non-finite embedding")]
    NonFiniteEmbedding(String),

    #[error("layout: item {0:?} has a non-finite direction hint")]
    NonFiniteHint(String),

    #[error("layout: invalid config: {0}")]
    InvalidConfig(String),
}
