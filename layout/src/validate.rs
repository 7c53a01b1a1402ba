use std::collections::HashSet;

use crate::error::LayoutError;
use crate::types::{Grouping, Item};

/// Checks engine input and returns the shared embedding dimension.
///
/// The grouping must partition the item set exactly: every item assigned
/// once, no assignment for an unknown id, every used group named.
pub fn validate(items: &[Item], grouping: &Grouping) -> Result<usize, LayoutError> {
    let first = items.first().ok_or(LayoutError::EmptyInput)?;
    let dim = first.embedding.len();

    let mut seen: HashSet<&str> = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id.as_str()) {
            return Err(LayoutError::DuplicateItem(item.id.clone()));
        }
        if item.embedding.len() != dim {
            return Err(LayoutError::DimensionMismatch {
                id: item.id.clone(),
                expected: dim,
                got: item.embedding.len(),
            });
        }
        if item.embedding.iter().any(|x| !x.is_finite()) {
            return Err(LayoutError::NonFiniteEmbedding(item.id.clone()));
        }
        if !item.hint.is_finite() {
            return Err(LayoutError::NonFiniteHint(item.id.clone()));
        }
        let group = grouping
            .assignment
            .get(&item.id)
            .ok_or_else(|| LayoutError::UnassignedItem(item.id.clone()))?;
        if !grouping.names.contains_key(group) {
            return Err(LayoutError::UnnamedGroup(*group));
        }
    }

    if let Some(unknown) = grouping
        .assignment
        .keys()
        .find(|id| !seen.contains(id.as_str()))
    {
        return Err(LayoutError::UnknownItem(unknown.clone()));
    }

    Ok(dim)
}
