use tracing::{debug, warn};

use crate::distance::GroupDistances;
use crate::types::{Group, Merge};

/// Result of bounding the group count.
#[derive(Debug, Clone)]
pub struct Consolidation {
    /// Surviving groups, ordered by id.
    pub groups: Vec<Group>,

    /// Merge steps in the order they were applied.
    pub merges: Vec<Merge>,

    /// Distance sums over the surviving groups, rows aligned with `groups`.
    pub distances: GroupDistances,

    /// The raw grouping had fewer than `min_groups` groups. The caller may
    /// ask the grouping collaborator again; the groups are still usable.
    pub insufficient: bool,
}

/// Returns true if a raw grouping with `count` groups should be retried
/// upstream.
pub fn is_insufficient(count: usize, min_groups: usize) -> bool {
    count < min_groups
}

/// Merges the closest pair of groups until at most `max_groups` remain.
///
/// `groups` must be sorted by id and index into `embeddings`. Each pass
/// picks the globally closest pair by mean cross-pair distance and folds
/// the smaller group into the larger one. Equal sizes keep the lower id.
/// Merging never creates, splits or renumbers groups.
pub fn consolidate(
    mut groups: Vec<Group>,
    embeddings: &[&[f32]],
    min_groups: usize,
    max_groups: usize,
) -> Consolidation {
    let insufficient = is_insufficient(groups.len(), min_groups);
    if insufficient {
        warn!(
            groups = groups.len(),
            min_groups, "layout: grouping has fewer groups than the minimum"
        );
    }

    let mut distances = GroupDistances::compute(&groups, embeddings);
    let mut merges = Vec::new();
    while groups.len() > max_groups.max(1) {
        let Some((i, j, distance)) = distances.matrix().nearest_pair() else {
            break;
        };

        // Rows are in ascending id order, so groups[i] has the lower id.
        let (keep, drop) = if groups[j].len() > groups[i].len() {
            (j, i)
        } else {
            (i, j)
        };

        distances.merge(keep, drop);
        let absorbed = groups.remove(drop);
        let keep = if drop < keep { keep - 1 } else { keep };
        let survivor = &mut groups[keep];
        survivor.members.extend(absorbed.members);
        survivor.members.sort_unstable();

        debug!(
            absorbed = %absorbed.id,
            into = %survivor.id,
            distance,
            size = survivor.len(),
            "layout: merged groups"
        );
        merges.push(Merge {
            absorbed: absorbed.id,
            into: survivor.id,
            distance,
        });
    }

    Consolidation {
        groups,
        merges,
        distances,
        insufficient,
    }
}
