use std::collections::{BTreeMap, HashSet};

use atlas_layout::{GroupId, Grouping};
use serde::{Deserialize, Serialize};

use crate::error::GroupingError;

/// One item offered for grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingItem {
    pub id: String,

    /// Text shown to a remote classifier. May be empty.
    #[serde(default)]
    pub text: String,

    /// Raw embedding used by the local clusterer.
    pub embedding: Vec<f32>,
}

/// A batch of items to group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupingRequest {
    pub items: Vec<GroupingItem>,

    /// Desired number of groups. Advisory: implementations may return a
    /// different count.
    pub target_groups: usize,
}

impl GroupingRequest {
    pub fn new(items: Vec<GroupingItem>, target_groups: usize) -> Self {
        Self {
            items,
            target_groups,
        }
    }
}

/// Grouper assigns every item of a request to exactly one named group.
///
/// Implementations must be safe for concurrent use (Send + Sync).
#[async_trait::async_trait]
pub trait Grouper: Send + Sync {
    /// Group the request's items. The returned grouping covers every
    /// request id exactly once.
    async fn group(&self, req: &GroupingRequest) -> Result<Grouping, GroupingError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Builds a [`Grouping`] from `(name, member ids)` pairs, numbering groups
/// `0..k` in the given order. Empty groups are dropped.
///
/// Fails with [`GroupingError::Malformed`] unless every request id appears
/// exactly once and no unknown id appears.
pub fn build_grouping<I>(req: &GroupingRequest, groups: I) -> Result<Grouping, GroupingError>
where
    I: IntoIterator<Item = (String, Vec<String>)>,
{
    let known: HashSet<&str> = req.items.iter().map(|i| i.id.as_str()).collect();
    let mut assignment = BTreeMap::new();
    let mut names = BTreeMap::new();

    let mut next = 0u32;
    for (name, members) in groups {
        if members.is_empty() {
            continue;
        }
        let id = GroupId(next);
        next += 1;
        for member in members {
            if !known.contains(member.as_str()) {
                return Err(GroupingError::Malformed(format!("unknown item {member:?}")));
            }
            if assignment.insert(member.clone(), id).is_some() {
                return Err(GroupingError::Malformed(format!(
                    "item {member:?} assigned twice"
                )));
            }
        }
        let name = name.trim();
        let name = if name.is_empty() {
            format!("Group {}", next)
        } else {
            name.to_string()
        };
        names.insert(id, name);
    }

    if let Some(missing) = req.items.iter().find(|i| !assignment.contains_key(&i.id)) {
        return Err(GroupingError::Malformed(format!(
            "item {:?} not assigned",
            missing.id
        )));
    }

    Ok(Grouping { assignment, names })
}
