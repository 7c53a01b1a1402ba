//! Group-based 2D layout for embedding corpora.
//!
//! Takes items with raw embeddings and 2D direction hints plus an external
//! grouping, and returns one canvas position per item and one label anchor
//! per group.
//!
//! # Usage
//!
//! ```
//! use atlas_layout::{Engine, GroupId, Grouping, Item, LayoutConfig, Point};
//!
//! let items = vec![
//!     Item::new("a", vec![1.0, 0.0], Point::new(1.0, 0.0)),
//!     Item::new("b", vec![0.9, 0.1], Point::new(-1.0, 0.0)),
//!     Item::new("c", vec![0.0, 1.0], Point::new(0.0, 1.0)),
//! ];
//! let mut grouping = Grouping::default();
//! grouping.assignment.insert("a".into(), GroupId(0));
//! grouping.assignment.insert("b".into(), GroupId(0));
//! grouping.assignment.insert("c".into(), GroupId(1));
//! grouping.names.insert(GroupId(0), "first".into());
//! grouping.names.insert(GroupId(1), "second".into());
//!
//! let engine = Engine::new(LayoutConfig::default()).unwrap();
//! let layout = engine.layout(&items, &grouping).unwrap();
//! assert_eq!(layout.items.len(), 3);
//! assert_eq!(layout.groups.len(), 2);
//! ```
//!
//! # Design
//!
//! Stages run strictly in sequence:
//!
//! 1. [`consolidate`] folds the closest groups together until at most
//!    `max_groups` remain.
//! 2. [`DistanceMatrix`] holds mean cross-pair cosine distances.
//! 3. [`project`] places group centroids with metric MDS.
//! 4. [`scatter_group`] spreads members around their centroid.
//! 5. [`label_anchor`] averages the members' final positions.

mod config;
mod consolidate;
mod cosine;
mod distance;
mod engine;
mod error;
mod label;
mod mds;
mod scatter;
mod types;
mod validate;

pub use config::LayoutConfig;
pub use consolidate::{Consolidation, consolidate, is_insufficient};
pub use cosine::{cosine_distance, dispersion, mean_embedding};
pub use distance::{DistanceMatrix, GroupDistances};
pub use engine::Engine;
pub use error::LayoutError;
pub use label::label_anchor;
pub use mds::{MdsOptions, Projection, project, stress};
pub use scatter::{
    GroupScatter, ScatterParams, base_radius, direction, effective_radius, fnv1a,
    hashed_direction, median, nearest_neighbor_distances, scatter_distance, scatter_group,
};
pub use types::{Group, GroupId, Grouping, Item, Layout, Merge, PlacedGroup, PlacedItem, Point};
pub use validate::validate;

#[cfg(test)]
mod tests;
