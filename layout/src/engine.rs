use std::collections::BTreeMap;

use tracing::info;

use crate::config::LayoutConfig;
use crate::consolidate::{consolidate, is_insufficient};
use crate::error::LayoutError;
use crate::label::label_anchor;
use crate::mds::{MdsOptions, project};
use crate::scatter::{ScatterParams, base_radius, scatter_group};
use crate::types::{Group, GroupId, Grouping, Item, Layout, PlacedGroup, PlacedItem, Point};
use crate::validate::validate;

/// Runs the five layout stages in order:
/// consolidate, distance matrix, projection, scatter, labels.
///
/// The engine holds only its configuration. Every call is a pure function
/// of the items, the grouping and that configuration.
#[derive(Debug, Clone)]
pub struct Engine {
    cfg: LayoutConfig,
}

impl Engine {
    /// Creates an engine. Fails if the configuration is out of range.
    pub fn new(cfg: LayoutConfig) -> Result<Self, LayoutError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// True if `grouping` has fewer groups than the configured minimum and
    /// is worth one more request to the grouping collaborator.
    pub fn needs_regroup(&self, grouping: &Grouping) -> bool {
        is_insufficient(grouping.group_count(), self.cfg.min_groups)
    }

    /// Computes the full layout.
    ///
    /// Fails only on malformed input; degenerate geometry always yields
    /// finite positions.
    pub fn layout(&self, items: &[Item], grouping: &Grouping) -> Result<Layout, LayoutError> {
        let dim = validate(items, grouping)?;

        let mut by_group: BTreeMap<GroupId, Vec<usize>> = BTreeMap::new();
        for (idx, item) in items.iter().enumerate() {
            by_group
                .entry(grouping.assignment[&item.id])
                .or_default()
                .push(idx);
        }
        let groups: Vec<Group> = by_group
            .into_iter()
            .map(|(id, members)| Group {
                id,
                name: grouping.names[&id].clone(),
                members,
            })
            .collect();
        let raw_groups = groups.len();

        let embeddings: Vec<&[f32]> = items.iter().map(|i| i.embedding.as_slice()).collect();

        // Stage 1
        let consolidation = consolidate(
            groups,
            &embeddings,
            self.cfg.min_groups,
            self.cfg.max_groups,
        );

        // Stage 2
        let matrix = consolidation.distances.matrix();

        // Stage 3
        let projection = project(
            &matrix,
            &MdsOptions {
                max_iter: self.cfg.mds_max_iter,
                tolerance: self.cfg.mds_tolerance,
                scale: self.cfg.layout_scale,
            },
        );

        // Stage 4
        let params = ScatterParams {
            fraction: self.cfg.scatter_fraction,
            amplifier: self.cfg.variance_amplifier,
        };
        let base = base_radius(&projection.positions, params.fraction, self.cfg.layout_scale);

        let mut positions = vec![Point::ORIGIN; items.len()];
        let mut group_of = vec![GroupId(0); items.len()];
        let mut placed_groups = Vec::with_capacity(consolidation.groups.len());
        for (group, &centroid) in consolidation.groups.iter().zip(&projection.positions) {
            let members: Vec<&Item> = group.members.iter().map(|&i| &items[i]).collect();
            let scatter = scatter_group(centroid, &members, dim, base, params);
            for (&idx, &pos) in group.members.iter().zip(&scatter.positions) {
                positions[idx] = pos;
                group_of[idx] = group.id;
            }

            // Stage 5
            let anchor = label_anchor(&scatter.positions, centroid);

            placed_groups.push(PlacedGroup {
                id: group.id,
                name: group.name.clone(),
                members: members.iter().map(|m| m.id.clone()).collect(),
                centroid,
                anchor,
                variance: scatter.variance,
                mean_intra_distance: scatter.mean_intra_distance,
                radius: scatter.radius,
            });
        }

        let placed_items = items
            .iter()
            .zip(positions.into_iter().zip(group_of))
            .map(|(item, (position, group))| PlacedItem {
                id: item.id.clone(),
                group,
                position,
            })
            .collect();

        info!(
            items = items.len(),
            raw_groups,
            groups = placed_groups.len(),
            merges = consolidation.merges.len(),
            stress = projection.stress,
            "layout: done"
        );

        Ok(Layout {
            items: placed_items,
            names: placed_groups.iter().map(|g| (g.id, g.name.clone())).collect(),
            groups: placed_groups,
            merges: consolidation.merges,
            stress: projection.stress,
            insufficient: consolidation.insufficient,
        })
    }
}
