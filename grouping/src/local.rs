use std::collections::BTreeMap;

use atlas_layout::{GroupId, Grouping, cosine_distance, mean_embedding};
use tracing::debug;

use crate::config::LocalConfig;
use crate::dbscan::{Label, dbscan};
use crate::error::GroupingError;
use crate::grouper::{Grouper, GroupingRequest};

/// Offline grouper: DBSCAN over cosine distance.
///
/// Names are generic ("Cluster 1", "Cluster 2", ...) in discovery order
/// and ids run `0..k`. Noise points join the cluster whose mean embedding
/// is closest; if every point is noise the whole batch is one cluster.
/// `target_groups` is ignored. The result depends only on the request,
/// so repeated calls agree.
#[derive(Debug, Clone, Default)]
pub struct LocalGrouper {
    cfg: LocalConfig,
}

impl LocalGrouper {
    pub fn new(cfg: LocalConfig) -> Self {
        Self { cfg }
    }

    /// Synchronous grouping, shared by the async trait method.
    pub fn group_now(&self, req: &GroupingRequest) -> Result<Grouping, GroupingError> {
        if req.items.is_empty() {
            return Err(GroupingError::EmptyInput);
        }

        let vectors: Vec<&[f32]> = req.items.iter().map(|i| i.embedding.as_slice()).collect();
        let labels = dbscan(&vectors, self.cfg.eps, self.cfg.min_points.max(1));

        let clusters = labels
            .iter()
            .filter_map(|l| match l {
                Label::Cluster(c) => Some(*c + 1),
                Label::Noise => None,
            })
            .max()
            .unwrap_or(0);

        let cluster_of: Vec<usize> = if clusters == 0 {
            vec![0; labels.len()]
        } else {
            let centers = cluster_means(&vectors, &labels, clusters);
            labels
                .iter()
                .zip(&vectors)
                .map(|(label, v)| match label {
                    Label::Cluster(c) => *c,
                    Label::Noise => nearest(&centers, v),
                })
                .collect()
        };

        let noise = labels.iter().filter(|l| **l == Label::Noise).count();
        debug!(
            items = req.items.len(),
            clusters = clusters.max(1),
            noise,
            "grouping: local clustering done"
        );

        let mut assignment = BTreeMap::new();
        let mut names = BTreeMap::new();
        for (item, &c) in req.items.iter().zip(&cluster_of) {
            let id = GroupId(c as u32);
            assignment.insert(item.id.clone(), id);
            names.entry(id).or_insert_with(|| format!("Cluster {}", c + 1));
        }
        Ok(Grouping { assignment, names })
    }
}

#[async_trait::async_trait]
impl Grouper for LocalGrouper {
    async fn group(&self, req: &GroupingRequest) -> Result<Grouping, GroupingError> {
        self.group_now(req)
    }

    fn name(&self) -> &str {
        "local"
    }
}

fn cluster_means(vectors: &[&[f32]], labels: &[Label], clusters: usize) -> Vec<Vec<f32>> {
    let dim = vectors.first().map_or(0, |v| v.len());
    (0..clusters)
        .map(|c| {
            let members = vectors
                .iter()
                .zip(labels)
                .filter(|(_, l)| **l == Label::Cluster(c))
                .map(|(v, _)| *v);
            mean_embedding(members, dim)
        })
        .collect()
}

/// Index of the closest center; ties go to the lower index.
fn nearest(centers: &[Vec<f32>], v: &[f32]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centers.iter().enumerate() {
        let d = cosine_distance(v, c);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}
