use std::collections::VecDeque;

use atlas_layout::cosine_distance;

/// Per-point outcome of a DBSCAN run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Label {
    Noise,
    /// Zero-based cluster index, in discovery order.
    Cluster(usize),
}

/// Runs DBSCAN with cosine distance.
///
/// A point is a core point when at least `min_points` points (itself
/// included) lie within `eps`. Clusters are numbered in the order their
/// first core point appears, so the result depends only on input order.
pub(crate) fn dbscan(vectors: &[&[f32]], eps: f64, min_points: usize) -> Vec<Label> {
    let n = vectors.len();
    let mut labels: Vec<Option<Label>> = vec![None; n];
    let mut clusters = 0usize;

    for i in 0..n {
        if labels[i].is_some() {
            continue;
        }

        let neighbors = region(vectors, i, eps);
        if neighbors.len() < min_points {
            labels[i] = Some(Label::Noise);
            continue;
        }

        let cluster = Label::Cluster(clusters);
        clusters += 1;
        labels[i] = Some(cluster);

        let mut frontier: VecDeque<usize> = neighbors.into_iter().filter(|&j| j != i).collect();
        while let Some(q) = frontier.pop_front() {
            match labels[q] {
                // Border point reached from a core point.
                Some(Label::Noise) => {
                    labels[q] = Some(cluster);
                    continue;
                }
                Some(Label::Cluster(_)) => continue,
                None => labels[q] = Some(cluster),
            }

            let reach = region(vectors, q, eps);
            if reach.len() >= min_points {
                let unclaimed = reach
                    .into_iter()
                    .filter(|&j| matches!(labels[j], None | Some(Label::Noise)));
                frontier.extend(unclaimed);
            }
        }
    }

    labels
        .into_iter()
        .map(|l| l.unwrap_or(Label::Noise))
        .collect()
}

/// Indices of all vectors within `eps` of `vectors[idx]`, itself included.
fn region(vectors: &[&[f32]], idx: usize, eps: f64) -> Vec<usize> {
    let q = vectors[idx];
    vectors
        .iter()
        .enumerate()
        .filter(|(_, v)| cosine_distance(q, v) <= eps)
        .map(|(i, _)| i)
        .collect()
}
