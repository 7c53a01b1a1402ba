//! Intra-group scatter.
//!
//! Items are placed around their group's layout centroid:
//!
//! ```text
//! base      = F * median(nearest inter-centroid distance)
//! radius(g) = base * (1 + var(g) * V)
//! dist(p)   = radius(g) * intra(p) / mean_intra(g)
//! pos(p)    = centroid(g) + direction(p) * dist(p)
//! ```
//!
//! The radius scales with the centroid spacing. Items far from their
//! group's mean embedding sit further out. Under heavy skew
//! (`intra(p) >> mean_intra(g)`) a single outlier can reach into a
//! neighbouring cloud. Distances are not clamped.

use crate::cosine::{cosine_distance, dispersion, mean_embedding};
use crate::types::{Item, Point};

/// Directions shorter than this are treated as zero.
const MIN_DIRECTION: f64 = 1e-12;

/// Mean intra distances at or below this are treated as zero.
const MIN_MEAN_INTRA: f64 = 1e-12;

/// Median centroid spacings at or below this fraction of the fallback
/// spacing are treated as zero.
const MIN_SPACING_RATIO: f64 = 1e-6;

/// Distance from each centroid to its nearest other centroid.
/// Empty for fewer than two centroids.
pub fn nearest_neighbor_distances(centroids: &[Point]) -> Vec<f64> {
    if centroids.len() < 2 {
        return Vec::new();
    }
    centroids
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            centroids
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &o)| c.distance(o))
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

/// Median of the values. Even counts average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Base scatter radius shared by every group.
///
/// With a single centroid, or when most centroids coincide and the median
/// spacing is zero, `fallback` (the layout scale) stands in for it.
pub fn base_radius(centroids: &[Point], fraction: f64, fallback: f64) -> f64 {
    let spacing = median(&nearest_neighbor_distances(centroids))
        .filter(|&s| s > fallback * MIN_SPACING_RATIO)
        .unwrap_or(fallback);
    fraction * spacing
}

/// Widens the base radius by the group's embedding dispersion.
pub fn effective_radius(base: f64, variance: f64, amplifier: f64) -> f64 {
    base * (1.0 + variance * amplifier)
}

/// Distance of one item from its group centroid.
///
/// Singleton groups, and groups whose members all coincide, have no
/// meaningful mean intra distance; their items sit at exactly `radius`.
pub fn scatter_distance(radius: f64, intra: f64, mean_intra: f64, members: usize) -> f64 {
    if members <= 1 || mean_intra <= MIN_MEAN_INTRA {
        return radius;
    }
    radius * (intra / mean_intra)
}

/// 64-bit FNV-1a.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |h, &b| (h ^ b as u64).wrapping_mul(PRIME))
}

/// Deterministic unit vector for an item id: angle `2*pi * fnv1a(id) / 2^64`.
pub fn hashed_direction(id: &str) -> Point {
    let theta = std::f64::consts::TAU * (fnv1a(id.as_bytes()) as f64 / 2f64.powi(64));
    Point::new(theta.cos(), theta.sin())
}

/// Unit vector from `origin` toward `hint`, or the hashed direction of
/// `id` when the two coincide.
pub fn direction(origin: Point, hint: Point, id: &str) -> Point {
    let d = hint - origin;
    let len = d.norm();
    if len <= MIN_DIRECTION {
        return hashed_direction(id);
    }
    d / len
}

/// Derived statistics and final positions of one group's members.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupScatter {
    pub variance: f64,
    pub mean_intra_distance: f64,
    pub radius: f64,

    /// One position per member, in member order.
    pub positions: Vec<Point>,
}

/// Scatter parameters from the layout config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterParams {
    pub fraction: f64,
    pub amplifier: f64,
}

/// Places the members of one group around `centroid`.
///
/// `base` is the shared radius from [`base_radius`]. Each direction points
/// from the members' mean hint toward the member's own hint.
pub fn scatter_group(
    centroid: Point,
    members: &[&Item],
    dim: usize,
    base: f64,
    params: ScatterParams,
) -> GroupScatter {
    let embeddings = || members.iter().map(|m| m.embedding.as_slice());

    let mean_emb = mean_embedding(embeddings(), dim);
    let variance = dispersion(embeddings(), dim);
    let intra: Vec<f64> = members
        .iter()
        .map(|m| cosine_distance(&m.embedding, &mean_emb))
        .collect();
    let mean_intra = if members.is_empty() {
        0.0
    } else {
        intra.iter().sum::<f64>() / members.len() as f64
    };

    let radius = effective_radius(base, variance, params.amplifier);
    let hint_origin = Point::mean(members.iter().map(|m| m.hint)).unwrap_or(Point::ORIGIN);

    let positions = members
        .iter()
        .zip(&intra)
        .map(|(m, &d)| {
            let dir = direction(hint_origin, m.hint, &m.id);
            centroid + dir * scatter_distance(radius, d, mean_intra, members.len())
        })
        .collect();

    GroupScatter {
        variance,
        mean_intra_distance: mean_intra,
        radius,
        positions,
    }
}
