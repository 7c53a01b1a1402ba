//! Metric multidimensional scaling of the group distance matrix.
//!
//! The projection is fully deterministic:
//!
//! 1. Initial configuration from classical (Torgerson) MDS. The two leading
//!    eigenvectors of the double-centred matrix `-1/2 J D^2 J` are found by
//!    power iteration from fixed start vectors. If that solution collapses
//!    to a point, the groups start evenly spaced on the unit circle in row
//!    order instead.
//! 2. SMACOF refinement with unit weights (repeated Guttman transforms)
//!    until the relative stress improvement drops below the tolerance.
//! 3. The result is centred on the origin and multiplied by the layout
//!    scale.

use tracing::debug;

use crate::distance::DistanceMatrix;
use crate::types::Point;

const POWER_ITERATIONS: usize = 500;
const EPS: f64 = 1e-12;

/// SMACOF parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MdsOptions {
    pub max_iter: usize,
    pub tolerance: f64,
    pub scale: f64,
}

impl Default for MdsOptions {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tolerance: 1e-9,
            scale: 1.0,
        }
    }
}

/// Group centroids on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// One position per matrix row, already scaled.
    pub positions: Vec<Point>,

    /// Kruskal stress-1 of the unscaled solution.
    pub stress: f64,

    /// SMACOF iterations performed.
    pub iterations: usize,
}

/// Places every row of `matrix` in 2D so Euclidean distances approximate
/// the matrix entries.
///
/// One group sits at the origin. Two groups sit at `(-d/2, 0)` and
/// `(d/2, 0)`, which reproduces their distance exactly.
pub fn project(matrix: &DistanceMatrix, opts: &MdsOptions) -> Projection {
    let n = matrix.len();
    match n {
        0 => {
            return Projection {
                positions: Vec::new(),
                stress: 0.0,
                iterations: 0,
            };
        }
        1 => {
            return Projection {
                positions: vec![Point::ORIGIN],
                stress: 0.0,
                iterations: 0,
            };
        }
        2 => {
            let half = matrix.get(0, 1) / 2.0 * opts.scale;
            return Projection {
                positions: vec![Point::new(-half, 0.0), Point::new(half, 0.0)],
                stress: 0.0,
                iterations: 0,
            };
        }
        _ => {}
    }

    let init = classical(matrix).unwrap_or_else(|| circle(n));
    let (mut x, iterations) = smacof(matrix, init, opts);

    let center = Point::mean(x.iter().copied()).unwrap_or(Point::ORIGIN);
    for p in x.iter_mut() {
        *p = *p - center;
    }

    let stress = stress(matrix, &x);
    debug!(groups = n, iterations, stress, "layout: projected group centroids");

    Projection {
        positions: x.into_iter().map(|p| p * opts.scale).collect(),
        stress,
        iterations,
    }
}

/// Kruskal stress-1: `sqrt(sum (d_ij - delta_ij)^2 / sum delta_ij^2)` over
/// `i < j`. Zero when every target distance is zero.
pub fn stress(matrix: &DistanceMatrix, positions: &[Point]) -> f64 {
    let n = matrix.len();
    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let target = matrix.get(i, j);
            let got = positions[i].distance(positions[j]);
            num += (got - target).powi(2);
            den += target * target;
        }
    }
    if den <= EPS {
        return 0.0;
    }
    (num / den).sqrt()
}

fn raw_stress(matrix: &DistanceMatrix, x: &[Point]) -> f64 {
    let n = matrix.len();
    let mut s = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            s += (x[i].distance(x[j]) - matrix.get(i, j)).powi(2);
        }
    }
    s
}

fn smacof(matrix: &DistanceMatrix, mut x: Vec<Point>, opts: &MdsOptions) -> (Vec<Point>, usize) {
    let n = matrix.len();
    let mut prev = raw_stress(matrix, &x);
    let mut iterations = 0;

    while iterations < opts.max_iter {
        // Guttman transform with unit weights:
        // x_i' = 1/n * sum_j (delta_ij / d_ij) * (x_i - x_j)
        let mut next = vec![Point::ORIGIN; n];
        for (i, slot) in next.iter_mut().enumerate() {
            let mut acc = Point::ORIGIN;
            for j in 0..n {
                if i == j {
                    continue;
                }
                let d = x[i].distance(x[j]);
                if d > EPS {
                    acc += (x[i] - x[j]) * (matrix.get(i, j) / d);
                }
            }
            *slot = acc / n as f64;
        }
        x = next;
        iterations += 1;

        let cur = raw_stress(matrix, &x);
        if prev - cur <= opts.tolerance * prev.max(EPS) {
            break;
        }
        prev = cur;
    }

    (x, iterations)
}

/// Classical MDS in two dimensions. Returns `None` when the leading
/// eigenvalue is not positive.
fn classical(matrix: &DistanceMatrix) -> Option<Vec<Point>> {
    let n = matrix.len();

    let mut sq = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            sq[i * n + j] = matrix.get(i, j).powi(2);
        }
    }
    let row_mean: Vec<f64> = (0..n)
        .map(|i| (0..n).map(|j| sq[i * n + j]).sum::<f64>() / n as f64)
        .collect();
    let grand_mean = row_mean.iter().sum::<f64>() / n as f64;

    let mut b = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            b[i * n + j] = -0.5 * (sq[i * n + j] - row_mean[i] - row_mean[j] + grand_mean);
        }
    }

    // Shift by a Gershgorin bound so the largest algebraic eigenvalue is
    // also the largest in magnitude.
    let shift = (0..n)
        .map(|i| (0..n).map(|j| b[i * n + j].abs()).sum::<f64>())
        .fold(0.0, f64::max);

    let start1: Vec<f64> = (0..n).map(|i| (i + 1) as f64).collect();
    let (lambda1, v1) = leading_eigen(&b, n, shift, start1, &[])?;
    if lambda1 <= EPS {
        return None;
    }

    let start2: Vec<f64> = (0..n)
        .map(|i| {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            sign * (n - i) as f64
        })
        .collect();
    let (lambda2, v2) = leading_eigen(&b, n, shift, start2, &[&v1])
        .unwrap_or((0.0, vec![0.0; n]));

    let s1 = lambda1.sqrt();
    let s2 = lambda2.max(0.0).sqrt();
    let mut x: Vec<Point> = (0..n).map(|i| Point::new(s1 * v1[i], s2 * v2[i])).collect();

    // A collinear start would keep SMACOF on the line forever.
    if s2 <= EPS {
        let lift = s1 * 1e-3;
        for (i, p) in x.iter_mut().enumerate() {
            let theta = std::f64::consts::TAU * i as f64 / n as f64;
            p.y = lift * theta.sin();
        }
    }
    Some(x)
}

/// Power iteration on `B + shift*I`, kept orthogonal to the all-ones
/// vector and to every vector in `against`. Returns the eigenvalue of `B`
/// and the unit eigenvector.
fn leading_eigen(
    b: &[f64],
    n: usize,
    shift: f64,
    mut v: Vec<f64>,
    against: &[&Vec<f64>],
) -> Option<(f64, Vec<f64>)> {
    let orthogonalize = |v: &mut Vec<f64>| {
        let mean = v.iter().sum::<f64>() / n as f64;
        for x in v.iter_mut() {
            *x -= mean;
        }
        for u in against {
            let dot: f64 = v.iter().zip(u.iter()).map(|(a, b)| a * b).sum();
            for (x, &ux) in v.iter_mut().zip(u.iter()) {
                *x -= dot * ux;
            }
        }
    };
    let normalize = |v: &mut Vec<f64>| -> bool {
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm <= EPS {
            return false;
        }
        for x in v.iter_mut() {
            *x /= norm;
        }
        true
    };

    orthogonalize(&mut v);
    if !normalize(&mut v) {
        return None;
    }

    for _ in 0..POWER_ITERATIONS {
        let mut w = vec![0.0; n];
        for i in 0..n {
            let mut acc = shift * v[i];
            for j in 0..n {
                acc += b[i * n + j] * v[j];
            }
            w[i] = acc;
        }
        orthogonalize(&mut w);
        if !normalize(&mut w) {
            return None;
        }
        v = w;
    }

    let mut lambda = 0.0;
    for i in 0..n {
        let mut bv = 0.0;
        for j in 0..n {
            bv += b[i * n + j] * v[j];
        }
        lambda += v[i] * bv;
    }
    Some((lambda, v))
}

/// Unit circle start, used when classical MDS has nothing to offer.
fn circle(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / n as f64;
            Point::new(theta.cos(), theta.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GroupId;

    fn matrix(rows: Vec<Vec<f64>>) -> DistanceMatrix {
        let ids = (0..rows.len() as u32).map(GroupId).collect();
        DistanceMatrix::from_rows(ids, &rows)
    }

    fn euclid(points: &[(f64, f64)]) -> DistanceMatrix {
        let n = points.len();
        let rows = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        let (ax, ay) = points[i];
                        let (bx, by) = points[j];
                        (ax - bx).hypot(ay - by)
                    })
                    .collect()
            })
            .collect();
        matrix(rows)
    }

    #[test]
    fn test_single_group_at_origin() {
        let p = project(&matrix(vec![vec![0.0]]), &MdsOptions::default());
        assert_eq!(p.positions, vec![Point::ORIGIN]);
        assert_eq!(p.stress, 0.0);
    }

    #[test]
    fn test_two_groups_symmetric() {
        let m = matrix(vec![vec![0.0, 0.8], vec![0.8, 0.0]]);
        let opts = MdsOptions {
            scale: 10.0,
            ..MdsOptions::default()
        };
        let p = project(&m, &opts);
        assert_eq!(p.positions.len(), 2);
        assert!((p.positions[0].x + 4.0).abs() < 1e-12);
        assert!((p.positions[1].x - 4.0).abs() < 1e-12);
        assert_eq!(p.positions[0].y, 0.0);
        assert!((p.positions[0].distance(p.positions[1]) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_recovers_planar_configuration() {
        let pts = [(0.0, 0.0), (3.0, 0.0), (0.0, 4.0), (3.0, 4.0), (1.5, 2.0)];
        let m = euclid(&pts);
        let p = project(&m, &MdsOptions::default());
        assert!(p.stress < 1e-4, "planar input should embed exactly, stress {}", p.stress);
        for i in 0..pts.len() {
            for j in 0..pts.len() {
                let got = p.positions[i].distance(p.positions[j]);
                assert!((got - m.get(i, j)).abs() < 1e-3, "d({i},{j}) = {got}");
            }
        }
    }

    #[test]
    fn test_collinear_input() {
        let m = euclid(&[(0.0, 0.0), (1.0, 0.0), (3.0, 0.0)]);
        let p = project(&m, &MdsOptions::default());
        assert!(p.stress < 1e-3, "stress {}", p.stress);
        assert!((p.positions[0].distance(p.positions[2]) - 3.0).abs() < 1e-2);
    }

    #[test]
    fn test_equidistant_groups_stay_comparable() {
        let d = 0.8;
        let m = matrix(
            (0..4)
                .map(|i| (0..4).map(|j| if i == j { 0.0 } else { d }).collect())
                .collect(),
        );
        let p = project(&m, &MdsOptions::default());
        for i in 0..4 {
            for j in (i + 1)..4 {
                let ratio = p.positions[i].distance(p.positions[j]) / d;
                assert!((0.5..1.6).contains(&ratio), "ratio({i},{j}) = {ratio}");
            }
        }
        // A regular tetrahedron does not fit in the plane.
        assert!(p.stress > 0.0);
    }

    #[test]
    fn test_all_zero_distances_stay_finite() {
        let m = matrix(vec![vec![0.0; 3]; 3]);
        let p = project(&m, &MdsOptions::default());
        assert!(p.positions.iter().all(|q| q.is_finite()));
        assert_eq!(p.stress, 0.0);
    }

    #[test]
    fn test_centred_and_scaled() {
        let m = euclid(&[(0.0, 0.0), (2.0, 0.0), (0.0, 2.0)]);
        let base = project(&m, &MdsOptions::default());
        let scaled = project(
            &m,
            &MdsOptions {
                scale: 5.0,
                ..MdsOptions::default()
            },
        );
        let c = Point::mean(base.positions.iter().copied()).unwrap();
        assert!(c.norm() < 1e-9);
        for (a, b) in base.positions.iter().zip(&scaled.positions) {
            assert!((a.x * 5.0 - b.x).abs() < 1e-9);
            assert!((a.y * 5.0 - b.y).abs() < 1e-9);
        }
        assert_eq!(base.stress, scaled.stress);
    }

    #[test]
    fn test_deterministic() {
        let m = matrix(vec![
            vec![0.0, 0.3, 0.9, 0.7],
            vec![0.3, 0.0, 0.6, 0.8],
            vec![0.9, 0.6, 0.0, 0.4],
            vec![0.7, 0.8, 0.4, 0.0],
        ]);
        let a = project(&m, &MdsOptions::default());
        let b = project(&m, &MdsOptions::default());
        assert_eq!(a, b);
    }
}
