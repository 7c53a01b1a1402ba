use crate::types::Point;

/// Label anchor of a group: the mean of its members' final positions.
///
/// Scatter pushes members away from the layout centroid, and not always
/// evenly, so the centroid itself can sit in empty space. Returns
/// `fallback` for an empty member list.
pub fn label_anchor(positions: &[Point], fallback: Point) -> Point {
    Point::mean(positions.iter().copied()).unwrap_or(fallback)
}
