use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Identifier of a thematic group.
///
/// Ordered numerically; "lower identifier" in every tie-break means the
/// smaller number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point (or vector) on the layout canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).norm()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Arithmetic mean of the points, or `None` when empty.
    pub fn mean<I>(points: I) -> Option<Point>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut sum = Point::ORIGIN;
        let mut n = 0usize;
        for p in points {
            sum += p;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        Some(sum / n as f64)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, k: f64) -> Point {
        Point::new(self.x / k, self.y / k)
    }
}

/// One element of the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier.
    pub id: String,

    /// Raw semantic embedding. Semantic distance is cosine distance.
    pub embedding: Vec<f32>,

    /// Low-dimensional direction hint. Only used to pick the angle at
    /// which the item sits around its group; never used for distances.
    pub hint: Point,
}

impl Item {
    pub fn new(id: impl Into<String>, embedding: Vec<f32>, hint: Point) -> Self {
        Self {
            id: id.into(),
            embedding,
            hint,
        }
    }
}

/// Output contract of the grouping collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grouping {
    /// Item id to group id. Exactly one group per item.
    pub assignment: BTreeMap<String, GroupId>,

    /// Group id to display name.
    pub names: BTreeMap<GroupId, String>,
}

impl Grouping {
    /// Number of distinct groups that have at least one assigned item.
    pub fn group_count(&self) -> usize {
        self.assignment.values().collect::<BTreeSet<_>>().len()
    }
}

/// A live group during consolidation.
///
/// `members` holds indices into the item slice handed to the engine, in
/// ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<usize>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Record of one consolidation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    /// Group that disappeared.
    pub absorbed: GroupId,

    /// Group that received the members and kept its name.
    pub into: GroupId,

    /// Mean pairwise cosine distance between the two groups at merge time.
    pub distance: f64,
}

/// Final placement of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: String,
    pub group: GroupId,
    pub position: Point,
}

/// Final placement and derived statistics of one surviving group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedGroup {
    pub id: GroupId,
    pub name: String,

    /// Member item ids.
    pub members: Vec<String>,

    /// Layout position from the projector.
    pub centroid: Point,

    /// Label anchor: mean of the members' final positions.
    pub anchor: Point,

    /// Dispersion of member embeddings around their mean, in `[0, 1]`.
    pub variance: f64,

    /// Mean cosine distance from members to the group's mean embedding.
    pub mean_intra_distance: f64,

    /// Effective scatter radius.
    pub radius: f64,
}

/// Result of a full engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// One entry per input item, in input order.
    pub items: Vec<PlacedItem>,

    /// One entry per surviving group, ordered by id.
    pub groups: Vec<PlacedGroup>,

    /// Consolidated group id to name map, suitable for writing back.
    pub names: BTreeMap<GroupId, String>,

    /// Consolidation steps in the order they happened.
    pub merges: Vec<Merge>,

    /// Kruskal stress-1 of the group projection.
    pub stress: f64,

    /// True when the raw grouping had fewer groups than the configured
    /// minimum.
    pub insufficient: bool,
}

impl Layout {
    pub fn item(&self, id: &str) -> Option<&PlacedItem> {
        self.items.iter().find(|p| p.id == id)
    }

    pub fn group(&self, id: GroupId) -> Option<&PlacedGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// The consolidated assignment, for reuse by an offline re-layout.
    pub fn grouping(&self) -> Grouping {
        Grouping {
            assignment: self
                .items
                .iter()
                .map(|p| (p.id.clone(), p.group))
                .collect(),
            names: self.names.clone(),
        }
    }
}
