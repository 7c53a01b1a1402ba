use crate::cosine::cosine_distance;
use crate::types::{Group, GroupId};

/// Sums of cross-pair cosine distances between live groups.
///
/// Built once from the member embeddings. Sums are additive under merging,
/// so consolidation folds rows together instead of revisiting items; the
/// mean distance of a pair is its sum over the product of the sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDistances {
    ids: Vec<GroupId>,
    sizes: Vec<usize>,
    sums: Vec<Vec<f64>>,
}

impl GroupDistances {
    /// Rows follow `groups`. Member indices point into `embeddings`.
    pub fn compute(groups: &[Group], embeddings: &[&[f32]]) -> Self {
        let n = groups.len();
        let members: Vec<(usize, usize)> = groups
            .iter()
            .enumerate()
            .flat_map(|(row, g)| g.members.iter().map(move |&item| (item, row)))
            .collect();

        let mut sums = vec![vec![0.0; n]; n];
        for (k, &(p, gp)) in members.iter().enumerate() {
            for &(q, gq) in &members[k + 1..] {
                if gp == gq {
                    continue;
                }
                let d = cosine_distance(embeddings[p], embeddings[q]);
                sums[gp][gq] += d;
                sums[gq][gp] += d;
            }
        }

        Self {
            ids: groups.iter().map(|g| g.id).collect(),
            sizes: groups.iter().map(|g| g.members.len()).collect(),
            sums,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Mean cross-pair distance between rows `i` and `j`; 0 on the diagonal.
    pub fn mean(&self, i: usize, j: usize) -> f64 {
        let pairs = self.sizes[i] * self.sizes[j];
        if i == j || pairs == 0 {
            return 0.0;
        }
        self.sums[i][j] / pairs as f64
    }

    /// Folds row `from` into row `into` and removes row `from`.
    pub fn merge(&mut self, into: usize, from: usize) {
        let n = self.len();
        for k in 0..n {
            let moved = self.sums[from][k];
            self.sums[into][k] += moved;
            self.sums[k][into] = self.sums[into][k];
        }
        self.sums[into][into] = 0.0;
        self.sizes[into] += self.sizes[from];

        self.sums.remove(from);
        for row in &mut self.sums {
            row.remove(from);
        }
        self.sizes.remove(from);
        self.ids.remove(from);
    }

    /// Snapshot of the current mean distances.
    pub fn matrix(&self) -> DistanceMatrix {
        let n = self.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                data[i * n + j] = self.mean(i, j);
            }
        }
        DistanceMatrix {
            ids: self.ids.clone(),
            data,
        }
    }
}

/// Symmetric group-by-group semantic distance matrix.
///
/// Rows follow the order of the groups it was built from. Off-diagonal
/// entries are mean cross-pair cosine distances; the diagonal is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    ids: Vec<GroupId>,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Builds a matrix from explicit values. `rows` must be square.
    pub fn from_rows(ids: Vec<GroupId>, rows: &[Vec<f64>]) -> Self {
        let n = ids.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    data[i * n + j] = rows[i][j];
                }
            }
        }
        Self { ids, data }
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.ids.len() + j]
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[GroupId] {
        &self.ids
    }

    /// Row indices `(i, j)` with `i < j` of the globally closest pair and
    /// their distance. Ties keep the first pair in row order.
    pub fn nearest_pair(&self) -> Option<(usize, usize, f64)> {
        let n = self.len();
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            for j in (i + 1)..n {
                let d = self.get(i, j);
                match best {
                    Some((_, _, bd)) if d >= bd => {}
                    _ => best = Some((i, j, d)),
                }
            }
        }
        best
    }
}
