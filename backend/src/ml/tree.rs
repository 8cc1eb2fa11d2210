//! CART regression tree with variance-reduction splits

use serde::{Deserialize, Serialize};

/// Growth limits for [`RegressionTree::fit`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl TreeParams {
    pub fn with_max_depth(max_depth: Option<usize>) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Fitted tree stored as a flat node arena, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub n_features: usize,
    pub nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct Builder<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    params: TreeParams,
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit on `rows` (one encoded feature row per sample) and `targets`.
    /// Rows must be non-empty and share one width.
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], params: TreeParams) -> Self {
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        let mut builder = Builder {
            rows,
            targets,
            params,
            nodes: Vec::new(),
        };
        let mut indices: Vec<usize> = (0..rows.len().min(targets.len())).collect();
        builder.grow(&mut indices, 0);

        Self {
            n_features,
            nodes: builder.nodes,
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value, .. }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

impl Builder<'_> {
    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let id = self.nodes.len();
        let n = indices.len();
        let sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        let mean = if n > 0 { sum / n as f64 } else { 0.0 };
        self.nodes.push(Node::Leaf {
            value: mean,
            samples: n,
        });

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || n < self.params.min_samples_split.max(2) || self.is_pure(indices) {
            return id;
        }

        let Some(split) = self.best_split(indices, sum) else {
            return id;
        };

        let mid = partition(indices, |i| self.rows[i][split.feature] <= split.threshold);
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = self.grow(left_indices, depth + 1);
        let right = self.grow(right_indices, depth + 1);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn is_pure(&self, indices: &[usize]) -> bool {
        let first = self.targets[indices[0]];
        indices.iter().all(|&i| self.targets[i] == first)
    }

    /// Split maximizing `sum_l²/n_l + sum_r²/n_r`, equivalent to the largest
    /// reduction of squared error. Ties keep the lowest feature index.
    fn best_split(&self, indices: &[usize], total: f64) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_score = total * total / n as f64;
        let n_features = self.rows[indices[0]].len();

        let mut best: Option<SplitCandidate> = None;
        let mut column: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature in 0..n_features {
            column.clear();
            column.extend(indices.iter().map(|&i| (self.rows[i][feature], self.targets[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for split_at in 1..n {
                left_sum += column[split_at - 1].1;
                let (prev, next) = (column[split_at - 1].0, column[split_at].0);
                if split_at < min_leaf || n - split_at < min_leaf || prev == next {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / split_at as f64
                    + right_sum * right_sum / (n - split_at) as f64;
                if score <= parent_score + f64::EPSILON * parent_score.abs() {
                    continue;
                }
                if best.as_ref().map_or(true, |b| score > b.score) {
                    let mut threshold = prev + (next - prev) / 2.0;
                    if threshold >= next {
                        threshold = prev;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }

        best
    }
}

/// Reorder `indices` so every element matching `pred` comes first; returns
/// the number of matches.
fn partition<F>(indices: &mut [usize], pred: F) -> usize
where
    F: Fn(usize) -> bool,
{
    let mut boundary = 0;
    for j in 0..indices.len() {
        if pred(indices[j]) {
            indices.swap(boundary, j);
            boundary += 1;
        }
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_function_is_learned_exactly() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..10).map(|i| if i < 5 { 1.0 } else { 9.0 }).collect();
        let tree = RegressionTree::fit(&rows, &targets, TreeParams::default());

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.predict(&[2.0]), 1.0);
        assert_eq!(tree.predict(&[4.5]), 1.0);
        assert_eq!(tree.predict(&[4.6]), 9.0);
        assert_eq!(tree.predict(&[100.0]), 9.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let rows: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..32).map(|i| (i * i) as f64).collect();

        let stump = RegressionTree::fit(&rows, &targets, TreeParams::with_max_depth(Some(1)));
        assert_eq!(stump.depth(), 1);

        let full = RegressionTree::fit(&rows, &targets, TreeParams::default());
        assert_eq!(full.leaf_count(), 32);
        assert_eq!(full.predict(&[7.0]), 49.0);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let tree = RegressionTree::fit(&rows, &[4.0, 4.0, 4.0], TreeParams::default());
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.predict(&[0.0, 0.0]), 4.0);
    }

    #[test]
    fn test_serde_preserves_predictions() {
        let rows = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let tree = RegressionTree::fit(&rows, &[1.0, 2.0, 3.0, 4.0], TreeParams::default());
        let json = serde_json::to_string(&tree).unwrap();
        let restored: RegressionTree = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(&[2.2]), tree.predict(&[2.2]));
    }
}
