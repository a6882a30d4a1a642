//! Global connectivity: whether water can travel from one feature to
//! another along any path, regardless of adjacency.
//!
//! This is the reflexive transitive closure of the local connectivity
//! matrix. Every feature reaches itself, so a catchment always counts
//! toward its own drainage area.

use crate::connectivity::{ConnectivityMatrix, NodeId};
use crate::error::{NetworkError, Result};
use crate::matrix::BitMatrix;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Node count above which [`ClosureStrategy::Auto`] switches to the
/// sparse search.
pub const SPARSE_THRESHOLD: usize = 2000;

/// How the closure is computed. Every strategy produces the same matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClosureStrategy {
    /// Warshall's algorithm over row bitsets, O(n^3 / 64).
    Dense,
    /// Warshall's algorithm with the rows of each k-round updated in
    /// parallel. Rounds run one after another.
    DenseParallel,
    /// Breadth-first search from every node, O(n * (n + e)).
    Sparse,
    /// `Sparse` above [`SPARSE_THRESHOLD`] nodes, `Dense` otherwise.
    #[default]
    Auto,
}

impl ClosureStrategy {
    fn resolve(self, size: usize) -> ClosureStrategy {
        match self {
            ClosureStrategy::Auto if size > SPARSE_THRESHOLD => ClosureStrategy::Sparse,
            ClosureStrategy::Auto => ClosureStrategy::Dense,
            other => other,
        }
    }
}

/// Reachability matrix with the same labels as the connectivity matrix it
/// was computed from. Entry `(i, j)` is set iff `i` reaches `j` through zero
/// or more edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitiveClosure<Id> {
    ids: Vec<Id>,
    reach: BitMatrix,
}

impl<Id: NodeId> TransitiveClosure<Id> {
    pub fn compute(connectivity: &ConnectivityMatrix<Id>, strategy: ClosureStrategy) -> Self {
        let size = connectivity.len();
        let strategy = strategy.resolve(size);
        debug!("closure: {size} nodes using {strategy:?}");
        let mut reach = match strategy {
            ClosureStrategy::Sparse => sparse_closure(connectivity),
            ClosureStrategy::DenseParallel => {
                let mut reach = connectivity.adjacency().clone();
                warshall_parallel(&mut reach);
                reach
            }
            _ => {
                let mut reach = connectivity.adjacency().clone();
                warshall(&mut reach);
                reach
            }
        };
        for k in 0..size {
            reach.set(k, k);
        }
        debug!("closure: {} reachable pairs", reach.count_ones());
        TransitiveClosure {
            ids: connectivity.ids().to_vec(),
            reach,
        }
    }

    pub fn ids(&self) -> &[Id] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index_of(&self, id: &Id) -> Option<usize> {
        self.ids.binary_search(id).ok()
    }

    fn require(&self, id: &Id) -> Result<usize> {
        self.index_of(id)
            .ok_or_else(|| NetworkError::UnknownIdentifier(id.to_string()))
    }

    /// Whether water at `from` can reach `to`.
    pub fn reaches(&self, from: &Id, to: &Id) -> Result<bool> {
        let i = self.require(from)?;
        let j = self.require(to)?;
        Ok(self.reach.get(i, j))
    }

    /// Index-based form of [`Self::reaches`].
    pub fn reaches_index(&self, i: usize, j: usize) -> bool {
        self.reach.get(i, j)
    }

    /// Every feature draining into `id`, including `id` itself.
    pub fn upstream_of(&self, id: &Id) -> Result<Vec<&Id>> {
        let c = self.require(id)?;
        Ok(self.upstream_indices(c).map(|j| &self.ids[j]).collect())
    }

    pub(crate) fn upstream_indices(&self, c: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.ids.len()).filter(move |&j| self.reach.get(j, c))
    }

    /// Every feature `id` drains into, including `id` itself.
    pub fn downstream_of(&self, id: &Id) -> Result<Vec<&Id>> {
        let i = self.require(id)?;
        Ok(self.reach.ones_in_row(i).map(|j| &self.ids[j]).collect())
    }

    /// True when every direct connection is also a reachability entry.
    pub fn covers(&self, connectivity: &ConnectivityMatrix<Id>) -> bool {
        self.ids.as_slice() == connectivity.ids()
            && self.reach.is_superset_of(connectivity.adjacency())
    }
}

fn log_round(k: usize, size: usize) {
    if k > 0 && k % 1000 == 0 {
        debug!("closure: finished {k} of {size} rounds");
    }
}

/// `g[i][j] |= g[i][k] & g[k][j]` for every k, expressed as OR-ing row k
/// into every row that reaches k.
fn warshall(g: &mut BitMatrix) {
    let size = g.size();
    for k in 0..size {
        for i in 0..size {
            if g.get(i, k) {
                g.or_row_into(k, i);
            }
        }
        log_round(k, size);
    }
}

fn warshall_parallel(g: &mut BitMatrix) {
    let size = g.size();
    let width = g.words_per_row();
    if width == 0 {
        return;
    }
    for k in 0..size {
        // row k does not change during round k, so a snapshot is exact
        let pivot = g.row(k).to_vec();
        let (word, bit) = (k / 64, 1u64 << (k % 64));
        g.words_mut().par_chunks_mut(width).for_each(|row| {
            if row[word] & bit != 0 {
                for (dst, src) in row.iter_mut().zip(&pivot) {
                    *dst |= *src;
                }
            }
        });
        log_round(k, size);
    }
}

fn sparse_closure<Id: NodeId>(connectivity: &ConnectivityMatrix<Id>) -> BitMatrix {
    let size = connectivity.len();
    let successors: Vec<Vec<usize>> = (0..size)
        .map(|i| connectivity.successors(i).collect())
        .collect();
    let mut reach = BitMatrix::new(size);
    let mut visited = vec![false; size];
    let mut queue = VecDeque::new();
    for source in 0..size {
        visited.iter_mut().for_each(|v| *v = false);
        queue.clear();
        queue.push_back(source);
        while let Some(node) = queue.pop_front() {
            for &next in &successors[node] {
                if !visited[next] {
                    visited[next] = true;
                    reach.set(source, next);
                    queue.push_back(next);
                }
            }
        }
    }
    reach
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRATEGIES: [ClosureStrategy; 4] = [
        ClosureStrategy::Dense,
        ClosureStrategy::DenseParallel,
        ClosureStrategy::Sparse,
        ClosureStrategy::Auto,
    ];

    /// Two tributaries joining a main stem, plus a braided reach.
    fn network() -> ConnectivityMatrix<u32> {
        ConnectivityMatrix::from_edges(vec![
            (1, 3),
            (2, 3),
            (3, 4),
            (4, 5),
            (4, 6),
            (5, 7),
            (6, 7),
            (7, 8),
        ])
    }

    #[test]
    fn test_example_closure() {
        let local = ConnectivityMatrix::from_edges(vec![("A", "B"), ("B", "C"), ("A", "C")]);
        for strategy in STRATEGIES {
            let closure = TransitiveClosure::compute(&local, strategy);
            assert_eq!(closure.reaches(&"A", &"C"), Ok(true));
            assert_eq!(closure.reaches(&"C", &"A"), Ok(false));
            assert_eq!(closure.upstream_of(&"C").unwrap(), vec![&"A", &"B", &"C"]);
            assert_eq!(closure.upstream_of(&"A").unwrap(), vec![&"A"]);
        }
    }

    #[test]
    fn test_self_reachability() {
        let local = network();
        for strategy in STRATEGIES {
            let closure = TransitiveClosure::compute(&local, strategy);
            for i in 0..closure.len() {
                assert!(closure.reaches_index(i, i));
            }
        }
    }

    #[test]
    fn test_closure_covers_local_connectivity() {
        let local = network();
        for strategy in STRATEGIES {
            assert!(TransitiveClosure::compute(&local, strategy).covers(&local));
        }
    }

    #[test]
    fn test_closure_is_transitive() {
        let closure = TransitiveClosure::compute(&network(), ClosureStrategy::Dense);
        let n = closure.len();
        for i in 0..n {
            for k in 0..n {
                for j in 0..n {
                    if closure.reaches_index(i, k) && closure.reaches_index(k, j) {
                        assert!(closure.reaches_index(i, j), "{i} -> {k} -> {j}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_strategies_agree() {
        let local = network();
        let dense = TransitiveClosure::compute(&local, ClosureStrategy::Dense);
        let parallel = TransitiveClosure::compute(&local, ClosureStrategy::DenseParallel);
        let sparse = TransitiveClosure::compute(&local, ClosureStrategy::Sparse);
        assert_eq!(dense, parallel);
        assert_eq!(dense, sparse);
    }

    #[test]
    fn test_strategies_agree_on_large_cyclic_network() {
        // a chain long enough to span several bitset words, closed into a
        // loop at one end
        let mut edges: Vec<(u32, u32)> = (0..150).map(|i| (i, i + 1)).collect();
        edges.push((150, 140));
        edges.push((7, 70));
        let local = ConnectivityMatrix::from_edges(edges);
        let dense = TransitiveClosure::compute(&local, ClosureStrategy::Dense);
        let parallel = TransitiveClosure::compute(&local, ClosureStrategy::DenseParallel);
        let sparse = TransitiveClosure::compute(&local, ClosureStrategy::Sparse);
        assert_eq!(dense, parallel);
        assert_eq!(dense, sparse);
        assert_eq!(dense.reaches(&145, &141), Ok(true));
        assert_eq!(dense.reaches(&139, &0), Ok(false));
        assert_eq!(dense.reaches(&0, &150), Ok(true));
    }

    #[test]
    fn test_downstream_of() {
        let closure = TransitiveClosure::compute(&network(), ClosureStrategy::Auto);
        assert_eq!(closure.downstream_of(&5).unwrap(), vec![&5, &7, &8]);
    }

    #[test]
    fn test_unknown_identifier() {
        let closure = TransitiveClosure::compute(&network(), ClosureStrategy::Auto);
        assert_eq!(
            closure.reaches(&1, &99),
            Err(NetworkError::UnknownIdentifier("99".to_string()))
        );
        assert!(closure.upstream_of(&0).is_err());
    }

    #[test]
    fn test_auto_threshold() {
        assert_eq!(ClosureStrategy::Auto.resolve(10), ClosureStrategy::Dense);
        assert_eq!(
            ClosureStrategy::Auto.resolve(SPARSE_THRESHOLD + 1),
            ClosureStrategy::Sparse
        );
        assert_eq!(ClosureStrategy::DenseParallel.resolve(1), ClosureStrategy::DenseParallel);
    }
}
