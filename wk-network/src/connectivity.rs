//! Local connectivity of a flow network.
//!
//! Rows are the features water flows *from* and columns the features it
//! flows *to* (FROMCOMID / TOCOMID in a PlusFlow-style edge table). The
//! matrix is square over the sorted union of every id seen at either end
//! of an edge, so features that only ever receive or only ever send flow
//! still get a full, zero-filled row and column.

use crate::matrix::BitMatrix;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// Catchment or flowline identifier: anything totally ordered, cloneable
/// and printable (COMIDs as integers, or strings).
pub trait NodeId: Ord + Clone + Display {}

impl<T: Ord + Clone + Display> NodeId for T {}

/// One directed edge of the flow network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge<Id> {
    pub from: Id,
    pub to: Id,
}

impl<Id> FlowEdge<Id> {
    pub fn new(from: Id, to: Id) -> Self {
        Self { from, to }
    }
}

impl<Id> From<(Id, Id)> for FlowEdge<Id> {
    fn from((from, to): (Id, Id)) -> Self {
        FlowEdge { from, to }
    }
}

/// Square adjacency matrix of a flow network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityMatrix<Id> {
    ids: Vec<Id>,
    adjacency: BitMatrix,
    counts: BTreeMap<(usize, usize), u32>,
}

impl<Id: NodeId> ConnectivityMatrix<Id> {
    /// Cross-tabulate an edge list. Duplicate edges collapse to one
    /// connection; their multiplicity is kept for [`Self::edge_count`].
    pub fn from_edges<I, E>(edges: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<FlowEdge<Id>>,
    {
        let edges: Vec<FlowEdge<Id>> = edges.into_iter().map(Into::into).collect();
        let ids: Vec<Id> = edges
            .iter()
            .flat_map(|e| [e.from.clone(), e.to.clone()])
            .collect::<BTreeSet<Id>>()
            .into_iter()
            .collect();

        let mut adjacency = BitMatrix::new(ids.len());
        let mut counts = BTreeMap::new();
        for edge in &edges {
            // both ends are in `ids` by construction
            if let (Ok(i), Ok(j)) = (ids.binary_search(&edge.from), ids.binary_search(&edge.to)) {
                adjacency.set(i, j);
                *counts.entry((i, j)).or_insert(0) += 1;
            }
        }
        debug!(
            "connectivity: {} edges over {} features ({} distinct connections)",
            edges.len(),
            ids.len(),
            counts.len()
        );
        ConnectivityMatrix {
            ids,
            adjacency,
            counts,
        }
    }

    /// Row/column labels, ascending.
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

    /// Whether a direct edge runs `from -> to`. `None` if either id is not
    /// part of the matrix.
    pub fn get(&self, from: &Id, to: &Id) -> Option<bool> {
        let i = self.index_of(from)?;
        let j = self.index_of(to)?;
        Some(self.adjacency.get(i, j))
    }

    /// Number of input edges `from -> to`, as a plain cross-tabulation
    /// would report it.
    pub fn edge_count(&self, from: &Id, to: &Id) -> Option<u32> {
        let i = self.index_of(from)?;
        let j = self.index_of(to)?;
        Some(self.counts.get(&(i, j)).copied().unwrap_or(0))
    }

    /// Direct downstream neighbours of the feature at index `i`.
    pub fn successors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency.ones_in_row(i)
    }

    pub(crate) fn adjacency(&self) -> &BitMatrix {
        &self.adjacency
    }
}

/// Keep only edges whose upstream end is one of `catchment_ids`.
pub fn subset_edges<Id: NodeId>(edges: &[FlowEdge<Id>], catchment_ids: &[Id]) -> Vec<FlowEdge<Id>> {
    let keep: BTreeSet<&Id> = catchment_ids.iter().collect();
    edges
        .iter()
        .filter(|edge| keep.contains(&edge.from))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_is_square_over_endpoints() {
        let m = ConnectivityMatrix::from_edges(vec![("B", "C"), ("A", "B"), ("D", "B")]);
        assert_eq!(m.ids(), &["A", "B", "C", "D"]);
        // C only receives and D only sends, both still have rows/columns
        assert_eq!(m.get(&"C", &"A"), Some(false));
        assert_eq!(m.get(&"D", &"B"), Some(true));
        assert_eq!(m.get(&"B", &"D"), Some(false));
        assert_eq!(m.get(&"E", &"A"), None);
    }

    #[test]
    fn test_integer_ids_sort_numerically() {
        let m = ConnectivityMatrix::from_edges(vec![(100u64, 20u64), (3, 100)]);
        assert_eq!(m.ids(), &[3, 20, 100]);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let m = ConnectivityMatrix::from_edges(vec![("A", "B"), ("A", "B")]);
        assert_eq!(m.get(&"A", &"B"), Some(true));
        assert_eq!(m.edge_count(&"A", &"B"), Some(2));
        assert_eq!(m.edge_count(&"B", &"A"), Some(0));
        assert_eq!(m.successors(0).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_empty_edge_list() {
        let m: ConnectivityMatrix<String> =
            ConnectivityMatrix::from_edges(Vec::<(String, String)>::new());
        assert!(m.is_empty());
    }

    #[test]
    fn test_subset_edges() {
        let edges: Vec<FlowEdge<u32>> = vec![(1, 2).into(), (2, 3).into(), (4, 3).into()];
        let subset = subset_edges(&edges, &[1, 4]);
        assert_eq!(subset, vec![FlowEdge::new(1, 2), FlowEdge::new(4, 3)]);
    }
}
