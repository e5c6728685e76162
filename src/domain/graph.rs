//! Cross-reference graph between finalised requirements.
//!
//! Edges point from a requirement to the requirements it relates to, i.e.
//! from the dependent to the requirements generated from its dependencies.

use petgraph::{
    Direction,
    algo::{is_cyclic_directed, tarjan_scc},
    graphmap::DiGraphMap,
};

use crate::domain::RequirementId;

/// A directed graph of requirement cross-references.
#[derive(Debug, Default, Clone)]
pub struct RequirementGraph {
    graph: DiGraphMap<RequirementId, ()>,
}

impl RequirementGraph {
    /// Creates a graph with pre-allocated capacity for the given number of
    /// requirements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            graph: DiGraphMap::with_capacity(capacity, capacity * 2),
        }
    }

    /// Adds a requirement. Adding an existing requirement is a no-op.
    pub fn add(&mut self, id: RequirementId) {
        self.graph.add_node(id);
    }

    /// Records that `from` relates to `to`.
    ///
    /// Returns `true` if the edge is new.
    pub fn link(&mut self, from: RequirementId, to: RequirementId) -> bool {
        self.graph.add_edge(from, to, ()).is_none()
    }

    /// Requirements that `id` relates to.
    pub fn related(&self, id: RequirementId) -> impl Iterator<Item = RequirementId> + '_ {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Requirements that relate to `id`.
    pub fn referenced_by(&self, id: RequirementId) -> impl Iterator<Item = RequirementId> + '_ {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(
        &self,
        id: RequirementId,
        direction: Direction,
    ) -> impl Iterator<Item = RequirementId> + '_ {
        if self.graph.contains_node(id) {
            Some(self.graph.neighbors_directed(id, direction))
        } else {
            None
        }
        .into_iter()
        .flatten()
    }

    /// Determine whether the graph contains any cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Return all cycles in the graph, each sorted, the list sorted.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<RequirementId>> {
        let mut cycles: Vec<Vec<RequirementId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [node] => self.graph.contains_edge(*node, *node),
                nodes => nodes.len() > 1,
            })
            .map(|mut component| {
                component.sort();
                component
            })
            .collect();

        cycles.sort();
        cycles
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::domain::Category;

    fn dm(sequence: usize) -> RequirementId {
        RequirementId::new(
            Category::DataManagement,
            NonZeroUsize::new(sequence).unwrap(),
        )
    }

    #[test]
    fn related_and_referenced_by_are_inverse() {
        let mut graph = RequirementGraph::default();
        graph.add(dm(1));
        graph.add(dm(2));
        assert!(graph.link(dm(2), dm(1)));
        assert!(!graph.link(dm(2), dm(1)));

        assert_eq!(graph.related(dm(2)).collect::<Vec<_>>(), vec![dm(1)]);
        assert_eq!(graph.referenced_by(dm(1)).collect::<Vec<_>>(), vec![dm(2)]);
        assert_eq!(graph.related(dm(1)).count(), 0);
    }

    #[test]
    fn unknown_node_has_no_neighbours() {
        let graph = RequirementGraph::default();
        assert_eq!(graph.related(dm(9)).count(), 0);
    }

    #[test]
    fn acyclic_graph_reports_no_cycles() {
        let mut graph = RequirementGraph::with_capacity(3);
        graph.link(dm(3), dm(2));
        graph.link(dm(2), dm(1));
        assert!(!graph.has_cycles());
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn cycles_are_reported_sorted() {
        let mut graph = RequirementGraph::default();
        graph.link(dm(3), dm(1));
        graph.link(dm(1), dm(2));
        graph.link(dm(2), dm(3));
        graph.link(dm(4), dm(4));

        assert!(graph.has_cycles());
        assert_eq!(
            graph.cycles(),
            vec![vec![dm(1), dm(2), dm(3)], vec![dm(4)]]
        );
    }
}
