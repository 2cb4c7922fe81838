//! Operation graph runtime representation.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::error::{OpsError, OpsResult};
use crate::node::{InputContext, Injector, OpId, Operation};

/// Edge data stored on dependency edges.
///
/// Dependency edges carry no payload of their own; data flow between
/// operations travels through [`Injector`]s attached to the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepEdge;

/// A single-use graph of operations connected by must-finish-before edges.
///
/// Internally uses petgraph's `DiGraph` for efficient graph operations.
/// The builder configures operations and edges; once handed to an
/// [`OperationQueue`](crate::engine::OperationQueue) the queue owns the
/// graph exclusively for the duration of the transition.
pub struct OperationGraph<V, E> {
    /// The underlying directed graph.
    graph: DiGraph<Operation<V, E>, DepEdge>,
    /// Mapping from OpId to petgraph's NodeIndex.
    node_indices: HashMap<OpId, NodeIndex>,
    /// Reverse mapping from NodeIndex to OpId.
    index_to_id: HashMap<NodeIndex, OpId>,
}

impl<V, E> OperationGraph<V, E> {
    /// Creates a new empty operation graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            index_to_id: HashMap::new(),
        }
    }

    /// Returns the number of operations in the graph.
    pub fn operation_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of dependency edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Adds an operation to the graph and returns its ID.
    pub fn insert(&mut self, operation: Operation<V, E>) -> OpId {
        let id = OpId::new();
        let index = self.graph.add_node(operation);
        self.node_indices.insert(id, index);
        self.index_to_id.insert(index, id);
        id
    }

    /// Returns a reference to an operation.
    pub fn get(&self, id: OpId) -> Option<&Operation<V, E>> {
        let index = self.node_indices.get(&id)?;
        self.graph.node_weight(*index)
    }

    /// Returns whether an operation exists.
    pub fn contains(&self, id: OpId) -> bool {
        self.node_indices.contains_key(&id)
    }

    /// Adds a must-finish-before edge: `to` may not start until `from`
    /// reached a terminal state.
    pub fn connect(&mut self, from: OpId, to: OpId) -> OpsResult<()> {
        let from_index = *self
            .node_indices
            .get(&from)
            .ok_or(OpsError::UnknownOperation(from))?;
        let to_index = *self
            .node_indices
            .get(&to)
            .ok_or(OpsError::UnknownOperation(to))?;

        self.graph.add_edge(from_index, to_index, DepEdge);
        Ok(())
    }

    /// Wires a data-flow edge: after `source` finishes successfully, the
    /// transform copies its output into `target`'s input context, right
    /// before `target` starts. Also adds the implied dependency edge.
    pub fn inject<F>(&mut self, source: OpId, target: OpId, transform: F) -> OpsResult<()>
    where
        F: FnOnce(&V, &mut InputContext<V>) -> OpsResult<()> + Send + 'static,
    {
        self.connect(source, target)?;

        let target_index = *self
            .node_indices
            .get(&target)
            .ok_or(OpsError::UnknownOperation(target))?;
        let operation = self
            .graph
            .node_weight_mut(target_index)
            .ok_or(OpsError::UnknownOperation(target))?;
        operation.push_injector(Injector::new(source, transform));
        Ok(())
    }

    /// Returns the IDs of an operation's dependencies.
    pub fn dependencies_of(&self, id: OpId) -> Vec<OpId> {
        let Some(index) = self.node_indices.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(*index, Direction::Incoming)
            .filter_map(|edge_ref| self.index_to_id.get(&edge_ref.source()).copied())
            .collect()
    }

    /// Validates the graph structure.
    ///
    /// Checks that:
    /// - The graph has at least one operation
    /// - The graph is acyclic (a cyclic graph is rejected here, at build
    ///   time, rather than deadlocking the queue at run time)
    /// - At most one operation is marked terminal
    pub fn validate(&self) -> OpsResult<()> {
        if self.graph.node_count() == 0 {
            return Err(OpsError::InvalidGraph(
                "graph must have at least one operation".into(),
            ));
        }

        if is_cyclic_directed(&self.graph) {
            return Err(OpsError::InvalidGraph(
                "cycle detected in operation graph".into(),
            ));
        }

        let terminal_count = self
            .graph
            .node_weights()
            .filter(|op| op.is_terminal())
            .count();
        if terminal_count > 1 {
            return Err(OpsError::InvalidGraph(format!(
                "{terminal_count} operations marked terminal, expected at most one"
            )));
        }

        Ok(())
    }

    /// Returns operation IDs in dependency order: every operation sorts
    /// after all of its dependencies, ties broken by declaration order.
    pub fn dependency_order(&self) -> OpsResult<Vec<OpId>> {
        // Kahn's algorithm, always emitting the lowest-index ready node.
        // Indices follow insertion order, which gives the stable
        // declaration-order tie-break the aggregator relies on.
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|index| {
                let degree = self
                    .graph
                    .edges_directed(index, Direction::Incoming)
                    .count();
                (index, degree)
            })
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while order.len() < self.graph.node_count() {
            let Some(next) = self
                .graph
                .node_indices()
                .find(|index| in_degree.get(index).copied() == Some(0))
            else {
                return Err(OpsError::InvalidGraph(
                    "cycle detected in operation graph".into(),
                ));
            };

            in_degree.remove(&next);
            for edge_ref in self.graph.edges_directed(next, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&edge_ref.target()) {
                    *degree = degree.saturating_sub(1);
                }
            }

            if let Some(id) = self.index_to_id.get(&next) {
                order.push(*id);
            }
        }

        Ok(order)
    }

    pub(crate) fn into_operations(self) -> HashMap<OpId, Operation<V, E>> {
        let index_to_id = self.index_to_id;
        let (nodes, _edges) = self.graph.into_nodes_edges();
        nodes
            .into_iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let id = index_to_id.get(&NodeIndex::new(index))?;
                Some((*id, node.weight))
            })
            .collect()
    }
}

impl<V, E> Default for OperationGraph<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> std::fmt::Debug for OperationGraph<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationGraph")
            .field("operations", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}
