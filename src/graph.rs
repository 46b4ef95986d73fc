//! Dependency graph module.
//!
//! Provides the `FieldGraph` type, a petgraph view of a model's push edges
//! used to validate wiring. The model itself propagates through its own
//! `dependents` lists; this view exists to detect cycles, order fields from
//! inputs to totals, and cut out the inputs of a given field.

use crate::error::FieldError;
use crate::field::NodeId;
use crate::field_id::FieldId;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// A directed graph of field dependencies.
///
/// Nodes are field handles labelled with their names. An edge runs from a
/// source to the field that depends on it, the direction changes are
/// pushed in.
///
/// # Examples
///
/// ```rust
/// use sfxcost::CostModel;
///
/// let mut model = CostModel::standard();
/// let effect = model.field("Effect");
/// let mandatory = model.field("Mandatory");
///
/// let graph = model.dependency_graph();
/// let order = graph.topological_sort().unwrap();
/// let effect_pos = order.iter().position(|id| *id == effect).unwrap();
/// let mandatory_pos = order.iter().position(|id| *id == mandatory).unwrap();
/// assert!(effect_pos < mandatory_pos);
/// ```
pub struct FieldGraph {
    graph: DiGraph<NodeId, ()>,
    node_map: HashMap<NodeId, NodeIndex>,
    names: HashMap<NodeId, FieldId>,
}

impl FieldGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Add a node if it is not present yet, labelled `name`.
    ///
    /// # Returns
    ///
    /// The graph index of the node.
    pub fn add_node(&mut self, id: NodeId, name: FieldId) -> NodeIndex {
        self.names.entry(id).or_insert(name);
        self.index_of(id)
    }

    fn index_of(&mut self, id: NodeId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&id) {
            idx
        } else {
            let idx = self.graph.add_node(id);
            self.node_map.insert(id, idx);
            idx
        }
    }

    /// Record that `from` depends on `to`.
    ///
    /// Nodes are added unlabelled if they are not present yet.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let from_idx = self.index_of(from);
        let to_idx = self.index_of(to);
        self.graph.add_edge(to_idx, from_idx, ());
    }

    /// Name recorded for a node, or its handle when it was never labelled.
    pub fn name(&self, id: NodeId) -> FieldId {
        match self.names.get(&id) {
            Some(name) => name.clone(),
            None => FieldId::from(id.to_string()),
        }
    }

    /// Detect cycles in the graph.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if no cycles are detected
    /// * `Err(FieldError::Cycle)` with the closed cycle path otherwise
    pub fn detect_cycles(&self) -> Result<(), FieldError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for node_idx in self.graph.node_indices() {
            if !visited.contains(&node_idx) {
                let mut path = Vec::new();
                if let Some(cycle) =
                    self.dfs_cycle_detect(node_idx, &mut visited, &mut rec_stack, &mut path)
                {
                    return Err(cycle);
                }
            }
        }

        Ok(())
    }

    fn dfs_cycle_detect(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        rec_stack: &mut HashSet<NodeIndex>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<FieldError> {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        for neighbor in self
            .graph
            .neighbors_directed(node, petgraph::Direction::Outgoing)
        {
            if !visited.contains(&neighbor) {
                if let Some(cycle) = self.dfs_cycle_detect(neighbor, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(&neighbor) {
                let start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                let mut cycle: Vec<FieldId> = path[start..]
                    .iter()
                    .map(|idx| self.name(self.graph[*idx]))
                    .collect();
                cycle.push(self.name(self.graph[neighbor]));
                return Some(FieldError::Cycle { path: cycle });
            }
        }

        rec_stack.remove(&node);
        path.pop();
        None
    }

    /// Order every node so sources come before their dependents.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<NodeId>)` - inputs first, totals last
    /// * `Err(FieldError::Cycle)` - if a cycle is detected
    pub fn topological_sort(&self) -> Result<Vec<NodeId>, FieldError> {
        self.detect_cycles()?;

        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices.into_iter().map(|idx| self.graph[idx]).collect()),
            Err(cycle) => Err(FieldError::Cycle {
                path: vec![self.name(self.graph[cycle.node_id()])],
            }),
        }
    }

    /// All nodes in the graph.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx])
            .collect()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_map.contains_key(&id)
    }

    /// The targets plus everything they transitively pull from.
    pub fn upstream_of(&self, targets: &[NodeId]) -> FieldGraph {
        let mut subgraph = FieldGraph::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<NodeId> = targets.to_vec();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }

            if let Some(&node_idx) = self.node_map.get(&id) {
                subgraph.add_node(id, self.name(id));

                for neighbor_idx in self
                    .graph
                    .neighbors_directed(node_idx, petgraph::Direction::Incoming)
                {
                    let source = self.graph[neighbor_idx];
                    if !visited.contains(&source) {
                        stack.push(source);
                    }
                    subgraph.add_node(source, self.name(source));
                    subgraph.add_edge(id, source);
                }
            }
        }

        subgraph
    }
}

impl Default for FieldGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> NodeId {
        NodeId {
            index,
            generation: 0,
        }
    }

    fn labelled(names: &[&str]) -> FieldGraph {
        let mut graph = FieldGraph::new();
        for (i, name) in names.iter().enumerate() {
            graph.add_node(id(i as u32), FieldId::from_str(name));
        }
        graph
    }

    #[test]
    fn test_graph_no_cycle() {
        let mut graph = labelled(&["Effect", "SubMandatory", "Mandatory"]);
        graph.add_edge(id(1), id(0));
        graph.add_edge(id(2), id(1));
        assert!(graph.detect_cycles().is_ok());
    }

    #[test]
    fn test_cycle_path_is_closed_and_named() {
        let mut graph = labelled(&["A", "B", "C"]);
        graph.add_edge(id(1), id(0));
        graph.add_edge(id(2), id(1));
        graph.add_edge(id(0), id(2));

        match graph.detect_cycles() {
            Err(FieldError::Cycle { path }) => {
                assert_eq!(path.len(), 4);
                assert_eq!(path[0], path[3]);
                assert!(path.contains(&FieldId::from_str("B")));
            }
            other => panic!("Expected Cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_self_cycle() {
        let mut graph = labelled(&["A"]);
        graph.add_edge(id(0), id(0));
        assert!(graph.detect_cycles().is_err());
        assert!(graph.topological_sort().is_err());
    }

    #[test]
    fn test_topological_sort() {
        let mut graph = labelled(&["Effect", "Duration", "Sub", "Mandatory"]);
        graph.add_edge(id(2), id(0));
        graph.add_edge(id(2), id(1));
        graph.add_edge(id(3), id(2));

        let sorted = graph.topological_sort().unwrap();
        let pos = |n: u32| sorted.iter().position(|s| *s == id(n)).unwrap();
        assert!(pos(0) < pos(2));
        assert!(pos(1) < pos(2));
        assert!(pos(2) < pos(3));
    }

    #[test]
    fn test_upstream_of() {
        let mut graph = labelled(&["Effect", "Sub", "Charges", "Optional"]);
        graph.add_edge(id(1), id(0));
        graph.add_edge(id(3), id(2));

        let upstream = graph.upstream_of(&[id(1)]);
        assert!(upstream.contains_node(id(1)));
        assert!(upstream.contains_node(id(0)));
        assert!(!upstream.contains_node(id(2)));
        assert!(!upstream.contains_node(id(3)));
        assert_eq!(upstream.name(id(0)), FieldId::from_str("Effect"));
    }

    #[test]
    fn test_unlabelled_nodes_use_handle() {
        let mut graph = FieldGraph::new();
        graph.add_edge(id(1), id(0));
        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.name(id(0)).as_str(), "#0@0");
    }
}
