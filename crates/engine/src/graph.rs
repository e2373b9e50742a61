//! Resource-allocation graph and cycle detection

use bankr_errors::AnalysisError;
use bankr_types::SystemState;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::safety::need_matrix;

/// Which side of the bipartite graph a node belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Process,
    Resource,
}

/// Graph node.
///
/// Processes occupy ids `0..P` and resources `P..P+R`; `index` is the
/// position within its own kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: usize,
    pub kind: NodeKind,
    pub index: usize,
}

impl Node {
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Process => write!(f, "P{}", self.index),
            NodeKind::Resource => write!(f, "R{}", self.index),
        }
    }
}

/// Edge kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Process -> resource: the process still needs units of it
    Request,
    /// Resource -> process: the process holds units of it
    Assignment,
}

/// Directed edge between two node ids
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// Resource-allocation graph derived from one snapshot.
///
/// Holds no state of its own; rebuild it whenever the snapshot changes.
#[derive(Clone, Debug)]
pub struct AllocationGraph {
    num_processes: usize,
    num_resources: usize,
    /// Edges in construction order
    edges: Vec<Edge>,
    /// Successor lists, ascending
    adjacency: Vec<Vec<usize>>,
}

impl AllocationGraph {
    /// Build the graph for `state`.
    ///
    /// For each process and resource an assignment edge is added when the
    /// process holds units, then a request edge when it still needs some.
    /// A process that holds part of a resource and wants more gets both.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::NeedUnderflow`] if `state` has a negative need.
    pub fn build(state: &SystemState) -> Result<Self, AnalysisError> {
        let need = need_matrix(state)?;
        let num_processes = state.num_processes();
        let num_resources = state.num_resources();

        let mut graph = Self {
            num_processes,
            num_resources,
            edges: Vec::new(),
            adjacency: vec![Vec::new(); num_processes + num_resources],
        };

        for p in 0..num_processes {
            for r in 0..num_resources {
                let resource_node = num_processes + r;
                if state.allocation[p][r] > 0 {
                    graph.add_edge(resource_node, p, EdgeKind::Assignment);
                }
                if need[p][r] > 0 {
                    graph.add_edge(p, resource_node, EdgeKind::Request);
                }
            }
        }
        for successors in &mut graph.adjacency {
            successors.sort_unstable();
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edges.len(),
            "built resource allocation graph"
        );
        Ok(graph)
    }

    fn add_edge(&mut self, from: usize, to: usize, kind: EdgeKind) {
        self.edges.push(Edge { from, to, kind });
        self.adjacency[from].push(to);
    }

    #[must_use]
    pub fn num_processes(&self) -> usize {
        self.num_processes
    }

    #[must_use]
    pub fn num_resources(&self) -> usize {
        self.num_resources
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.num_processes + self.num_resources
    }

    /// Node for `id`, or `None` if out of range
    #[must_use]
    pub fn node(&self, id: usize) -> Option<Node> {
        if id < self.num_processes {
            Some(Node {
                id,
                kind: NodeKind::Process,
                index: id,
            })
        } else if id < self.node_count() {
            Some(Node {
                id,
                kind: NodeKind::Resource,
                index: id - self.num_processes,
            })
        } else {
            None
        }
    }

    /// All nodes, processes first
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        (0..self.node_count()).filter_map(|id| self.node(id))
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn resource_node(&self, resource: usize) -> usize {
        self.num_processes + resource
    }

    #[must_use]
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.adjacency
            .get(from)
            .is_some_and(|successors| successors.binary_search(&to).is_ok())
    }

    /// Number of edges of `kind`
    #[must_use]
    pub fn count(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|edge| edge.kind == kind).count()
    }

    /// Check for cycles using DFS.
    ///
    /// Roots are tried in ascending id order (processes, then resources) and
    /// successors in ascending id order. Reaching a node that is still on
    /// the current path is a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        let mut visited = vec![false; self.node_count()];
        let mut on_path = vec![false; self.node_count()];

        for node in 0..self.node_count() {
            if !visited[node] && self.has_cycle_util(node, &mut visited, &mut on_path) {
                debug!(root = node, "cycle found in allocation graph");
                return true;
            }
        }

        false
    }

    /// Utility function for cycle detection
    fn has_cycle_util(&self, node: usize, visited: &mut [bool], on_path: &mut [bool]) -> bool {
        visited[node] = true;
        on_path[node] = true;

        for &next in &self.adjacency[node] {
            if !visited[next] {
                if self.has_cycle_util(next, visited, on_path) {
                    return true;
                }
            } else if on_path[next] {
                return true;
            }
        }

        on_path[node] = false;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::Scenario;

    #[test]
    fn test_node_layout() {
        let graph = AllocationGraph::build(&Scenario::Safe.state()).unwrap();
        assert_eq!(graph.node_count(), 8);
        assert_eq!(graph.node(4).unwrap().kind, NodeKind::Process);
        let r0 = graph.node(5).unwrap();
        assert_eq!(r0.kind, NodeKind::Resource);
        assert_eq!(r0.label(), "R0");
        assert!(graph.node(8).is_none());
    }

    #[test]
    fn test_edges_in_construction_order() {
        let state = SystemState::new(vec![0], vec![vec![1]], vec![vec![2]]).unwrap();
        let graph = AllocationGraph::build(&state).unwrap();
        assert_eq!(
            graph.edges(),
            &[
                Edge {
                    from: 1,
                    to: 0,
                    kind: EdgeKind::Assignment
                },
                Edge {
                    from: 0,
                    to: 1,
                    kind: EdgeKind::Request
                },
            ]
        );
        // Holding and waiting on the same resource closes a cycle.
        assert!(graph.has_cycle());
    }

    #[test]
    fn test_no_cycle_without_requests() {
        let state = SystemState::new(
            vec![0, 0],
            vec![vec![1, 0], vec![0, 1]],
            vec![vec![1, 0], vec![0, 1]],
        )
        .unwrap();
        let graph = AllocationGraph::build(&state).unwrap();
        assert_eq!(graph.count(EdgeKind::Request), 0);
        assert_eq!(graph.count(EdgeKind::Assignment), 2);
        assert!(!graph.has_cycle());
    }

    #[test]
    fn test_two_process_cycle() {
        // P0 holds R0 and wants R1, P1 holds R1 and wants R0.
        let state = SystemState::new(
            vec![0, 0],
            vec![vec![1, 0], vec![0, 1]],
            vec![vec![1, 1], vec![1, 1]],
        )
        .unwrap();
        let graph = AllocationGraph::build(&state).unwrap();
        assert!(graph.has_edge(0, graph.resource_node(1)));
        assert!(graph.has_edge(graph.resource_node(1), 1));
        assert!(graph.has_cycle());
    }

    #[test]
    fn test_deadlock_scenario_has_cycle() {
        let graph = AllocationGraph::build(&Scenario::Deadlock.state()).unwrap();
        assert!(graph.has_cycle());
    }
}
