//! A plain description of an SBP problem which can be stored as JSON (with the `serde`
//! feature) and turned into an [`SbpGraph`].
//!
//! ```json
//! {
//!   "nodes": [
//!     { "name": "matmul", "cost": [1.0, 4.0] },
//!     { "cost": [2.0, 2.0] }
//!   ],
//!   "edges": [
//!     { "start": 0, "end": 1, "cost": [[0.0, 5.0], [5.0, 0.0]] }
//!   ]
//! }
//! ```

use crate::cost_table::CostTable;
use crate::error::{SbpError, SbpResult};
use crate::graph::{NodeId, SbpGraph};

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SbpProblem {
    pub nodes: Vec<ProblemNode>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub edges: Vec<ProblemEdge>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemNode {
    /// Optional human-readable label.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub name: Option<String>,
    pub cost: Vec<f64>,
}

/// An edge between two nodes given by their position in [`SbpProblem::nodes`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemEdge {
    pub start: usize,
    pub end: usize,
    pub cost: Vec<Vec<f64>>,
}

impl SbpProblem {
    pub fn new() -> SbpProblem {
        SbpProblem::default()
    }

    /// Add an unnamed node and return its position.
    pub fn add_node(&mut self, cost: Vec<f64>) -> usize {
        self.nodes.push(ProblemNode { name: None, cost });
        self.nodes.len() - 1
    }

    pub fn add_edge(&mut self, start: usize, end: usize, cost: Vec<Vec<f64>>) {
        self.edges.push(ProblemEdge { start, end, cost });
    }

    /// Label of a node, falling back to its position.
    pub fn node_name(&self, index: usize) -> String {
        self.nodes
            .get(index)
            .and_then(|it| it.name.clone())
            .unwrap_or_else(|| format!("#{index}"))
    }

    /// Create a fresh graph with the same nodes and edges. The `i`-th node of the problem
    /// becomes the node with [`NodeId::index`] equal to `i`.
    pub fn build(&self) -> SbpResult<SbpGraph> {
        let mut graph = SbpGraph::new();
        for node in &self.nodes {
            graph.add_node(node.cost.clone())?;
        }
        for edge in &self.edges {
            for index in [edge.start, edge.end] {
                if index >= self.nodes.len() {
                    return Err(SbpError::UnknownNode(NodeId::new(index)));
                }
            }
            let cost = CostTable::from_rows(edge.cost.clone())?;
            graph.add_edge(NodeId::new(edge.start), NodeId::new(edge.end), cost)?;
        }
        Ok(graph)
    }

    /// Total cost of the given assignment (one candidate index per node).
    ///
    /// # Panics
    ///
    /// Panics if the assignment does not fit the problem.
    pub fn evaluate(&self, choices: &[usize]) -> f64 {
        assert_eq!(choices.len(), self.nodes.len(), "One choice per node expected.");
        let mut total = 0.0;
        for (node, choice) in self.nodes.iter().zip(choices) {
            total += node.cost[*choice];
        }
        for edge in &self.edges {
            total += edge.cost[choices[edge.start]][choices[edge.end]];
        }
        total
    }
}
