use crate::cost_table::{ChoiceTable, CostTable};
use crate::graph::{Child, EdgeId, EdgeKind, NodeId, SbpGraph};
use crate::reduction::EliminationStep;
use log::trace;
use std::collections::BTreeMap;

/// Sum all parallel edges between a node and each of its neighbors.
pub struct EdgeElimination;

/// Replace a degree-two node by a single edge between its neighbors.
pub struct NodeElimination;

/// Detach a degree-one node into its only neighbor.
pub struct ChildElimination;

/// The two shapes of a node with exactly two incident edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DegreeTwo {
    /// The edges lead to two distinct neighbors.
    Bridge { first: EdgeId, second: EdgeId },
    /// Both edges lead to the same neighbor.
    Loop { neighbor: NodeId },
}

impl EliminationStep for EdgeElimination {
    fn eliminate(graph: &mut SbpGraph, node: NodeId) -> usize {
        graph.edge_elimination(node)
    }
}

impl EliminationStep for NodeElimination {
    fn eliminate(graph: &mut SbpGraph, node: NodeId) -> usize {
        graph.node_elimination(node)
    }
}

impl EliminationStep for ChildElimination {
    fn eliminate(graph: &mut SbpGraph, node: NodeId) -> usize {
        graph.child_elimination(node)
    }
}

impl SbpGraph {
    /// Classify a node of total degree two, `None` for any other degree.
    pub fn degree_two_shape(&self, node: NodeId) -> Option<DegreeTwo> {
        let incident = self.incident_edges(node);
        let [first, second] = incident[..] else {
            return None;
        };
        let first_neighbor = self.edges[first.index()].other_end(node);
        let second_neighbor = self.edges[second.index()].other_end(node);
        if first_neighbor == second_neighbor {
            Some(DegreeTwo::Loop {
                neighbor: first_neighbor,
            })
        } else {
            Some(DegreeTwo::Bridge { first, second })
        }
    }

    /// Merge every group of parallel edges incident to `node` into one bundle oriented
    /// `node -> neighbor`. Returns the number of removed edges.
    pub fn edge_elimination(&mut self, node: NodeId) -> usize {
        let mut by_neighbor: BTreeMap<NodeId, Vec<EdgeId>> = BTreeMap::new();
        for edge in self.incident_edges(node) {
            let neighbor = self.edges[edge.index()].other_end(node);
            by_neighbor.entry(neighbor).or_default().push(edge);
        }

        let mut eliminated = 0;
        for (neighbor, parallel) in by_neighbor {
            if parallel.len() < 2 {
                continue;
            }

            let rows = self.candidate_count(node);
            let cols = self.candidate_count(neighbor);
            let mut cost = CostTable::filled(rows, cols, 0.0);
            for edge in &parallel {
                let edge = &self.edges[edge.index()];
                cost.accumulate(&edge.cost, edge.start != node);
            }
            for edge in &parallel {
                self.detach_edge(*edge);
            }

            eliminated += parallel.len() - 1;
            let count = parallel.len();
            let bundle =
                self.insert_edge(node, neighbor, cost, EdgeKind::ParallelBundle { edges: parallel });
            trace!("Bundled {count} edges between {node} and {neighbor} into {bundle}.");
        }

        self.eliminations += eliminated;
        eliminated
    }

    /// Eliminate a node of total degree two.
    ///
    /// With two distinct neighbors, the node and its edges are replaced by a bridged edge
    /// `start -> end` with `cost(i, j) = min_k(node.cost[k] + first(i, k) + second(k, j))`.
    /// If both edges lead to the same neighbor, they are bundled and the node is detached
    /// as a child instead. Returns the number of eliminated elements.
    pub fn node_elimination(&mut self, node: NodeId) -> usize {
        match self.degree_two_shape(node) {
            None => 0,
            Some(DegreeTwo::Loop { .. }) => {
                let bundled = self.edge_elimination(node);
                bundled + self.child_elimination(node)
            }
            Some(DegreeTwo::Bridge { first, second }) => {
                self.bridge_node(node, first, second);
                1
            }
        }
    }

    fn bridge_node(&mut self, node: NodeId, first: EdgeId, second: EdgeId) {
        let first_edge = &self.edges[first.index()];
        let second_edge = &self.edges[second.index()];
        let start = first_edge.other_end(node);
        let end = second_edge.other_end(node);
        let mid_cost = &self.nodes[node.index()].cost;

        let rows = self.candidate_count(start);
        let cols = self.candidate_count(end);
        let mut cost = CostTable::filled(rows, cols, 0.0);
        let mut mid_choice = ChoiceTable::filled(rows, cols, 0);
        for i in 0..rows {
            for j in 0..cols {
                let mut best = f64::INFINITY;
                let mut best_k = 0;
                for (k, own) in mid_cost.iter().enumerate() {
                    let total = own
                        + first_edge.cost_from(start, i, k)
                        + second_edge.cost_from(node, k, j);
                    if total < best {
                        best = total;
                        best_k = k;
                    }
                }
                cost.set(i, j, best);
                mid_choice.set(i, j, best_k);
            }
        }

        self.detach_edge(first);
        self.detach_edge(second);
        self.retire_node(node);
        let bridged = self.insert_edge(
            start,
            end,
            cost,
            EdgeKind::MidBridged {
                mid: node,
                bridge: [first, second],
                mid_choice,
            },
        );
        self.eliminations += 1;

        trace!("Bridged {node} by {bridged} ({start} -> {end}).");
    }

    /// Detach a node of total degree one into its neighbor (the parent).
    ///
    /// For every parent candidate `p`, the parent cost grows by
    /// `min_c(child.cost[c] + edge(p, c))` and the minimizing `c` is remembered. The child
    /// keeps the connecting edge, the parent forgets it. Returns the number of eliminated nodes.
    pub fn child_elimination(&mut self, node: NodeId) -> usize {
        let incident = self.incident_edges(node);
        let [edge] = incident[..] else {
            return 0;
        };

        let connection = &self.edges[edge.index()];
        let parent = connection.other_end(node);
        let child_cost = &self.nodes[node.index()].cost;
        let mut absorbed = Vec::with_capacity(self.candidate_count(parent));
        let mut choice = Vec::with_capacity(self.candidate_count(parent));
        for p in 0..self.candidate_count(parent) {
            let mut best = f64::INFINITY;
            let mut best_c = 0;
            for (c, own) in child_cost.iter().enumerate() {
                let total = own + connection.cost_from(parent, p, c);
                if total < best {
                    best = total;
                    best_c = c;
                }
            }
            absorbed.push(best);
            choice.push(best_c);
        }

        let parent_data = &mut self.nodes[parent.index()];
        for (cost, extra) in parent_data.cost.iter_mut().zip(absorbed) {
            *cost += extra;
        }
        parent_data.remove_edge(edge);
        parent_data.children.push(Child { node, edge, choice });
        self.retire_node(node);
        self.eliminations += 1;

        trace!("Detached {node} into {parent}.");
        1
    }
}
