use crate::graph::{EdgeId, EdgeKind, NodeId, SbpGraph};
use log::{debug, warn};
use std::collections::BTreeMap;

/// The result of an optimization: one candidate index for every node added by the user and
/// the cost of this assignment on the original problem.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SbpSolution {
    choices: BTreeMap<NodeId, usize>,
    total_cost: f64,
}

impl SbpSolution {
    pub fn choices(&self) -> &BTreeMap<NodeId, usize> {
        &self.choices
    }

    /// The chosen candidate of a node, `None` if the node is not part of the solution.
    pub fn choice(&self, node: NodeId) -> Option<usize> {
        self.choices.get(&node).copied()
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// True if the assignment avoids all forbidden combinations.
    pub fn is_feasible(&self) -> bool {
        !crate::is_forbidden(self.total_cost)
    }
}

impl SbpGraph {
    /// Propagate the choices of the live nodes to every node that was eliminated or merged.
    ///
    /// Live nodes without a choice take their cheapest candidate first. Afterwards:
    ///
    /// - A merged node splits its choice into the choices of its halves.
    /// - A child takes the candidate recorded for the choice of its parent.
    /// - A bridged edge resolves its middle node once both of its endpoints are resolved.
    ///
    /// Absorbed edges are processed as soon as their owner is resolved, until nothing changes.
    pub fn finalize(&mut self) {
        let mut resolved = vec![false; self.nodes.len()];
        let mut node_queue: Vec<NodeId> = Vec::new();
        let mut edge_queue: Vec<EdgeId> = self.live_edges().collect();
        for node in &self.live {
            let data = &mut self.nodes[node.index()];
            if data.final_choice.is_none() {
                data.final_choice = Some(data.cheapest_candidate());
            }
            node_queue.push(*node);
        }

        loop {
            while let Some(node) = node_queue.pop() {
                if resolved[node.index()] {
                    continue;
                }
                resolved[node.index()] = true;
                self.resolve_absorbed(node, &mut node_queue, &mut edge_queue);
            }

            let pending = std::mem::take(&mut edge_queue);
            let mut progress = false;
            for edge in pending {
                let data = &self.edges[edge.index()];
                if !resolved[data.start.index()] || !resolved[data.end.index()] {
                    edge_queue.push(edge);
                    continue;
                }
                progress = true;
                if let EdgeKind::MidBridged {
                    mid, mid_choice, ..
                } = &data.kind
                {
                    let start_choice = self.nodes[data.start.index()].current_choice();
                    let end_choice = self.nodes[data.end.index()].current_choice();
                    let mid = *mid;
                    let choice = mid_choice.get(start_choice, end_choice);
                    self.nodes[mid.index()].final_choice = Some(choice);
                    node_queue.push(mid);
                }
                edge_queue.extend_from_slice(self.edges[edge.index()].sub_edges());
            }

            if !progress && node_queue.is_empty() {
                break;
            }
        }

        if !edge_queue.is_empty() {
            warn!("{} absorbed edges could not be resolved.", edge_queue.len());
        }
        debug_assert!(self.original_nodes().all(|it| resolved[it.index()]));
        debug!("Finalized choices of {} nodes.", resolved.iter().filter(|it| **it).count());
    }

    /// Resolve the merged halves and the children of a node with a known choice.
    fn resolve_absorbed(
        &mut self,
        node: NodeId,
        node_queue: &mut Vec<NodeId>,
        edge_queue: &mut Vec<EdgeId>,
    ) {
        let choice = self.nodes[node.index()].current_choice();
        if let Some(merged) = self.nodes[node.index()].merged.clone() {
            let (first, second) = merged.pairs[choice];
            self.nodes[merged.first.index()].final_choice = Some(first);
            self.nodes[merged.second.index()].final_choice = Some(second);
            node_queue.push(merged.first);
            node_queue.push(merged.second);
            edge_queue.extend(merged.common_edge);
        }
        let children = std::mem::take(&mut self.nodes[node.index()].children);
        for child in &children {
            self.nodes[child.node.index()].final_choice = Some(child.choice[choice]);
            node_queue.push(child.node);
            edge_queue.push(child.edge);
        }
        self.nodes[node.index()].children = children;
    }

    /// Collect the choices of all nodes added by the user together with the cost of the
    /// original problem under these choices.
    ///
    /// Call [`SbpGraph::finalize`] first, otherwise eliminated nodes report candidate `0`.
    pub fn solution(&self) -> SbpSolution {
        let choices = self
            .original_nodes()
            .map(|it| (it, self.nodes[it.index()].current_choice()))
            .collect();
        SbpSolution {
            choices,
            total_cost: self.original_cost(),
        }
    }
}
