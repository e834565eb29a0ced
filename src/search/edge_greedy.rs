use crate::graph::{EdgeId, NodeId, SbpGraph};
use cancel_this::{Cancellable, is_cancelled};
use log::trace;

impl SbpGraph {
    /// Re-optimize both endpoints of a live edge while all other nodes keep their choice.
    ///
    /// All edges between the two endpoints are taken into account, not just `edge`. Only a
    /// strictly cheaper pair is committed. Returns the (non-positive) change of the total cost.
    pub fn edge_greedy_step(&mut self, edge: EdgeId) -> f64 {
        let start = self.edges[edge.index()].start;
        let end = self.edges[edge.index()].end;
        let pair = [start, end];

        let outside_start: Vec<f64> = (0..self.candidate_count(start))
            .map(|i| self.outside_cost(start, i, &pair))
            .collect();
        let outside_end: Vec<f64> = (0..self.candidate_count(end))
            .map(|j| self.outside_cost(end, j, &pair))
            .collect();
        let between: Vec<EdgeId> = self
            .incident_edges(start)
            .into_iter()
            .filter(|it| self.edges[it.index()].other_end(start) == end)
            .collect();
        let pair_cost = |i: usize, j: usize| -> f64 {
            let mut total = outside_start[i] + outside_end[j];
            for edge in &between {
                total += self.edges[edge.index()].cost_from(start, i, j);
            }
            total
        };

        let current = (
            self.nodes[start.index()].current_choice(),
            self.nodes[end.index()].current_choice(),
        );
        let original = pair_cost(current.0, current.1);
        let mut best = original;
        let mut best_pair = current;
        for i in 0..outside_start.len() {
            for j in 0..outside_end.len() {
                let cost = pair_cost(i, j);
                if cost < best {
                    best = cost;
                    best_pair = (i, j);
                }
            }
        }

        if best < original {
            self.nodes[start.index()].final_choice = Some(best_pair.0);
            self.nodes[end.index()].final_choice = Some(best_pair.1);
            trace!("Edge {edge} moved to {best_pair:?} (change {}).", best - original);
            best - original
        } else {
            0.0
        }
    }

    /// Re-optimize a single node while all other nodes keep their choice.
    pub fn node_greedy_step(&mut self, node: NodeId) -> f64 {
        self.neighborhood_greedy_step(&[node])
    }

    /// One sweep of [`SbpGraph::edge_greedy_step`] over all live edges. Nodes without edges
    /// are optimized individually.
    pub fn edge_sweep(&mut self) -> Cancellable<f64> {
        let mut total = 0.0;
        for node in self.live.clone() {
            is_cancelled!()?;
            let edges = self.nodes[node.index()].edges_out.clone();
            if self.nodes[node.index()].degree() == 0 {
                total += self.node_greedy_step(node);
            }
            for edge in edges {
                total += self.edge_greedy_step(edge);
            }
        }
        Ok(total)
    }
}
