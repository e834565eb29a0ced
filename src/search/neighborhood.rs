use crate::graph::{EdgeId, NodeId, SbpGraph};
use cancel_this::{Cancellable, is_cancelled};
use log::trace;

impl SbpGraph {
    /// The [`SbpGraph::neighborhood`] of a live node reordered so that the node itself comes
    /// first. Remaining nodes stay sorted.
    pub fn one_ring_neighborhood(&self, node: NodeId) -> Vec<NodeId> {
        let neighborhood = self.neighborhood(node);
        let mut result = Vec::with_capacity(neighborhood.len());
        result.push(node);
        result.extend(neighborhood.into_iter().filter(|it| *it != node));
        result
    }

    /// Exactly re-optimize all nodes of `window` while the rest of the graph keeps its choice.
    ///
    /// The search is a depth-first branch-and-bound with an explicit stack:
    ///
    /// - For every window node, the cost of each candidate towards the outside of the window
    ///   is computed once.
    /// - Nodes with a larger spread of outside costs are decided first. Within a node,
    ///   candidates are tried from the cheapest outside cost.
    /// - A partial assignment is abandoned once its cost plus a lower bound of all remaining
    ///   decisions reaches the best complete assignment found so far.
    ///
    /// The current assignment is the initial incumbent, so only a strictly better assignment
    /// is committed. Returns the (non-positive) change of the total cost. The window must
    /// consist of distinct live nodes.
    pub fn neighborhood_greedy_step(&mut self, window: &[NodeId]) -> f64 {
        let size = window.len();
        if size == 0 {
            return 0.0;
        }

        let outside: Vec<Vec<f64>> = window
            .iter()
            .map(|node| {
                (0..self.candidate_count(*node))
                    .map(|c| self.outside_cost(*node, c, window))
                    .collect()
            })
            .collect();

        let spread = |slot: usize| -> f64 {
            let values = &outside[slot];
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            max - min
        };
        let mut order: Vec<usize> = (0..size).collect();
        order.sort_by(|a, b| spread(*b).total_cmp(&spread(*a)));
        let mut depth_of = vec![0; size];
        for (depth, slot) in order.iter().enumerate() {
            depth_of[*slot] = depth;
        }
        let nodes: Vec<NodeId> = order.iter().map(|slot| window[*slot]).collect();

        // Candidates of every depth, sorted by outside cost.
        let candidates: Vec<Vec<usize>> = order
            .iter()
            .map(|slot| {
                let mut list: Vec<usize> = (0..outside[*slot].len()).collect();
                list.sort_by(|a, b| outside[*slot][*a].total_cmp(&outside[*slot][*b]));
                list
            })
            .collect();
        let outside_cost: Vec<&Vec<f64>> = order.iter().map(|slot| &outside[*slot]).collect();

        // Edges inside the window, each attached to the endpoint decided later.
        let mut inner: Vec<Vec<(usize, EdgeId)>> = vec![Vec::new(); size];
        for (depth, node) in nodes.iter().enumerate() {
            for edge in self.incident_edges(*node) {
                let other = self.edges[edge.index()].other_end(*node);
                if let Some(slot) = window.iter().position(|it| *it == other) {
                    let other_depth = depth_of[slot];
                    if other_depth < depth {
                        inner[depth].push((other_depth, edge));
                    }
                }
            }
        }

        // bound[d] is a lower bound on the cost of deciding depths d..size.
        let mut bound = vec![0.0; size + 1];
        for depth in (0..size).rev() {
            let min_outside = outside_cost[depth]
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);
            let min_inner: f64 = inner[depth]
                .iter()
                .map(|(_, edge)| self.edges[edge.index()].cost.min())
                .sum();
            bound[depth] = bound[depth + 1] + min_outside + min_inner;
        }

        let inner_cost = |depth: usize, candidate: usize, choice: &[usize]| -> f64 {
            let mut total = 0.0;
            for (other_depth, edge) in &inner[depth] {
                total += self.edges[edge.index()].cost_from(
                    nodes[depth],
                    candidate,
                    choice[*other_depth],
                );
            }
            total
        };

        let current: Vec<usize> = nodes
            .iter()
            .map(|it| self.nodes[it.index()].current_choice())
            .collect();
        let mut original = 0.0;
        for depth in 0..size {
            original = original
                + outside_cost[depth][current[depth]]
                + inner_cost(depth, current[depth], &current);
        }

        let mut best = original;
        let mut best_choice = current.clone();
        // `next[d]` is the position in `candidates[d]` to try next, `partial[d]` the cost of
        // depths 0..d under `choice`.
        let mut next = vec![0usize; size];
        let mut partial = vec![0.0; size + 1];
        let mut choice = vec![0usize; size];
        let mut depth = 0;
        loop {
            if next[depth] >= candidates[depth].len() {
                if depth == 0 {
                    break;
                }
                next[depth] = 0;
                depth -= 1;
                continue;
            }

            let candidate = candidates[depth][next[depth]];
            next[depth] += 1;
            choice[depth] = candidate;
            let cost = partial[depth]
                + outside_cost[depth][candidate]
                + inner_cost(depth, candidate, &choice);
            if cost + bound[depth + 1] >= best {
                continue;
            }
            if depth + 1 == size {
                best = cost;
                best_choice.copy_from_slice(&choice);
            } else {
                partial[depth + 1] = cost;
                depth += 1;
            }
        }

        if best < original {
            for (node, candidate) in nodes.iter().zip(best_choice.iter()) {
                self.nodes[node.index()].final_choice = Some(*candidate);
            }
            trace!("Window {window:?} improved by {}.", original - best);
            best - original
        } else {
            0.0
        }
    }

    /// One sweep of [`SbpGraph::neighborhood_greedy_step`] over all live nodes.
    ///
    /// If the one-hop neighborhood of a node fits into `window_size`, it is optimized as a
    /// whole. Otherwise it is split into overlapping windows of `window_size` nodes which all
    /// contain the centre node. With `window_size <= 1`, every node is optimized individually.
    pub fn neighborhood_sweep(&mut self, window_size: usize) -> Cancellable<f64> {
        let mut total = 0.0;
        for node in self.live.clone() {
            is_cancelled!()?;
            if window_size <= 1 {
                total += self.neighborhood_greedy_step(&[node]);
                continue;
            }
            let ring = self.one_ring_neighborhood(node);
            if ring.len() <= window_size {
                total += self.neighborhood_greedy_step(&ring);
            } else {
                for window in ring_windows(&ring, window_size) {
                    total += self.neighborhood_greedy_step(&window);
                }
            }
        }
        Ok(total)
    }
}

/// Split a one-hop neighborhood (centre first) into overlapping windows of `size` nodes. Each
/// window holds the centre and `size - 1` consecutive neighbors (cyclically), starting at
/// every neighbor in turn.
///
/// Requires `1 < size < ring.len()`.
pub(crate) fn ring_windows(ring: &[NodeId], size: usize) -> Vec<Vec<NodeId>> {
    let Some((centre, others)) = ring.split_first() else {
        return Vec::new();
    };
    let width = size - 1;
    (0..others.len())
        .map(|start| {
            let mut window = Vec::with_capacity(size);
            window.push(*centre);
            window.extend((0..width).map(|i| others[(start + i) % others.len()]));
            window
        })
        .collect()
}
