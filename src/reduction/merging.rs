use crate::graph::{EdgeId, MergedPair, NodeId, SbpGraph, SbpNode};
use crate::is_forbidden;
use log::{debug, trace};

impl SbpGraph {
    /// Sorted neighborhood of a live node: the node itself plus all nodes connected to it by
    /// an edge (in either direction).
    pub fn neighborhood(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = vec![node];
        for edge in self.incident_edges(node) {
            result.push(self.edges[edge.index()].other_end(node));
        }
        result.sort();
        result.dedup();
        result
    }

    /// Merge the pair of live nodes with the largest shared neighborhood.
    ///
    /// Only pairs whose candidate product does not exceed [`SbpGraph::merge_threshold`] are
    /// eligible, and the pairs must share at least one neighborhood element. Ties are broken
    /// in favor of the smaller product (then the first pair found). Returns the number of
    /// merges performed (zero or one).
    pub fn pick_and_merge(&mut self) -> usize {
        if self.live.len() <= 2 {
            return 0;
        }

        let neighborhoods: Vec<Vec<NodeId>> =
            self.live.iter().map(|it| self.neighborhood(*it)).collect();

        // (first position, second position, shared neighborhood size, candidate product)
        let mut best: Option<(usize, usize, usize, usize)> = None;
        for i in 0..self.live.len() {
            let count_i = self.candidate_count(self.live[i]);
            for j in (i + 1)..self.live.len() {
                let product = count_i.saturating_mul(self.candidate_count(self.live[j]));
                if product > self.merge_threshold {
                    continue;
                }
                let shared = intersection_size(&neighborhoods[i], &neighborhoods[j]);
                if shared == 0 {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((_, _, best_shared, best_product)) => {
                        shared > best_shared || (shared == best_shared && product < best_product)
                    }
                };
                if better {
                    best = Some((i, j, shared, product));
                }
            }
        }

        let Some((i, j, shared, product)) = best else {
            debug!(
                "No pair of nodes can be merged within threshold {}.",
                self.merge_threshold
            );
            return 0;
        };

        let (first, second) = (self.live[i], self.live[j]);
        let merged = self.merge_nodes(first, second);
        debug!(
            "Merged {first} and {second} into {merged} (shared neighborhood {shared}; candidates {product})."
        );
        1
    }

    /// Merge two live nodes into a new node whose candidates are the cross product of their
    /// candidates, and return the new node.
    ///
    /// The cost of the merged candidate `(i, j)` is `first.cost[i] + second.cost[j]` plus the
    /// cost of the edges connecting the two halves. Forbidden combinations are dropped unless
    /// all of them are forbidden. All other edges of the halves are moved to the merged node.
    pub fn merge_nodes(&mut self, first: NodeId, second: NodeId) -> NodeId {
        // Leaves at most one edge between the halves.
        self.edge_elimination(first);
        let common_edge: Option<EdgeId> = self
            .incident_edges(first)
            .into_iter()
            .find(|it| self.edges[it.index()].other_end(first) == second);

        let first_data = &self.nodes[first.index()];
        let second_data = &self.nodes[second.index()];
        let mut pairs = Vec::with_capacity(first_data.cost.len() * second_data.cost.len());
        let mut cost = Vec::with_capacity(pairs.capacity());
        for (i, first_cost) in first_data.cost.iter().enumerate() {
            for (j, second_cost) in second_data.cost.iter().enumerate() {
                let mut total = first_cost + second_cost;
                if let Some(edge) = common_edge {
                    total += self.edges[edge.index()].cost_from(first, i, j);
                }
                pairs.push((i, j));
                cost.push(total);
            }
        }

        if cost.iter().any(|it| !is_forbidden(*it)) {
            let (kept_pairs, kept_cost): (Vec<_>, Vec<_>) = pairs
                .into_iter()
                .zip(cost)
                .filter(|(_, cost)| !is_forbidden(*cost))
                .unzip();
            pairs = kept_pairs;
            cost = kept_cost;
        }

        let final_choice = match (first_data.final_choice, second_data.final_choice) {
            (Some(i), Some(j)) => pairs.iter().position(|it| *it == (i, j)),
            _ => None,
        };

        if let Some(edge) = common_edge {
            self.detach_edge(edge);
        }
        self.retire_node(first);
        self.retire_node(second);

        let first_pick: Vec<usize> = pairs.iter().map(|it| it.0).collect();
        let second_pick: Vec<usize> = pairs.iter().map(|it| it.1).collect();
        let mut node = SbpNode::new(NodeId::new(0), cost, false);
        node.final_choice = final_choice;
        node.merged = Some(MergedPair {
            first,
            second,
            pairs,
            common_edge,
        });
        let merged = self.insert_node(node);

        for (half, pick) in [(first, first_pick), (second, second_pick)] {
            let edges_out = std::mem::take(&mut self.nodes[half.index()].edges_out);
            for edge in &edges_out {
                let data = &mut self.edges[edge.index()];
                data.expand_start(&pick);
                data.start = merged;
            }
            let edges_in = std::mem::take(&mut self.nodes[half.index()].edges_in);
            for edge in &edges_in {
                let data = &mut self.edges[edge.index()];
                data.expand_end(&pick);
                data.end = merged;
            }
            let node = &mut self.nodes[merged.index()];
            node.edges_out.extend(edges_out);
            node.edges_in.extend(edges_in);
        }
        self.eliminations += 1;

        trace!(
            "Merged node {merged} has {} candidates.",
            self.candidate_count(merged)
        );
        merged
    }
}

/// Number of common elements of two sorted vectors.
fn intersection_size(a: &[NodeId], b: &[NodeId]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}
