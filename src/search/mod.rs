//! Local search over the candidate assignment of the reduced graph.
//!
//! The search starts from an initial assignment ([`InitialAssignment`]) and repeatedly
//! re-optimizes small parts of the graph while keeping the rest fixed. Every committed move
//! strictly decreases the total cost, so the search always terminates.
//!
//! Two strategies are available (see [`SearchMode`]):
//!
//! - **Neighborhood** (default): for every live node, an exact branch-and-bound search over
//!   windows of its one-hop neighborhood
//!   ([`SbpGraph::neighborhood_greedy_step`]).
//! - **Edge**: for every live edge, an exhaustive search over the candidate pairs of its
//!   endpoints ([`SbpGraph::edge_greedy_step`]).

use crate::graph::{NodeId, SbpGraph};
use cancel_this::{Cancellable, is_cancelled};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[cfg(test)]
mod tests;

mod edge_greedy;
mod neighborhood;

/// Strategy used for local search sweeps.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchMode {
    /// Branch-and-bound over windows of one-hop neighborhoods.
    #[default]
    Neighborhood,
    /// Exhaustive search over the endpoints of each edge.
    Edge,
    /// Keep the initial assignment.
    Disabled,
}

/// How the live nodes are assigned before the local search starts.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitialAssignment {
    /// Every node takes its candidate with the smallest own cost.
    #[default]
    Cheapest,
    /// Every node takes a uniformly random candidate. The same seed always produces
    /// the same assignment.
    Random(u64),
}

impl SbpGraph {
    /// Assign every live node according to the given strategy.
    pub fn seed_assignment(&mut self, strategy: InitialAssignment) {
        match strategy {
            InitialAssignment::Cheapest => {
                for node in &self.live {
                    let data = &mut self.nodes[node.index()];
                    data.final_choice = Some(data.cheapest_candidate());
                }
            }
            InitialAssignment::Random(seed) => self.random_assignment(seed),
        }
    }

    /// Assign every live node a uniformly random candidate.
    pub fn random_assignment(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for node in &self.live {
            let data = &mut self.nodes[node.index()];
            data.final_choice = Some(rng.gen_range(0..data.cost.len()));
        }
    }

    /// Cost of assigning `candidate` to `node` while every node outside of `window` keeps its
    /// current choice: the own cost of the candidate plus the cost of all edges leading out of
    /// the window. Edges to other members of the window are not included.
    pub(crate) fn outside_cost(&self, node: NodeId, candidate: usize, window: &[NodeId]) -> f64 {
        let data = &self.nodes[node.index()];
        let mut total = data.cost[candidate];
        for edge in data.edges_in.iter().chain(data.edges_out.iter()) {
            let edge = &self.edges[edge.index()];
            let other = edge.other_end(node);
            if !window.contains(&other) {
                let other_choice = self.nodes[other.index()].current_choice();
                total += edge.cost_from(node, candidate, other_choice);
            }
        }
        total
    }

    /// Perform one sweep of the given search strategy and return the (non-positive) change
    /// of the total cost.
    pub fn search_sweep(&mut self, mode: SearchMode, window_size: usize) -> Cancellable<f64> {
        match mode {
            SearchMode::Neighborhood => self.neighborhood_sweep(window_size),
            SearchMode::Edge => self.edge_sweep(),
            SearchMode::Disabled => Ok(0.0),
        }
    }

    /// Repeat [`SbpGraph::search_sweep`] until a sweep brings no improvement, but at most
    /// `live nodes + 1` times (and at most `max_sweeps` times).
    ///
    /// Returns the total (non-positive) change of the cost.
    pub fn greedy_search(
        &mut self,
        mode: SearchMode,
        window_size: usize,
        max_sweeps: usize,
    ) -> Cancellable<f64> {
        let limit = max_sweeps.min(self.live.len() + 1);
        let mut total = 0.0;
        for sweep in 0..limit {
            is_cancelled!()?;
            let improvement = self.search_sweep(mode, window_size)?;
            debug!("[sweep:{sweep}] Search<{mode:?}> changed cost by {improvement}.");
            if improvement >= 0.0 {
                break;
            }
            total += improvement;
        }

        info!("Search<{mode:?}> finished with total change {total}.");

        Ok(total)
    }
}
