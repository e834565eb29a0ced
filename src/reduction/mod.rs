//! Exact structural reductions of the SBP graph and the merge heuristic.
//!
//! # Eliminations
//!
//! Three eliminations shrink the graph without changing the optimal cost:
//!
//! - [`EdgeElimination`]: parallel edges between the same pair of nodes are summed into one
//!   [`EdgeKind::ParallelBundle`](crate::EdgeKind::ParallelBundle) edge.
//! - [`NodeElimination`]: a node with exactly two incident edges is replaced by one
//!   [`EdgeKind::MidBridged`](crate::EdgeKind::MidBridged) edge between its neighbors.
//! - [`ChildElimination`]: a node with exactly one incident edge is detached into its neighbor,
//!   which absorbs the cheapest contribution of the child for each of its own candidates.
//!
//! [`SbpGraph::node_and_edge_eliminations`] applies these until nothing changes.
//!
//! # Merging
//!
//! Once the eliminations are stuck, [`SbpGraph::pick_and_merge`] joins the two nodes with the
//! largest shared neighborhood into one node whose candidates are the cross product of the
//! candidates of both halves (bounded by [`SbpGraph::merge_threshold`]). This usually enables
//! further eliminations. [`SbpGraph::reduce`] alternates the two until the graph stops
//! shrinking.

use crate::graph::{NodeId, SbpGraph};
use crate::{log_graph, simple_type_name};
use cancel_this::{Cancellable, is_cancelled};
use log::{debug, info};


mod merging;
mod step_operators;

pub use step_operators::{ChildElimination, DegreeTwo, EdgeElimination, NodeElimination};

/// One kind of exact elimination applied to a single live node.
///
/// Implementors are iterated over the whole live list by [`SbpGraph::elimination_sweep`].
pub trait EliminationStep {
    /// Try to eliminate around `node` and return the number of eliminated nodes or edges
    /// (zero if the node does not have the required shape).
    fn eliminate(graph: &mut SbpGraph, node: NodeId) -> usize;
}

impl SbpGraph {
    /// Apply `S` to every live node, iterating the live list from the back.
    ///
    /// Nodes removed during the sweep are never revisited, nodes moved into an already
    /// visited position are left for the next sweep.
    pub fn elimination_sweep<S: EliminationStep>(&mut self) -> Cancellable<usize> {
        let mut eliminated = 0;
        let mut index = self.live.len();
        while index > 0 {
            is_cancelled!()?;
            index -= 1;
            if let Some(&node) = self.live.get(index) {
                eliminated += S::eliminate(self, node);
            }
        }

        if eliminated > 0 {
            debug!(
                "Sweep<{}> eliminated {} elements ({}).",
                simple_type_name::<S>(),
                eliminated,
                log_graph(self)
            );
        }
        debug_assert_eq!(self.check_invariants(), Ok(()));

        Ok(eliminated)
    }

    /// One pass of all three eliminations over the live list.
    pub fn elimination_pass(&mut self) -> Cancellable<usize> {
        let mut eliminated = self.elimination_sweep::<NodeElimination>()?;
        eliminated += self.elimination_sweep::<EdgeElimination>()?;
        eliminated += self.elimination_sweep::<ChildElimination>()?;
        Ok(eliminated)
    }

    /// Repeat [`SbpGraph::elimination_pass`] until it performs no eliminations.
    ///
    /// Returns the total number of eliminations. Running this on an already converged graph
    /// returns zero and leaves the graph unchanged.
    pub fn node_and_edge_eliminations(&mut self) -> Cancellable<usize> {
        let mut total = 0;
        loop {
            let eliminated = self.elimination_pass()?;
            if eliminated == 0 {
                break;
            }
            total += eliminated;
        }

        if total > 0 {
            debug!("Eliminations converged after {} steps ({}).", total, log_graph(self));
        }

        Ok(total)
    }

    /// Alternate exact eliminations and merging until the graph stops shrinking or at most
    /// two live nodes remain.
    ///
    /// Returns the total number of eliminations and merges.
    pub fn reduce(&mut self) -> Cancellable<usize> {
        let mut total = self.node_and_edge_eliminations()?;
        while self.live.len() > 2 {
            is_cancelled!()?;
            let merged = self.pick_and_merge();
            if merged == 0 {
                break;
            }
            total += merged;
            total += self.node_and_edge_eliminations()?;
        }

        info!("Reduction finished after {} steps ({}).", total, log_graph(self));

        Ok(total)
    }
}
