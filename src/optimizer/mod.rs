//! The complete optimization pipeline as a resumable computation.
//!
//! [`SbpOptimization`] runs the following phases, each step of the computation performing a
//! bounded amount of work:
//!
//! 1. **Reducing**: one pass of exact eliminations per step. Once a pass is unproductive and
//!    more than two live nodes remain, one merge is attempted. The phase ends when neither
//!    eliminations nor merging change the graph.
//! 2. **Seeding**: the live nodes receive their initial assignment.
//! 3. **Searching**: one local search sweep per step, until a sweep brings no improvement
//!    or the sweep limit is reached.
//! 4. **Finalizing**: choices are propagated to all nodes and the [`SbpSolution`] is
//!    produced.
//!
//! ```
//! use computation_process::{Computable, Stateful};
//! use sbp_graph::{CostTable, SbpConfig, SbpGraph, SbpOptimization, SbpState, SearchMode};
//!
//! let mut graph = SbpGraph::new();
//! let nodes: Vec<_> = (0..3).map(|_| graph.add_node(vec![2.0, 1.0]).unwrap()).collect();
//! let table = CostTable::from_rows(vec![vec![0.0, 3.0], vec![3.0, 0.0]]).unwrap();
//! graph.add_edge(nodes[0], nodes[1], table.clone()).unwrap();
//! graph.add_edge(nodes[1], nodes[2], table).unwrap();
//!
//! let config = SbpConfig::from(SearchMode::Edge).with_merge_threshold(16);
//! let mut optimization = SbpOptimization::configure(config, SbpState::from(graph));
//! let solution = optimization.compute().unwrap();
//! assert_eq!(solution.total_cost(), 3.0);
//! ```

mod sbp_config;


pub use sbp_config::{DEFAULT_NEIGHBORHOOD_SIZE, SbpConfig};

use crate::finalize::SbpSolution;
use crate::graph::SbpGraph;
use crate::log_graph;
use crate::search::SearchMode;
use computation_process::Incomplete::Suspended;
use computation_process::{Completable, Computation, ComputationStep};
use log::{debug, info};

/// Run the whole SBP optimization pipeline on a graph.
pub type SbpOptimization = Computation<SbpConfig, SbpState, SbpSolution, SbpStep>;

/// The graph under optimization together with the current pipeline phase.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SbpState {
    graph: SbpGraph,
    phase: Phase,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Phase {
    Reducing,
    Seeding,
    Searching { sweep: usize },
    Finalizing,
}

impl From<SbpGraph> for SbpState {
    fn from(value: SbpGraph) -> Self {
        SbpState {
            graph: value,
            phase: Phase::Reducing,
        }
    }
}

impl SbpState {
    /// The graph in its current (possibly partially reduced) form.
    pub fn graph(&self) -> &SbpGraph {
        &self.graph
    }

    pub fn into_graph(self) -> SbpGraph {
        self.graph
    }

    /// True once the reduction phase is over.
    pub fn is_reduced(&self) -> bool {
        self.phase != Phase::Reducing
    }
}

/// The [`ComputationStep`] of [`SbpOptimization`].
pub struct SbpStep;

impl ComputationStep<SbpConfig, SbpState, SbpSolution> for SbpStep {
    fn step(context: &SbpConfig, state: &mut SbpState) -> Completable<SbpSolution> {
        let graph = &mut state.graph;
        match state.phase {
            Phase::Reducing => {
                graph.set_merge_threshold(context.merge_threshold);
                if graph.elimination_pass()? > 0 {
                    return Err(Suspended);
                }
                if graph.live_node_count() > 2 && graph.pick_and_merge() > 0 {
                    return Err(Suspended);
                }

                info!("Reduction finished ({}).", log_graph(graph));
                state.phase = Phase::Seeding;
                Err(Suspended)
            }
            Phase::Seeding => {
                graph.seed_assignment(context.initial_assignment);
                let cost = graph.compute_cost();

                info!(
                    "Initial assignment {:?} has cost {}.",
                    context.initial_assignment, cost
                );
                state.phase = Phase::Searching { sweep: 0 };
                Err(Suspended)
            }
            Phase::Searching { sweep } => {
                let limit = context.max_sweeps.min(graph.live_node_count() + 1);
                if sweep >= limit || context.search_mode == SearchMode::Disabled {
                    state.phase = Phase::Finalizing;
                    return Err(Suspended);
                }

                let improvement =
                    graph.search_sweep(context.search_mode, context.neighborhood_size)?;
                let cost = graph.compute_cost();
                debug!(
                    "[sweep:{}] Search<{:?}> changed cost by {} to {}.",
                    sweep, context.search_mode, improvement, cost
                );

                state.phase = if improvement < 0.0 {
                    Phase::Searching { sweep: sweep + 1 }
                } else {
                    Phase::Finalizing
                };
                Err(Suspended)
            }
            Phase::Finalizing => {
                graph.finalize();
                let solution = graph.solution();

                info!(
                    "Optimization finished with cost {} (reduced graph cost {}).",
                    solution.total_cost(),
                    graph.compute_cost()
                );
                Ok(solution)
            }
        }
    }
}
