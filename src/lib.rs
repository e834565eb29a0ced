//! Cost-minimization over SBP graphs.
//!
//! An [`SbpGraph`] consists of nodes, each with a list of candidate configurations
//! (signatures) and a per-candidate cost, and edges whose cost depends on the candidates
//! chosen at both endpoints. The goal is to pick one candidate per node such that the sum of
//! all node and edge costs is minimal.
//!
//! The optimizer combines exact structural reductions ([`reduction`]), a merge heuristic
//! bounded by the combinatorial size of merged nodes, and a branch-and-bound local search
//! ([`search`]). The full pipeline is available as the resumable computation
//! [`SbpOptimization`]:
//!
//! ```
//! use computation_process::{Computable, Stateful};
//! use sbp_graph::{CostTable, SbpConfig, SbpGraph, SbpOptimization, SbpState};
//!
//! let mut graph = SbpGraph::new();
//! let a = graph.add_node(vec![1.0, 5.0]).unwrap();
//! let b = graph.add_node(vec![4.0, 1.0]).unwrap();
//! let transfer = CostTable::from_rows(vec![vec![0.0, 10.0], vec![10.0, 0.0]]).unwrap();
//! graph.add_edge(a, b, transfer).unwrap();
//!
//! let mut optimization = SbpOptimization::configure(SbpConfig::default(), SbpState::from(graph));
//! let solution = optimization.compute().unwrap();
//! assert_eq!(solution.total_cost(), 5.0);
//! ```

#[cfg(test)]
mod test_utils;

pub mod cost_table;
pub mod error;
mod finalize;
pub mod graph;
pub mod optimizer;
mod overlap;
pub mod problem;
pub mod reduction;
pub mod search;

pub use cost_table::{ChoiceTable, CostTable, Table};
pub use error::{SbpError, SbpResult};
pub use finalize::SbpSolution;
pub use graph::{EdgeId, EdgeKind, NodeId, SbpEdge, SbpGraph, SbpGraphBuilder, SbpNode};
pub use optimizer::{SbpConfig, SbpOptimization, SbpState, SbpStep};
pub use problem::SbpProblem;
pub use search::{InitialAssignment, SearchMode};

/// Cost of an infeasible combination.
///
/// The value is finite, so sums involving it remain ordered, and any total at or above it
/// is considered infeasible.
pub const FORBIDDEN_COST: f64 = 3.0e38;

/// True if the cost marks an infeasible combination.
pub fn is_forbidden(cost: f64) -> bool {
    cost >= FORBIDDEN_COST
}

/// Bring a user-provided cost onto the scale of the optimizer.
///
/// Every cost at or above [`FORBIDDEN_COST`] (including `+inf`) becomes exactly
/// [`FORBIDDEN_COST`]. `NaN` and `-inf` are not valid costs and give `None`.
pub(crate) fn normalize_cost(cost: f64) -> Option<f64> {
    if cost.is_nan() || cost == f64::NEG_INFINITY {
        None
    } else {
        Some(cost.min(FORBIDDEN_COST))
    }
}

/// A utility method for printing useful metadata of the reduced graph.
fn log_graph(graph: &SbpGraph) -> String {
    format!(
        "live nodes={}; live edges={}; total nodes={}",
        graph.live_node_count(),
        graph.live_edges().count(),
        graph.node_count()
    )
}

/// Extract the "simple name" of a type argument at compile time.
fn simple_type_name<T>() -> &'static str {
    std::any::type_name::<T>().split("::").last().unwrap_or("?")
}
