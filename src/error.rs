use crate::graph::NodeId;
use thiserror::Error;

/// Input validation failures of the SBP graph.
///
/// These are contract violations of the caller assembling the graph. Long-running
/// algorithms on a valid graph only fail through cancellation
/// (see [`cancel_this::Cancellable`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SbpError {
    /// A node was declared with an empty candidate list.
    #[error("node {0} has no candidates")]
    EmptyCandidates(NodeId),

    /// An edge cost table does not match the candidate counts of its endpoints.
    #[error("cost table of edge {start} -> {end} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        start: NodeId,
        end: NodeId,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Nested cost rows of different lengths.
    #[error("ragged cost table: row {row} has {actual} entries, expected {expected}")]
    RaggedTable {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("node {0} does not exist in this graph")]
    UnknownNode(NodeId),

    #[error("an edge cannot connect node {0} to itself")]
    SelfLoop(NodeId),

    /// A cost value is `NaN` or `-inf`. Infeasible combinations use
    /// [`FORBIDDEN_COST`](crate::FORBIDDEN_COST) instead.
    #[error("{0} is not a valid cost")]
    InvalidCost(String),

    #[error("overlap ratio {0} is outside of [0, 1]")]
    InvalidRatio(f64),

    /// The operation is only valid before the first elimination or merge.
    #[error("graph has already been reduced")]
    AlreadyReduced,

    /// Overlap discounts can be applied to a graph only once.
    #[error("overlap adjustment has already been applied")]
    OverlapApplied,
}

pub type SbpResult<T> = Result<T, SbpError>;
