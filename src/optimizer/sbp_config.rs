use crate::graph::DEFAULT_MERGE_THRESHOLD;
use crate::search::{InitialAssignment, SearchMode};

/// Default number of nodes optimized together by the neighborhood search.
pub const DEFAULT_NEIGHBORHOOD_SIZE: usize = 4;

/// A "flat" configuration object of the [`SbpOptimization`](crate::SbpOptimization) pipeline.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SbpConfig {
    /// Merging never creates a node with more candidates than this (default: `100`).
    ///
    /// A threshold that prevents any merge is not an error; the graph then simply stays
    /// larger for the local search.
    pub merge_threshold: usize,
    /// The largest number of nodes that the neighborhood search optimizes together
    /// (default: `4`). Values `<= 1` optimize every node individually.
    pub neighborhood_size: usize,
    /// Local search strategy (default: [`SearchMode::Neighborhood`]).
    pub search_mode: SearchMode,
    /// Assignment of the reduced graph before local search (default:
    /// [`InitialAssignment::Cheapest`]).
    pub initial_assignment: InitialAssignment,
    /// Stop the local search after the specified number of sweeps (default: `usize::MAX`).
    ///
    /// The search never performs more than `live nodes + 1` sweeps regardless of this value.
    pub max_sweeps: usize,
}

impl Default for SbpConfig {
    fn default() -> Self {
        SbpConfig::new()
    }
}

impl From<SearchMode> for SbpConfig {
    fn from(value: SearchMode) -> Self {
        SbpConfig {
            search_mode: value,
            ..SbpConfig::new()
        }
    }
}

impl From<InitialAssignment> for SbpConfig {
    fn from(value: InitialAssignment) -> Self {
        SbpConfig {
            initial_assignment: value,
            ..SbpConfig::new()
        }
    }
}

impl SbpConfig {
    /// Create a new instance of [`SbpConfig`] with default values.
    pub fn new() -> SbpConfig {
        SbpConfig {
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            neighborhood_size: DEFAULT_NEIGHBORHOOD_SIZE,
            search_mode: SearchMode::default(),
            initial_assignment: InitialAssignment::default(),
            max_sweeps: usize::MAX,
        }
    }

    /// Update the merge threshold.
    pub fn with_merge_threshold(mut self, threshold: usize) -> SbpConfig {
        self.merge_threshold = threshold;
        self
    }

    /// Update the neighborhood window size.
    pub fn with_neighborhood_size(mut self, size: usize) -> SbpConfig {
        self.neighborhood_size = size;
        self
    }

    pub fn with_search_mode(mut self, mode: SearchMode) -> SbpConfig {
        self.search_mode = mode;
        self
    }

    pub fn with_initial_assignment(mut self, assignment: InitialAssignment) -> SbpConfig {
        self.initial_assignment = assignment;
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> SbpConfig {
        self.max_sweeps = max_sweeps;
        self
    }
}
