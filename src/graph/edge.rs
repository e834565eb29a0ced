use crate::cost_table::{ChoiceTable, CostTable};
use crate::graph::{EdgeId, NodeId};

/// A cost relation between the candidates of two nodes.
///
/// Rows of [`SbpEdge::cost`] are indexed by the candidates of [`SbpEdge::start`], columns by
/// the candidates of [`SbpEdge::end`]. Like nodes, edges are never freed: an absorbed edge is
/// owned by the edge (or child record, or merged node) that replaced it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SbpEdge {
    pub(crate) id: EdgeId,
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
    pub(crate) cost: CostTable,
    pub(crate) kind: EdgeKind,
    pub(crate) overlap_ratio: f64,
}

/// The way an edge came to be.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeKind {
    /// An edge added by the user.
    Plain,
    /// The entry-wise sum of several edges connecting the same pair of nodes.
    ParallelBundle { edges: Vec<EdgeId> },
    /// The replacement of a degree-two node `mid` and its two edges (`bridge`).
    ///
    /// `mid_choice[(i, j)]` is the candidate of `mid` that minimizes the bridged cost
    /// for start candidate `i` and end candidate `j`.
    MidBridged {
        mid: NodeId,
        bridge: [EdgeId; 2],
        mid_choice: ChoiceTable,
    },
}

impl SbpEdge {
    pub(crate) fn new(
        id: EdgeId,
        start: NodeId,
        end: NodeId,
        cost: CostTable,
        kind: EdgeKind,
    ) -> SbpEdge {
        SbpEdge {
            id,
            start,
            end,
            cost,
            kind,
            overlap_ratio: 1.0,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    pub fn cost(&self) -> &CostTable {
        &self.cost
    }

    pub fn kind(&self) -> &EdgeKind {
        &self.kind
    }

    pub fn overlap_ratio(&self) -> f64 {
        self.overlap_ratio
    }

    /// The edges absorbed by this edge: empty for a plain edge, the summed edges
    /// of a bundle, or the two bridging edges of a bridged edge.
    pub fn sub_edges(&self) -> &[EdgeId] {
        match &self.kind {
            EdgeKind::Plain => &[],
            EdgeKind::ParallelBundle { edges } => edges,
            EdgeKind::MidBridged { bridge, .. } => bridge,
        }
    }

    /// The endpoint of this edge which is not `node`.
    pub fn other_end(&self, node: NodeId) -> NodeId {
        if self.start == node {
            self.end
        } else {
            debug_assert_eq!(self.end, node);
            self.start
        }
    }

    /// The cost of this edge when endpoint `from` selects `from_choice` and the other
    /// endpoint selects `to_choice`.
    pub fn cost_from(&self, from: NodeId, from_choice: usize, to_choice: usize) -> f64 {
        if self.start == from {
            self.cost.get(from_choice, to_choice)
        } else {
            debug_assert_eq!(self.end, from);
            self.cost.get(to_choice, from_choice)
        }
    }

    /// Re-index the rows after the start node was merged: row `i` of the result is the
    /// old row `pick[i]`.
    pub(crate) fn expand_start(&mut self, pick: &[usize]) {
        self.cost = self.cost.select_rows(pick);
        if let EdgeKind::MidBridged { mid_choice, .. } = &mut self.kind {
            *mid_choice = mid_choice.select_rows(pick);
        }
    }

    /// Re-index the columns after the end node was merged.
    pub(crate) fn expand_end(&mut self, pick: &[usize]) {
        self.cost = self.cost.select_cols(pick);
        if let EdgeKind::MidBridged { mid_choice, .. } = &mut self.kind {
            *mid_choice = mid_choice.select_cols(pick);
        }
    }

    /// Apply the current overlap ratio to the cost table.
    pub(crate) fn adjust_overlap_cost(&mut self) {
        if self.overlap_ratio < 1.0 {
            self.cost.scale_finite(self.overlap_ratio);
        }
    }
}
