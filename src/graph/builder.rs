use crate::cost_table::CostTable;
use crate::error::{SbpError, SbpResult};
use crate::finalize::SbpSolution;
use crate::graph::{NodeId, SbpGraph};

/// Assembles an [`SbpGraph`] from opaque candidate descriptions and cost-model callbacks.
///
/// The builder only records the structure (candidate lists and node pairs). The costs are
/// computed once in [`SbpGraphBuilder::build`], which asks the `node_cost` callback about every
/// candidate and the `edge_cost` callback about every candidate pair of every edge.
///
/// ```
/// use sbp_graph::SbpGraphBuilder;
///
/// let mut builder = SbpGraphBuilder::new();
/// let a = builder.add_node(vec!["split", "broadcast"]);
/// let b = builder.add_node(vec!["split", "broadcast"]);
/// builder.add_edge(a, b).unwrap();
///
/// let graph = builder
///     .build(
///         |_, candidate| if *candidate == "split" { 1.0 } else { 4.0 },
///         |_, x, _, y| if x == y { 0.0 } else { 10.0 },
///     )
///     .unwrap();
/// assert_eq!(graph.live_node_count(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct SbpGraphBuilder<S> {
    candidates: Vec<Vec<S>>,
    edges: Vec<(NodeId, NodeId)>,
}

impl<S> Default for SbpGraphBuilder<S> {
    fn default() -> Self {
        SbpGraphBuilder {
            candidates: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl<S> SbpGraphBuilder<S> {
    pub fn new() -> SbpGraphBuilder<S> {
        SbpGraphBuilder::default()
    }

    /// Declare a node with the given candidates. The returned handle is also the handle of the
    /// node in the built graph.
    pub fn add_node(&mut self, candidates: Vec<S>) -> NodeId {
        let id = NodeId::new(self.candidates.len());
        self.candidates.push(candidates);
        id
    }

    /// Declare an edge between two previously declared nodes.
    pub fn add_edge(&mut self, start: NodeId, end: NodeId) -> SbpResult<()> {
        for node in [start, end] {
            if node.index() >= self.candidates.len() {
                return Err(SbpError::UnknownNode(node));
            }
        }
        if start == end {
            return Err(SbpError::SelfLoop(start));
        }
        self.edges.push((start, end));
        Ok(())
    }

    /// The candidates of a declared node.
    ///
    /// # Panics
    ///
    /// Panics if the node was not declared by this builder.
    pub fn candidates(&self, node: NodeId) -> &[S] {
        &self.candidates[node.index()]
    }

    /// Evaluate the cost model and create the graph.
    pub fn build<NC, EC>(&self, mut node_cost: NC, mut edge_cost: EC) -> SbpResult<SbpGraph>
    where
        NC: FnMut(NodeId, &S) -> f64,
        EC: FnMut(NodeId, &S, NodeId, &S) -> f64,
    {
        let mut graph = SbpGraph::new();
        for (index, candidates) in self.candidates.iter().enumerate() {
            let node = NodeId::new(index);
            let cost = candidates.iter().map(|it| node_cost(node, it)).collect();
            graph.add_node(cost)?;
        }
        for &(start, end) in &self.edges {
            let rows = &self.candidates[start.index()];
            let cols = &self.candidates[end.index()];
            let cost = CostTable::from_fn(rows.len(), cols.len(), |i, j| {
                edge_cost(start, &rows[i], end, &cols[j])
            });
            graph.add_edge(start, end, cost)?;
        }
        Ok(graph)
    }

    /// Translate the choices of a solution back to the declared candidates.
    pub fn resolve<'a>(&'a self, solution: &SbpSolution) -> Vec<(NodeId, &'a S)> {
        solution
            .choices()
            .iter()
            .filter_map(|(node, choice)| {
                self.candidates
                    .get(node.index())
                    .and_then(|it| it.get(*choice))
                    .map(|candidate| (*node, candidate))
            })
            .collect()
    }
}
