use crate::error::{SbpError, SbpResult};
use crate::graph::{NodeId, SbpGraph};
use log::{debug, info};

impl SbpGraph {
    /// Assign every node its layer: the length of the longest directed path from a node
    /// without incoming edges. Nodes on (or behind) a directed cycle get no layer.
    ///
    /// Returns the number of layers.
    pub fn compute_layers(&mut self) -> usize {
        let mut pending: Vec<usize> = vec![0; self.nodes.len()];
        let mut stack: Vec<NodeId> = Vec::new();
        for node in &self.live {
            let data = &mut self.nodes[node.index()];
            data.layer = None;
            pending[node.index()] = data.edges_in.len();
            if data.edges_in.is_empty() {
                data.layer = Some(0);
                stack.push(*node);
            }
        }

        let mut layer_count = 0;
        while let Some(node) = stack.pop() {
            let layer = self.nodes[node.index()].layer.unwrap_or(0);
            layer_count = layer_count.max(layer + 1);
            for edge in self.nodes[node.index()].edges_out.clone() {
                let end = self.edges[edge.index()].end;
                let end_data = &mut self.nodes[end.index()];
                end_data.layer = Some(end_data.layer.map_or(layer + 1, |it| it.max(layer + 1)));
                pending[end.index()] -= 1;
                if pending[end.index()] == 0 {
                    stack.push(end);
                }
            }
        }

        // Nodes that were reached but never released are part of a cycle region.
        for node in &self.live {
            if pending[node.index()] > 0 {
                self.nodes[node.index()].layer = None;
            }
        }

        debug!("Computed {layer_count} layers.");
        layer_count
    }

    /// Discount edge costs that overlap with concurrent computation.
    ///
    /// In every layer with at least two nodes, the two largest minimal node costs are found.
    /// For a node of that layer, the concurrent computation is the largest of the other nodes,
    /// and each of its outgoing edges with largest finite cost `m > 0` receives the ratio
    /// `min(current, max(min_ratio, (m - concurrent) / m))` where
    /// `min_ratio = min(cost_ratio, 0.5)`. The ratio then multiplies every positive finite
    /// entry of the edge table (and of the preserved original relation).
    ///
    /// Fails if `cost_ratio` is not within `[0, 1]`, if the graph was already reduced, or if
    /// the overlap was already adjusted (the discounted costs would be discounted again).
    pub fn detect_adjust_overlap(&mut self, cost_ratio: f64) -> SbpResult<()> {
        if !(0.0..=1.0).contains(&cost_ratio) {
            return Err(SbpError::InvalidRatio(cost_ratio));
        }
        if self.is_reduced() {
            return Err(SbpError::AlreadyReduced);
        }
        if self.overlap_applied {
            return Err(SbpError::OverlapApplied);
        }

        let layer_count = self.compute_layers();
        let mut layer_size = vec![0usize; layer_count];
        let mut max_1 = vec![f64::NEG_INFINITY; layer_count];
        let mut max_2 = vec![f64::NEG_INFINITY; layer_count];
        let mut max_1_node: Vec<Option<NodeId>> = vec![None; layer_count];
        for node in &self.live {
            let data = &self.nodes[node.index()];
            let Some(layer) = data.layer else {
                continue;
            };
            layer_size[layer] += 1;
            let cost = data.min_cost();
            if cost > max_1[layer] {
                max_2[layer] = max_1[layer];
                max_1[layer] = cost;
                max_1_node[layer] = Some(*node);
            } else if cost > max_2[layer] {
                max_2[layer] = cost;
            }
        }

        let min_ratio = cost_ratio.min(0.5);
        for node in self.live.clone() {
            let Some(layer) = self.nodes[node.index()].layer else {
                continue;
            };
            if layer_size[layer] < 2 {
                continue;
            }
            let concurrent = if max_1_node[layer] == Some(node) {
                max_2[layer]
            } else {
                max_1[layer]
            };
            for edge in self.nodes[node.index()].edges_out.clone() {
                let data = &mut self.edges[edge.index()];
                let Some(max_cost) = data.cost.max_finite() else {
                    continue;
                };
                if max_cost <= 0.0 {
                    continue;
                }
                let ratio = ((max_cost - concurrent) / max_cost).max(min_ratio);
                data.overlap_ratio = data.overlap_ratio.min(ratio);
            }
        }

        let mut adjusted = 0;
        for relation in &mut self.relations {
            let edge = &mut self.edges[relation.edge.index()];
            if edge.overlap_ratio < 1.0 {
                edge.adjust_overlap_cost();
                relation.cost.scale_finite(edge.overlap_ratio);
                adjusted += 1;
            }
        }

        self.overlap_applied = true;

        info!("Overlap adjusted {adjusted} edges (ratio floor {min_ratio}).");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cost_table::CostTable;
    use crate::error::SbpError;
    use crate::graph::SbpGraph;
    use crate::test_utils::{diamond_problem, init_logger, path_problem};
    use crate::{FORBIDDEN_COST, is_forbidden};

    #[test]
    fn test_layers_of_diamond() {
        let mut graph = diamond_problem().build().unwrap();
        assert_eq!(graph.compute_layers(), 3);
        let layers: Vec<Option<usize>> = graph
            .live_nodes()
            .iter()
            .map(|it| graph.node(*it).layer())
            .collect();
        assert_eq!(layers, vec![Some(0), Some(1), Some(1), Some(2)]);
    }

    #[test]
    fn test_cycle_has_no_layer() {
        let mut graph = SbpGraph::new();
        let nodes: Vec<_> = (0..4).map(|_| graph.add_node(vec![0.0]).unwrap()).collect();
        let zero = CostTable::filled(1, 1, 0.0);
        graph.add_edge(nodes[0], nodes[1], zero.clone()).unwrap();
        graph.add_edge(nodes[1], nodes[2], zero.clone()).unwrap();
        graph.add_edge(nodes[2], nodes[3], zero.clone()).unwrap();
        graph.add_edge(nodes[3], nodes[1], zero).unwrap();

        assert_eq!(graph.compute_layers(), 1);
        assert_eq!(graph.node(nodes[0]).layer(), Some(0));
        for node in &nodes[1..] {
            assert_eq!(graph.node(*node).layer(), None);
        }
    }

    #[test]
    fn test_overlap_scales_finite_entries() {
        init_logger();
        let mut graph = SbpGraph::new();
        let a = graph.add_node(vec![10.0]).unwrap();
        let b = graph.add_node(vec![4.0]).unwrap();
        let c = graph.add_node(vec![0.0, 0.0]).unwrap();
        let heavy = graph
            .add_edge(a, c, CostTable::from_rows(vec![vec![8.0, FORBIDDEN_COST]]).unwrap())
            .unwrap();
        let light = graph
            .add_edge(b, c, CostTable::from_rows(vec![vec![2.0, 0.0]]).unwrap())
            .unwrap();

        graph.detect_adjust_overlap(0.3).unwrap();

        // `a` overlaps with `b`: (8 - 4) / 8.
        assert_eq!(graph.edge(heavy).overlap_ratio(), 0.5);
        assert_eq!(graph.edge(heavy).cost().get(0, 0), 4.0);
        assert!(is_forbidden(graph.edge(heavy).cost().get(0, 1)));
        // `b` overlaps with `a`: (2 - 10) / 2 is below the floor.
        assert_eq!(graph.edge(light).overlap_ratio(), 0.3);
        assert_eq!(graph.edge(light).cost().get(0, 0), 2.0 * 0.3);
        assert_eq!(graph.edge(light).cost().get(0, 1), 0.0);

        graph.set_choice(c, 0);
        assert_eq!(graph.original_cost(), 10.0 + 4.0 + 4.0 + 2.0 * 0.3);
        assert!(!graph.is_reduced());
    }

    #[test]
    fn test_overlap_ratio_floor_is_capped() {
        let mut graph = SbpGraph::new();
        let a = graph.add_node(vec![100.0]).unwrap();
        let b = graph.add_node(vec![100.0]).unwrap();
        let c = graph.add_node(vec![0.0]).unwrap();
        let edge = graph
            .add_edge(a, c, CostTable::filled(1, 1, 10.0))
            .unwrap();
        graph.add_edge(b, c, CostTable::filled(1, 1, 10.0)).unwrap();

        graph.detect_adjust_overlap(1.0).unwrap();
        assert_eq!(graph.edge(edge).overlap_ratio(), 0.5);
        assert_eq!(graph.edge(edge).cost().get(0, 0), 5.0);
    }

    #[test]
    fn test_overlap_is_applied_once() {
        let mut graph = SbpGraph::new();
        let a = graph.add_node(vec![100.0]).unwrap();
        let b = graph.add_node(vec![100.0]).unwrap();
        let c = graph.add_node(vec![0.0]).unwrap();
        let edge = graph
            .add_edge(a, c, CostTable::filled(1, 1, 10.0))
            .unwrap();
        graph.add_edge(b, c, CostTable::filled(1, 1, 10.0)).unwrap();

        graph.detect_adjust_overlap(0.5).unwrap();
        let original = graph.original_cost();
        assert_eq!(
            graph.detect_adjust_overlap(0.5),
            Err(SbpError::OverlapApplied)
        );
        assert_eq!(graph.edge(edge).cost().get(0, 0), 5.0);
        assert_eq!(graph.original_cost(), original);
    }

    #[test]
    fn test_overlap_validation() {
        let mut graph = path_problem().build().unwrap();
        assert_eq!(
            graph.detect_adjust_overlap(1.5),
            Err(SbpError::InvalidRatio(1.5))
        );
        assert!(matches!(
            graph.detect_adjust_overlap(f64::NAN),
            Err(SbpError::InvalidRatio(_))
        ));

        graph.node_and_edge_eliminations().unwrap();
        assert_eq!(
            graph.detect_adjust_overlap(0.5),
            Err(SbpError::AlreadyReduced)
        );
    }
}
