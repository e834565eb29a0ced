use crate::cost_table::CostTable;
use crate::error::SbpError;
use crate::graph::{EdgeKind, NodeId, SbpGraph, SbpGraphBuilder};
use crate::test_utils::{init_logger, path_problem};
use crate::FORBIDDEN_COST;

fn table(rows: Vec<Vec<f64>>) -> CostTable {
    CostTable::from_rows(rows).unwrap()
}

#[test]
fn test_add_node_and_edge() {
    init_logger();
    let mut graph = SbpGraph::new();
    let a = graph.add_node(vec![1.0, 2.0]).unwrap();
    let b = graph.add_node(vec![3.0, 4.0, 5.0]).unwrap();
    let e = graph
        .add_edge(a, b, table(vec![vec![0.0; 3], vec![1.0; 3]]))
        .unwrap();

    assert_eq!(graph.live_nodes(), &[a, b]);
    assert_eq!(graph.node(a).edges_out(), &[e]);
    assert_eq!(graph.node(b).edges_in(), &[e]);
    assert_eq!(graph.edge(e).kind(), &EdgeKind::Plain);
    assert_eq!(graph.edge(e).other_end(a), b);
    assert_eq!(graph.edge(e).cost_from(b, 2, 1), 1.0);
    assert_eq!(graph.merge_threshold(), 100);
    assert!(!graph.is_reduced());
    assert_eq!(graph.check_invariants(), Ok(()));
}

#[test]
fn test_add_node_validation() {
    let mut graph = SbpGraph::new();
    assert_eq!(
        graph.add_node(vec![]),
        Err(SbpError::EmptyCandidates(NodeId::new(0)))
    );
    assert!(matches!(
        graph.add_node(vec![1.0, f64::NAN]),
        Err(SbpError::InvalidCost(_))
    ));
    assert!(matches!(
        graph.add_node(vec![f64::NEG_INFINITY]),
        Err(SbpError::InvalidCost(_))
    ));
    assert_eq!(graph.node_count(), 0);
}

#[test]
fn test_infinite_costs_become_forbidden() {
    let mut graph = SbpGraph::new();
    let a = graph.add_node(vec![f64::INFINITY, 1.0e39]).unwrap();
    let b = graph.add_node(vec![1.0]).unwrap();
    assert_eq!(graph.node(a).cost(), &[FORBIDDEN_COST, FORBIDDEN_COST]);

    let e = graph
        .add_edge(a, b, CostTable::filled(2, 1, f64::INFINITY))
        .unwrap();
    assert_eq!(graph.edge(e).cost().row(1), &[FORBIDDEN_COST]);
    assert!(matches!(
        graph.add_edge(a, b, CostTable::filled(2, 1, f64::NEG_INFINITY)),
        Err(SbpError::InvalidCost(_))
    ));
    assert_eq!(
        table(vec![vec![f64::INFINITY, 2.0]]).row(0),
        &[FORBIDDEN_COST, 2.0]
    );
    assert!(matches!(
        CostTable::from_rows(vec![vec![f64::NEG_INFINITY]]),
        Err(SbpError::InvalidCost(_))
    ));
}

#[test]
fn test_default_graph_uses_default_threshold() {
    assert_eq!(SbpGraph::default().merge_threshold(), 100);
    assert_eq!(SbpGraph::new().merge_threshold(), 100);
}

#[test]
fn test_add_edge_validation() {
    let mut graph = SbpGraph::new();
    let a = graph.add_node(vec![1.0, 2.0]).unwrap();
    let b = graph.add_node(vec![1.0]).unwrap();

    assert_eq!(
        graph.add_edge(a, a, table(vec![vec![0.0, 0.0], vec![0.0, 0.0]])),
        Err(SbpError::SelfLoop(a))
    );
    assert_eq!(
        graph.add_edge(a, NodeId::new(7), table(vec![vec![0.0], vec![0.0]])),
        Err(SbpError::UnknownNode(NodeId::new(7)))
    );
    assert_eq!(
        graph.add_edge(a, b, table(vec![vec![0.0, 0.0]])),
        Err(SbpError::ShapeMismatch {
            start: a,
            end: b,
            expected: (2, 1),
            actual: (1, 2),
        })
    );
    assert!(graph.add_edge(b, a, table(vec![vec![0.0, 0.0]])).is_ok());
}

#[test]
fn test_compute_cost_uses_current_choices() {
    let problem = path_problem();
    let mut graph = problem.build().unwrap();
    let nodes = graph.live_nodes().to_vec();
    for (node, choice) in nodes.iter().zip([1, 2, 0]) {
        graph.set_choice(*node, choice);
    }

    let expected = problem.evaluate(&[1, 2, 0]);
    assert_eq!(graph.compute_cost(), expected);
    assert_eq!(graph.graph_cost(), expected);
    assert_eq!(graph.original_cost(), expected);
}

#[test]
fn test_unassigned_nodes_count_as_first_candidate() {
    let problem = path_problem();
    let mut graph = problem.build().unwrap();
    assert_eq!(graph.compute_cost(), problem.evaluate(&[0, 0, 0]));
}

#[test]
fn test_builder_uses_cost_callbacks() {
    init_logger();
    let mut builder = SbpGraphBuilder::new();
    let a = builder.add_node(vec!["S(0)", "B"]);
    let b = builder.add_node(vec!["S(0)", "S(1)", "B"]);
    builder.add_edge(a, b).unwrap();
    assert_eq!(builder.add_edge(b, b), Err(SbpError::SelfLoop(b)));

    let graph = builder
        .build(
            |_, candidate| candidate.len() as f64,
            |_, x, _, y| if x == y { 0.0 } else { 10.0 },
        )
        .unwrap();

    assert_eq!(graph.node(a).cost(), &[4.0, 1.0]);
    assert_eq!(graph.node(b).cost(), &[4.0, 4.0, 1.0]);
    let edge = graph.node(a).edges_out()[0];
    assert_eq!(graph.edge(edge).cost().row(1), &[10.0, 10.0, 0.0]);
    assert_eq!(builder.candidates(b)[1], "S(1)");
}

#[test]
fn test_builder_rejects_empty_candidates() {
    let mut builder: SbpGraphBuilder<u32> = SbpGraphBuilder::new();
    builder.add_node(vec![1]);
    let empty = builder.add_node(vec![]);
    let result = builder.build(|_, _| 0.0, |_, _, _, _| 0.0);
    assert_eq!(result.unwrap_err(), SbpError::EmptyCandidates(empty));
}

#[test]
fn test_graph_is_frozen_after_reduction() {
    let mut graph = path_problem().build().unwrap();
    graph.node_and_edge_eliminations().unwrap();
    assert!(graph.is_reduced());
    assert_eq!(graph.add_node(vec![1.0]), Err(SbpError::AlreadyReduced));
}
