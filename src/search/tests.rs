use crate::cost_table::CostTable;
use crate::graph::{NodeId, SbpGraph};
use crate::search::neighborhood::ring_windows;
use crate::search::{InitialAssignment, SearchMode};
use crate::test_utils::{brute_force, init_logger, path_problem, random_problem};
use crate::{FORBIDDEN_COST, is_forbidden};

fn choices(graph: &SbpGraph) -> Vec<Option<usize>> {
    graph
        .live_nodes()
        .iter()
        .map(|it| graph.node(*it).final_choice())
        .collect()
}

#[test]
fn test_cheapest_assignment() {
    let mut graph = path_problem().build().unwrap();
    graph.seed_assignment(InitialAssignment::Cheapest);
    assert_eq!(choices(&graph), vec![Some(0), Some(1), Some(1)]);
}

#[test]
fn test_random_assignment_is_deterministic() {
    let problem = random_problem(1, 12, 4, 0.3, 0.0);
    let mut first = problem.build().unwrap();
    let mut second = problem.build().unwrap();
    first.seed_assignment(InitialAssignment::Random(42));
    second.seed_assignment(InitialAssignment::Random(42));
    assert_eq!(choices(&first), choices(&second));

    for node in first.live_nodes() {
        let choice = first.node(*node).final_choice().unwrap();
        assert!(choice < first.candidate_count(*node));
    }
}

#[test]
fn test_edge_greedy_step_improves_strictly() {
    init_logger();
    let mut graph = SbpGraph::new();
    let a = graph.add_node(vec![0.0, 1.0]).unwrap();
    let b = graph.add_node(vec![0.0, 1.0]).unwrap();
    let table = CostTable::from_rows(vec![vec![FORBIDDEN_COST, 5.0], vec![3.0, 8.0]]).unwrap();
    let edge = graph.add_edge(a, b, table).unwrap();
    graph.seed_assignment(InitialAssignment::Cheapest);

    let before = graph.compute_cost();
    assert!(is_forbidden(before));
    let change = graph.edge_greedy_step(edge);
    assert!(change < 0.0);
    assert_eq!(choices(&graph), vec![Some(1), Some(0)]);
    assert_eq!(graph.compute_cost(), 4.0);

    assert_eq!(graph.edge_greedy_step(edge), 0.0);
    assert_eq!(choices(&graph), vec![Some(1), Some(0)]);
}

#[test]
fn test_infinite_costs_do_not_break_search() {
    init_logger();
    let mut graph = SbpGraph::new();
    let a = graph.add_node(vec![0.0, f64::INFINITY]).unwrap();
    let b = graph.add_node(vec![1.0, 0.0]).unwrap();
    let edge = graph
        .add_edge(a, b, CostTable::filled(2, 2, f64::INFINITY))
        .unwrap();
    assert_eq!(graph.node(a).cost()[1], FORBIDDEN_COST);
    assert!(graph.edge(edge).cost().iter().all(|it| it == FORBIDDEN_COST));

    graph.seed_assignment(InitialAssignment::Cheapest);
    assert_eq!(graph.edge_greedy_step(edge), 0.0);
    assert_eq!(choices(&graph), vec![Some(0), Some(1)]);
    assert_eq!(
        graph.greedy_search(SearchMode::Edge, 4, usize::MAX).unwrap(),
        0.0
    );
    assert_eq!(
        graph
            .greedy_search(SearchMode::Neighborhood, 4, usize::MAX)
            .unwrap(),
        0.0
    );
    assert!(is_forbidden(graph.compute_cost()));
}

#[test]
fn test_node_greedy_step_uses_outside_cost() {
    let mut graph = path_problem().build().unwrap();
    let nodes = graph.live_nodes().to_vec();
    for node in &nodes {
        graph.set_choice(*node, 0);
    }
    let before = graph.compute_cost();

    // The middle node sees both of its neighbors fixed to candidate 0.
    let change = graph.node_greedy_step(nodes[1]);
    let after = graph.compute_cost();
    assert_eq!(after - before, change);
    assert!(change <= 0.0);

    let best = (0..graph.candidate_count(nodes[1]))
        .map(|c| graph.outside_cost(nodes[1], c, &[nodes[1]]))
        .fold(f64::INFINITY, f64::min);
    let current = graph.node(nodes[1]).final_choice().unwrap();
    assert_eq!(graph.outside_cost(nodes[1], current, &[nodes[1]]), best);
}

#[test]
fn test_full_window_is_exact() {
    init_logger();
    for seed in 0..20 {
        let problem = random_problem(seed, 6, 3, 0.5, 0.0);
        let mut graph = problem.build().unwrap();
        graph.seed_assignment(InitialAssignment::Random(seed));
        let before = graph.compute_cost();
        let window = graph.live_nodes().to_vec();

        let change = graph.neighborhood_greedy_step(&window);
        let after = graph.compute_cost();
        assert_eq!(after, brute_force(&problem).0, "Seed {seed}.");
        assert_eq!(after - before, change, "Seed {seed}.");

        // The optimum cannot be improved.
        assert_eq!(graph.neighborhood_greedy_step(&window), 0.0);
    }
}

#[test]
fn test_search_is_monotone() {
    init_logger();
    for mode in [SearchMode::Neighborhood, SearchMode::Edge] {
        for seed in 0..10 {
            let problem = random_problem(seed, 12, 4, 0.3, 0.0);
            let mut graph = problem.build().unwrap();
            graph.seed_assignment(InitialAssignment::Random(seed));
            let mut cost = graph.compute_cost();
            for _ in 0..5 {
                let change = graph.search_sweep(mode, 3).unwrap();
                let next = graph.compute_cost();
                assert!(change <= 0.0);
                assert!(next <= cost, "Mode {mode:?}, seed {seed}.");
                cost = next;
            }
        }
    }
}

#[test]
fn test_greedy_search_terminates() {
    init_logger();
    let problem = random_problem(3, 10, 3, 0.4, 0.0);
    let mut graph = problem.build().unwrap();
    graph.seed_assignment(InitialAssignment::Random(3));
    let before = graph.compute_cost();
    let total = graph
        .greedy_search(SearchMode::Neighborhood, 4, usize::MAX)
        .unwrap();
    let after = graph.compute_cost();
    assert!(total <= 0.0);
    assert_eq!(after - before, total);
    assert!(after >= brute_force(&problem).0);

    let mut disabled = problem.build().unwrap();
    disabled.seed_assignment(InitialAssignment::Random(3));
    assert_eq!(
        disabled.greedy_search(SearchMode::Disabled, 4, usize::MAX).unwrap(),
        0.0
    );
    assert_eq!(disabled.compute_cost(), before);
}

#[test]
fn test_ring_windows_contain_centre() {
    let ring: Vec<NodeId> = (0..5).map(NodeId::new).collect();
    let windows = ring_windows(&ring, 3);
    assert_eq!(windows.len(), 4);
    assert_eq!(windows[0], vec![ring[0], ring[1], ring[2]]);
    assert_eq!(windows[3], vec![ring[0], ring[4], ring[1]]);
    for window in &windows {
        assert_eq!(window.len(), 3);
        assert_eq!(window[0], ring[0]);
    }
}

#[test]
fn test_one_ring_matches_neighborhood() {
    let graph = random_problem(5, 10, 2, 0.4, 0.0).build().unwrap();
    for node in graph.live_nodes() {
        let ring = graph.one_ring_neighborhood(*node);
        assert_eq!(ring[0], *node);
        let mut sorted = ring.clone();
        sorted.sort();
        assert_eq!(sorted, graph.neighborhood(*node));
    }
}

#[test]
fn test_one_ring_neighborhood() {
    let problem = path_problem();
    let graph = problem.build().unwrap();
    let middle = graph.live_nodes()[1];
    assert_eq!(
        graph.one_ring_neighborhood(middle),
        vec![middle, graph.live_nodes()[0], graph.live_nodes()[2]]
    );
}
