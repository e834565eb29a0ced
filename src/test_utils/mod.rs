use crate::FORBIDDEN_COST;
use crate::problem::SbpProblem;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Initialize env_logger for tests. Safe to call multiple times.
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// Find an optimal assignment by enumerating all of them.
///
/// Returns the optimal cost and the first (in lexicographic order) optimal assignment.
pub fn brute_force(problem: &SbpProblem) -> (f64, Vec<usize>) {
    let counts: Vec<usize> = problem.nodes.iter().map(|it| it.cost.len()).collect();
    let mut choices = vec![0usize; counts.len()];
    let mut best = (problem.evaluate(&choices), choices.clone());
    loop {
        // Advance the odometer.
        let mut position = 0;
        while position < counts.len() {
            choices[position] += 1;
            if choices[position] < counts[position] {
                break;
            }
            choices[position] = 0;
            position += 1;
        }
        if position == counts.len() {
            return best;
        }
        let cost = problem.evaluate(&choices);
        if cost < best.0 {
            best = (cost, choices.clone());
        }
    }
}

/// Generate a random problem with integer costs (so that all sums are exact).
///
/// Every pair of nodes is connected with probability `edge_probability` (in a random
/// direction). Edge entries are forbidden with probability `forbidden_probability`.
pub fn random_problem(
    seed: u64,
    node_count: usize,
    max_candidates: usize,
    edge_probability: f64,
    forbidden_probability: f64,
) -> SbpProblem {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut problem = SbpProblem::new();
    for _ in 0..node_count {
        let count = rng.gen_range(1..=max_candidates);
        let cost = (0..count).map(|_| rng.gen_range(0..20) as f64).collect();
        problem.add_node(cost);
    }
    for i in 0..node_count {
        for j in (i + 1)..node_count {
            if !rng.gen_bool(edge_probability) {
                continue;
            }
            let (start, end) = if rng.gen_bool(0.5) { (i, j) } else { (j, i) };
            let rows = problem.nodes[start].cost.len();
            let cols = problem.nodes[end].cost.len();
            let cost = (0..rows)
                .map(|_| {
                    (0..cols)
                        .map(|_| {
                            if rng.gen_bool(forbidden_probability) {
                                FORBIDDEN_COST
                            } else {
                                rng.gen_range(0..30) as f64
                            }
                        })
                        .collect()
                })
                .collect();
            problem.add_edge(start, end, cost);
        }
    }
    problem
}

/// A path `0 -> 1 -> 2` where locally cheap choices are globally expensive.
pub fn path_problem() -> SbpProblem {
    let mut problem = SbpProblem::new();
    let a = problem.add_node(vec![1.0, 3.0]);
    let b = problem.add_node(vec![2.0, 0.0, 5.0]);
    let c = problem.add_node(vec![4.0, 1.0]);
    problem.add_edge(a, b, vec![vec![0.0, 9.0, 1.0], vec![2.0, 0.0, 4.0]]);
    problem.add_edge(b, c, vec![vec![0.0, 8.0], vec![7.0, 3.0], vec![1.0, 0.0]]);
    problem
}

/// A diamond `0 -> {1, 2} -> 3` with two candidates per node.
pub fn diamond_problem() -> SbpProblem {
    let mut problem = SbpProblem::new();
    let top = problem.add_node(vec![1.0, 2.0]);
    let left = problem.add_node(vec![3.0, 1.0]);
    let right = problem.add_node(vec![1.0, 4.0]);
    let bottom = problem.add_node(vec![2.0, 2.0]);
    let same = vec![vec![0.0, 6.0], vec![6.0, 0.0]];
    let skewed = vec![vec![1.0, 5.0], vec![4.0, 2.0]];
    problem.add_edge(top, left, same.clone());
    problem.add_edge(top, right, skewed.clone());
    problem.add_edge(left, bottom, skewed);
    problem.add_edge(right, bottom, same);
    problem
}

/// A complete graph on `node_count` nodes with random integer costs.
pub fn complete_problem(seed: u64, node_count: usize, candidates: usize) -> SbpProblem {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut problem = SbpProblem::new();
    for _ in 0..node_count {
        let cost = (0..candidates).map(|_| rng.gen_range(0..10) as f64).collect();
        problem.add_node(cost);
    }
    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let cost = (0..candidates)
                .map(|_| (0..candidates).map(|_| rng.gen_range(0..10) as f64).collect())
                .collect();
            problem.add_edge(i, j, cost);
        }
    }
    problem
}
