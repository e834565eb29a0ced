use clap::Parser;
use computation_process::{Computable, Stateful};
use env_logger::Builder;
use log::LevelFilter;
use sbp_graph::{InitialAssignment, SbpConfig, SbpOptimization, SbpProblem, SbpState, SearchMode};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sbp_optimize")]
#[command(about = "Select one parallel signature per operator so that the total cost is minimal")]
struct Args {
    /// Path to a JSON problem file (nodes with candidate costs, edges with cost tables)
    #[arg(value_name = "FILE")]
    file: String,

    /// Largest number of candidates a merged node may have
    #[arg(long, default_value_t = 100, require_equals = true)]
    merge_threshold: usize,

    /// Number of nodes optimized together by the neighborhood search
    #[arg(long, default_value_t = 4, require_equals = true)]
    neighborhood: usize,

    /// Local search strategy
    #[arg(long, default_value = "neighborhood", require_equals = true)]
    search: Search,

    /// Start the local search from a random assignment with the given seed
    #[arg(long, require_equals = true)]
    seed: Option<u64>,

    /// Scale down edge costs of concurrently executing layers (ratio in [0, 1])
    #[arg(long, require_equals = true)]
    overlap_ratio: Option<f64>,

    /// Give up after the given number of seconds
    #[arg(long, require_equals = true)]
    timeout: Option<u64>,

    /// Logging verbosity (use -v for info, or -v=LEVEL for specific level)
    #[arg(long, short = 'v', value_name = "LEVEL", num_args = 0..=1, default_missing_value = "info", require_equals = true)]
    verbose: Option<Option<LogLevel>>,
}

#[derive(Clone, clap::ValueEnum)]
enum Search {
    Neighborhood,
    Edge,
    None,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
}

impl From<Search> for SearchMode {
    fn from(value: Search) -> Self {
        match value {
            Search::Neighborhood => SearchMode::Neighborhood,
            Search::Edge => SearchMode::Edge,
            Search::None => SearchMode::Disabled,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
        }
    }
}

fn main() {
    let args = Args::parse();

    // None = flag missing, Some(None) = `-v` without a level.
    let log_level = match args.verbose {
        None => LevelFilter::Off,
        Some(None) => LevelFilter::Info,
        Some(Some(level)) => level.into(),
    };
    Builder::from_default_env().filter_level(log_level).init();

    let json = std::fs::read_to_string(&args.file).unwrap_or_else(|e| {
        eprintln!("Failed to read problem file {}: {}", args.file, e);
        std::process::exit(1);
    });
    let problem: SbpProblem = serde_json::from_str(&json).unwrap_or_else(|e| {
        eprintln!("Failed to parse problem file {}: {}", args.file, e);
        std::process::exit(1);
    });

    println!(
        "Loaded problem with {} nodes and {} edges.",
        problem.nodes.len(),
        problem.edges.len()
    );

    let mut graph = problem.build().unwrap_or_else(|e| {
        eprintln!("Invalid problem: {}", e);
        std::process::exit(1);
    });

    if let Some(ratio) = args.overlap_ratio {
        if let Err(e) = graph.detect_adjust_overlap(ratio) {
            eprintln!("Cannot adjust overlap: {}", e);
            std::process::exit(1);
        }
    }

    let initial_assignment = match args.seed {
        Some(seed) => InitialAssignment::Random(seed),
        None => InitialAssignment::Cheapest,
    };
    let config = SbpConfig::from(SearchMode::from(args.search))
        .with_merge_threshold(args.merge_threshold)
        .with_neighborhood_size(args.neighborhood)
        .with_initial_assignment(initial_assignment);

    let run = || {
        let state = SbpState::from(graph.clone());
        SbpOptimization::configure(config.clone(), state).compute()
    };
    let result = match args.timeout {
        Some(seconds) => cancel_this::on_timeout(Duration::from_secs(seconds), run),
        None => run(),
    };

    let solution = result.unwrap_or_else(|e| {
        eprintln!("Optimization did not finish: {}", e);
        std::process::exit(1);
    });

    for (node, choice) in solution.choices() {
        println!("{}: {}", problem.node_name(node.index()), choice);
    }
    if solution.is_feasible() {
        println!("Total cost: {}", solution.total_cost());
    } else {
        println!("No feasible assignment found (cost {}).", solution.total_cost());
    }
}
