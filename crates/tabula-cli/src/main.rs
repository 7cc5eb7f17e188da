use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tabula_solver::{IntegerMethod, PivotRule, Solution, SolveError, SolveRequest, Solver, Step};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Exact rational simplex solver", long_about = None)]
struct Cli {
    /// Log solver progress (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a JSON problem file and output the optimum
    Solve {
        /// The problem file
        file: PathBuf,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Show every tableau of the solve
        #[arg(short, long)]
        steps: bool,
        /// Override the pivot rule of the file
        #[arg(long, value_enum)]
        pivot_rule: Option<RuleArg>,
        /// Override the integer method of the file
        #[arg(long, value_enum)]
        integer: Option<IntegerArg>,
        /// Override the iteration limit of the file
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Seed for the random pivot rule
        #[arg(long)]
        seed: Option<u64>,
        /// Consecutive degenerate pivots tolerated
        #[arg(long, default_value_t = 100)]
        degenerate_limit: usize,
    },
    /// Check a problem file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RuleArg {
    Dantzig,
    Bland,
    Random,
    Greedy,
}

impl From<RuleArg> for PivotRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Dantzig => PivotRule::Dantzig,
            RuleArg::Bland => PivotRule::Bland,
            RuleArg::Random => PivotRule::Random,
            RuleArg::Greedy => PivotRule::Greedy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum IntegerArg {
    None,
    Gomory,
    BranchAndBound,
    BranchAndCut,
}

impl From<IntegerArg> for IntegerMethod {
    fn from(method: IntegerArg) -> Self {
        match method {
            IntegerArg::None => IntegerMethod::None,
            IntegerArg::Gomory => IntegerMethod::Gomory,
            IntegerArg::BranchAndBound => IntegerMethod::BranchAndBound,
            IntegerArg::BranchAndCut => IntegerMethod::BranchAndCut,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            file,
            format,
            steps,
            pivot_rule,
            integer,
            max_iterations,
            seed,
            degenerate_limit,
        } => {
            let mut request = match read_request(&file) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };
            if let Some(rule) = pivot_rule {
                request.pivot_rule = rule.into();
            }
            if let Some(method) = integer {
                request.integer_method = method.into();
            }
            if let Some(max) = max_iterations {
                request.max_iterations = max;
            }
            log::debug!(
                "loaded {} with {} variables and {} constraints",
                file.display(),
                request.objective.len(),
                request.constraints.len()
            );

            let mut solver = Solver::new().with_degenerate_limit(degenerate_limit);
            if let Some(seed) = seed {
                solver = solver.with_seed(seed);
            }

            let mut trace: Vec<Step> = Vec::new();
            let result = solver.solve_request(&request, &mut trace);

            if format == "json" {
                let output = render_json(&result, steps.then_some(trace.as_slice()));
                println!("{}", serde_json::to_string_pretty(&output).unwrap_or_else(|e| {
                    format!("Error serializing output: {}", e)
                }));
            } else {
                print!("{}", render_pretty(&result, steps.then_some(trace.as_slice())));
            }

            if result.is_err() {
                std::process::exit(1);
            }
        }
        Commands::Check { file } => {
            let request = match read_request(&file) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };

            match request.to_problem() {
                Ok(problem) => {
                    println!("OK: {} variables, {} constraints", problem.num_variables(), problem.num_constraints());
                    println!("  goal:           {:?}", problem.goal);
                    println!("  pivot rule:     {:?}", problem.pivot_rule);
                    println!("  integer method: {:?}", problem.integer_method);
                    println!("  max iterations: {}", problem.max_iterations);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn read_request(path: &Path) -> Result<SolveRequest, String> {
    let source = std::fs::read_to_string(path).map_err(|e| format!("Error reading file: {}", e))?;
    parse_request(&source)
}

fn parse_request(source: &str) -> Result<SolveRequest, String> {
    serde_json::from_str(source).map_err(|e| format!("Invalid problem file: {}", e))
}

fn status_name(result: &Result<Solution, SolveError>) -> &'static str {
    match result {
        Ok(_) => "optimal",
        Err(SolveError::NoFeasibleSolution) => "infeasible",
        Err(SolveError::UnboundedSolution) => "unbounded",
        Err(SolveError::TooManyIterations(_)) => "iteration_limit",
        Err(SolveError::DegenerateCycleLimit(_)) => "degenerate_cycle",
        Err(SolveError::MalformedConstraint(_)) => "malformed",
        Err(SolveError::Arithmetic(_)) => "arithmetic_error",
        Err(SolveError::Unsupported(_)) => "unsupported",
        Err(SolveError::InvalidArgument(_)) => "invalid_argument",
    }
}

fn render_json(result: &Result<Solution, SolveError>, steps: Option<&[Step]>) -> serde_json::Value {
    let error = result.as_ref().err().map(ToString::to_string);
    let integral = result.as_ref().ok().map(Solution::is_integral);
    serde_json::json!({
        "status": status_name(result),
        "error": error,
        "solution": result.as_ref().ok(),
        "integral": integral,
        "steps": steps,
    })
}

fn render_pretty(result: &Result<Solution, SolveError>, steps: Option<&[Step]>) -> String {
    let mut out = String::new();

    if let Some(steps) = steps {
        for (i, step) in steps.iter().enumerate() {
            let phase = if step.phase_one { "phase 1" } else { "phase 2" };
            let action = match (step.entering, step.leaving) {
                (None, None) => "start".to_string(),
                (Some(col), Some(row)) => format!("pivot column {} into row {}", col, row),
                (Some(col), None) => format!("column {} has no leaving row", col),
                (None, Some(row)) => format!("cut from row {}", row),
            };
            let _ = writeln!(out, "Step {} ({}): {}", i, phase, action);
            let _ = writeln!(out, "{}", step.tableau);
        }
    }

    match result {
        Ok(solution) => {
            let _ = writeln!(out, "Status: OPTIMAL");
            let _ = writeln!(out, "Value: {} ({:.4})", solution.value, solution.value.to_f64());
            let _ = writeln!(out, "Iterations: {}", solution.iterations);
            let _ = writeln!(out);
            let _ = writeln!(out, "Point:");
            for (i, (value, approx)) in solution.point.iter().zip(solution.point_f64()).enumerate() {
                let _ = writeln!(out, "  x{:<4} {:>12} ({:.4})", i, value.to_string(), approx);
            }
        }
        Err(SolveError::NoFeasibleSolution) => {
            let _ = writeln!(out, "Status: INFEASIBLE");
            let _ = writeln!(out, "No point satisfies all constraints.");
        }
        Err(SolveError::UnboundedSolution) => {
            let _ = writeln!(out, "Status: UNBOUNDED");
            let _ = writeln!(out, "The problem has no finite optimal solution.");
        }
        Err(e) => {
            let _ = writeln!(out, "Status: ERROR");
            let _ = writeln!(out, "{}", e);
        }
    }
    out
}
