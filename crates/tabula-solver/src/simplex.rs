use std::cmp::Ordering;

use log::{debug, info, trace, warn};
use num_traits::Zero;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SolveError;
use crate::problem::{IntegerMethod, LpProblem, PivotRule};
use crate::rational::Rational;
use crate::request::SolveRequest;
use crate::solution::Solution;
use crate::tableau::{ARTIFICIAL, RHS, Tableau};
use crate::trace::StepSink;

/// Default bound on consecutive degenerate pivots.
pub const DEFAULT_DEGENERATE_LIMIT: usize = 100;

/// Where a solve currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initialized,
    PhaseOne,
    PhaseTwo,
    IntegerCutting,
}

/// Two-phase tableau simplex solver over exact rationals
#[derive(Debug, Clone)]
pub struct Solver {
    /// Consecutive tied minimum-ratio pivots tolerated before giving up
    degenerate_limit: usize,
    /// Seed for the random pivot rule; drawn fresh per solve when unset
    seed: Option<u64>,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            degenerate_limit: DEFAULT_DEGENERATE_LIMIT,
            seed: None,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_degenerate_limit(mut self, limit: usize) -> Self {
        self.degenerate_limit = limit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Solve the problem without recording steps
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        self.solve_traced(problem, &mut ())
    }

    /// Converts a floating point request and solves it.
    pub fn solve_request<S: StepSink>(
        &self,
        request: &SolveRequest,
        sink: &mut S,
    ) -> Result<Solution, SolveError> {
        let problem = request.to_problem()?;
        self.solve_traced(&problem, sink)
    }

    /// Solve the problem, reporting every pivot, phase start, and cut to `sink`
    pub fn solve_traced<S: StepSink>(
        &self,
        problem: &LpProblem,
        sink: &mut S,
    ) -> Result<Solution, SolveError> {
        if problem.max_iterations == 0 {
            return Err(SolveError::InvalidArgument(
                "max_iterations must be positive".to_string(),
            ));
        }
        if let method @ (IntegerMethod::BranchAndBound | IntegerMethod::BranchAndCut) =
            problem.integer_method
        {
            return Err(SolveError::Unsupported(format!("integer method {method:?}")));
        }
        if problem.pivot_rule == PivotRule::Greedy {
            warn!("greedy pivot rule is not implemented, using Dantzig's rule");
        }

        let seed = self.seed.unwrap_or_else(rand::random);
        let mut run = Run {
            problem,
            tableau: Tableau::new(problem)?,
            sink,
            rng: StdRng::seed_from_u64(seed),
            stage: Stage::Initialized,
            iterations: 0,
            degenerate_streak: 0,
            degenerate_limit: self.degenerate_limit,
        };

        match run.execute() {
            Ok(()) => {
                let solution = Solution {
                    point: run.tableau.point(),
                    value: run.tableau.objective_value(),
                    iterations: run.iterations,
                };
                info!(
                    "optimum {} after {} iterations",
                    solution.value, solution.iterations
                );
                Ok(solution)
            }
            Err(err) => {
                info!(
                    "solve stopped in {:?} after {} iterations: {err}",
                    run.stage, run.iterations
                );
                Err(err)
            }
        }
    }
}

/// State of a single solve.
struct Run<'a, S> {
    problem: &'a LpProblem,
    tableau: Tableau,
    sink: &'a mut S,
    rng: StdRng,
    stage: Stage,
    iterations: usize,
    degenerate_streak: usize,
    degenerate_limit: usize,
}

impl<S: StepSink> Run<'_, S> {
    fn execute(&mut self) -> Result<(), SolveError> {
        if self.tableau.needs_phase_one() {
            self.enter(Stage::PhaseOne);
            self.sink.record(None, None, &self.tableau);
            self.phase_one()?;
        }

        self.tick()?;
        self.tableau.enter_phase_two()?;
        self.enter(Stage::PhaseTwo);
        self.sink.record(None, None, &self.tableau);
        self.optimize()?;

        if self.problem.integer_method == IntegerMethod::Gomory {
            self.enter(Stage::IntegerCutting);
            self.cut()?;
        }
        Ok(())
    }

    fn enter(&mut self, stage: Stage) {
        debug!(
            "{:?} -> {:?} after {} iterations",
            self.stage, stage, self.iterations
        );
        self.stage = stage;
    }

    fn tick(&mut self) -> Result<(), SolveError> {
        self.iterations += 1;
        if self.iterations > self.problem.max_iterations {
            return Err(SolveError::TooManyIterations(self.problem.max_iterations));
        }
        Ok(())
    }

    fn phase_one(&mut self) -> Result<(), SolveError> {
        let row = self.tableau.most_negative_rhs_row().ok_or_else(|| {
            SolveError::InvalidArgument("phase one started on a feasible tableau".to_string())
        })?;
        self.pivot(ARTIFICIAL, row)?;
        self.optimize()?;

        if let Some((col, row)) = self.tableau.artificial_exit() {
            debug!("moving zero-valued artificial variable out of row {row}");
            self.pivot(col, row)?;
        }
        Ok(())
    }

    fn pivot(&mut self, col: usize, row: usize) -> Result<(), SolveError> {
        self.tick()?;
        trace!("pivot: column {col} enters, row {row} leaves");
        self.tableau.pivot(col, row)?;
        self.sink.record(Some(col), Some(row), &self.tableau);
        Ok(())
    }

    /// Primal pivots until no column improves the objective.
    fn optimize(&mut self) -> Result<(), SolveError> {
        while let Some(col) = self.entering_column() {
            self.primal_step(col)?;
        }
        Ok(())
    }

    fn primal_step(&mut self, col: usize) -> Result<(), SolveError> {
        match self.leaving_row(col)? {
            Some(row) => self.pivot(col, row),
            None => {
                self.sink.record(Some(col), None, &self.tableau);
                Err(SolveError::UnboundedSolution)
            }
        }
    }

    fn entering_column(&mut self) -> Option<usize> {
        let offset = self.tableau.col_offset();
        let objective = self.tableau.objective_row();
        match self.problem.pivot_rule {
            PivotRule::Dantzig | PivotRule::Greedy => {
                let mut best: Option<usize> = None;
                for col in offset..objective.len() {
                    if objective[col].is_positive()
                        && best.is_none_or(|b| objective[col] > objective[b])
                    {
                        best = Some(col);
                    }
                }
                best
            }
            PivotRule::Bland => {
                let mut best: Option<usize> = None;
                for col in offset..objective.len() {
                    if objective[col].is_positive()
                        && best.is_none_or(|b| objective[col] > objective[b])
                    {
                        best = Some(col);
                        if admits_leaving_row(&self.tableau, col) {
                            break;
                        }
                    }
                }
                best
            }
            PivotRule::Random => {
                let candidates: Vec<usize> = (offset..objective.len())
                    .filter(|&col| objective[col].is_positive())
                    .collect();
                if candidates.is_empty() {
                    None
                } else {
                    Some(candidates[self.rng.random_range(0..candidates.len())])
                }
            }
        }
    }

    /// Minimum-ratio test; the first of several tied rows wins.
    fn leaving_row(&mut self, col: usize) -> Result<Option<usize>, SolveError> {
        let mut best: Option<Rational> = None;
        let mut ties: Vec<usize> = Vec::new();
        for row in 1..self.tableau.height() {
            let Some(ratio) = ratio(&self.tableau, row, col) else {
                continue;
            };
            match best.as_ref().map(|b| ratio.cmp(b)) {
                None | Some(Ordering::Less) => {
                    best = Some(ratio);
                    ties.clear();
                    ties.push(row);
                }
                Some(Ordering::Equal) => ties.push(row),
                Some(Ordering::Greater) => {}
            }
        }

        if ties.len() > 1 {
            self.degenerate_streak += 1;
            warn!(
                "degenerate vertex: rows {ties:?} tie on column {col} ({} in a row)",
                self.degenerate_streak
            );
            if self.degenerate_streak > self.degenerate_limit {
                return Err(SolveError::DegenerateCycleLimit(self.degenerate_limit));
            }
        } else {
            self.degenerate_streak = 0;
        }
        Ok(ties.first().copied())
    }

    /// Adds Gomory cuts until the basic solution is integral.
    fn cut(&mut self) -> Result<(), SolveError> {
        while let Some(row) = self.tableau.gomory_row() {
            self.tick()?;
            let cut = self.tableau.gomory_cut(row);
            trace!("gomory cut from row {row} with right-hand side {}", cut.rhs);
            self.tableau.add_preformatted_constraint(&cut)?;
            self.sink.record(None, Some(row), &self.tableau);
            self.reoptimize()?;
        }
        debug!("integral solution after {} iterations", self.iterations);
        Ok(())
    }

    /// Dual pivots while a row is infeasible, primal pivots while a column improves.
    fn reoptimize(&mut self) -> Result<(), SolveError> {
        loop {
            if let Some(row) = self.tableau.most_negative_rhs_row() {
                let Some(col) = self.tableau.dual_entering_column(row) else {
                    self.sink.record(None, Some(row), &self.tableau);
                    return Err(SolveError::NoFeasibleSolution);
                };
                self.pivot(col, row)?;
            } else if let Some(col) = self.entering_column() {
                self.primal_step(col)?;
            } else {
                return Ok(());
            }
        }
    }
}

/// `rhs / entry` for a row eligible in the minimum-ratio test.
fn ratio(tableau: &Tableau, row: usize, col: usize) -> Option<Rational> {
    let values = &tableau.rows()[row];
    let entry = &values[col];
    let rhs = &values[RHS];
    if entry.is_zero() || (rhs.is_zero() && entry.is_negative()) {
        return None;
    }
    let ratio = rhs.checked_div(entry).ok()?;
    (!ratio.is_negative()).then_some(ratio)
}

fn admits_leaving_row(tableau: &Tableau, col: usize) -> bool {
    (1..tableau.height()).any(|row| ratio(tableau, row, col).is_some())
}
