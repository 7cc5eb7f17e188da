use std::fmt;

use num_traits::{One, Zero};

use crate::basis::Basis;
use crate::error::SolveError;
use crate::problem::{Constraint, Goal, LpProblem, Relation};
use crate::rational::Rational;
use crate::trace::TableauSnapshot;

/// Column holding the right-hand side of every row.
pub const RHS: usize = 0;

/// Column of the phase 1 artificial variable `L`.
pub const ARTIFICIAL: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    One,
    Two,
}

/// What a tableau column stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnLabel {
    Rhs,
    Artificial,
    Decision(usize),
    Slack(usize),
    /// Slack of the k-th cutting plane, counted from 1
    Cut(usize),
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnLabel::Rhs => write!(f, "RHS"),
            ColumnLabel::Artificial => write!(f, "L"),
            ColumnLabel::Decision(i) => write!(f, "x{i}"),
            ColumnLabel::Slack(i) => write!(f, "y{i}"),
            ColumnLabel::Cut(k) => write!(f, "i{k}"),
        }
    }
}

/// Dictionary-form simplex tableau over exact rationals.
///
/// Column 0 is the right-hand side, followed during phase 1 by the
/// artificial column `L`, then one column per decision variable, one per
/// normalized constraint's slack, and one per cutting plane. Row 0 is the
/// objective row; the tableau is optimal once every row 0 entry past the
/// right-hand side is non-positive.
#[derive(Debug, Clone)]
pub struct Tableau {
    matrix: Vec<Vec<Rational>>,
    labels: Vec<ColumnLabel>,
    basis: Basis,
    phase: Phase,
    phase_one_ran: bool,
    /// Objective coefficients of the internal maximization
    costs: Vec<Rational>,
    /// Objective constant of the internal maximization
    constant: Rational,
    goal: Goal,
    slack_count: usize,
    cut_count: usize,
}

impl Tableau {
    /// Builds the phase 1 layout for `problem`.
    pub fn new(problem: &LpProblem) -> Result<Self, SolveError> {
        if !problem.non_negative {
            return Err(SolveError::Unsupported(
                "variables without a non-negativity restriction".to_string(),
            ));
        }
        let n = problem.num_variables();
        let rows = problem.normalized_constraints();
        let m = rows.len();
        let width = 2 + n + m;

        let (costs, constant) = match problem.goal {
            Goal::Maximize => (
                problem.objective.coefficients.clone(),
                problem.objective.constant.clone(),
            ),
            Goal::Minimize => (
                problem.objective.coefficients.iter().map(|c| -c).collect(),
                -&problem.objective.constant,
            ),
        };

        let mut objective = vec![Rational::zero(); width];
        objective[ARTIFICIAL] = -Rational::one();
        let mut matrix = Vec::with_capacity(m + 1);
        matrix.push(objective);

        for (i, row) in rows.iter().enumerate() {
            if row.coefficients.len() != n {
                return Err(SolveError::MalformedConstraint(format!(
                    "constraint has {} coefficients but the objective has {n}",
                    row.coefficients.len()
                )));
            }
            let mut values = Vec::with_capacity(width);
            values.push(row.rhs.clone());
            values.push(-Rational::one());
            values.extend(row.coefficients.iter().cloned());
            values.resize(width, Rational::zero());
            values[2 + n + i] = Rational::one();
            matrix.push(values);
        }

        let mut labels = vec![ColumnLabel::Rhs, ColumnLabel::Artificial];
        labels.extend((0..n).map(ColumnLabel::Decision));
        labels.extend((0..m).map(ColumnLabel::Slack));

        let basis = Basis::new((0..m).map(|i| 2 + n + i).collect(), width)?;

        Ok(Self {
            matrix,
            labels,
            basis,
            phase: Phase::One,
            phase_one_ran: false,
            costs,
            constant,
            goal: problem.goal,
            slack_count: m,
            cut_count: 0,
        })
    }

    /// Number of rows, objective row included.
    pub fn height(&self) -> usize {
        self.matrix.len()
    }

    pub fn width(&self) -> usize {
        self.labels.len()
    }

    pub fn rows(&self) -> &[Vec<Rational>] {
        &self.matrix
    }

    pub fn objective_row(&self) -> &[Rational] {
        &self.matrix[0]
    }

    pub fn rhs(&self, row: usize) -> &Rational {
        &self.matrix[row][RHS]
    }

    pub fn labels(&self) -> &[ColumnLabel] {
        &self.labels
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn num_variables(&self) -> usize {
        self.costs.len()
    }

    /// First column eligible to enter the basis.
    pub fn col_offset(&self) -> usize {
        match self.phase {
            Phase::One => 2,
            Phase::Two => 1,
        }
    }

    pub fn decision_column(&self, variable: usize) -> usize {
        self.col_offset() + variable
    }

    pub fn needs_phase_one(&self) -> bool {
        self.matrix[1..].iter().any(|row| row[RHS].is_negative())
    }

    /// Constraint row with the most negative right-hand side, lowest row on ties.
    pub fn most_negative_rhs_row(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for row in 1..self.height() {
            let rhs = self.rhs(row);
            if rhs.is_negative() && best.is_none_or(|b| rhs < self.rhs(b)) {
                best = Some(row);
            }
        }
        best
    }

    pub fn is_optimal(&self) -> bool {
        self.matrix[0][1..].iter().all(|v| !v.is_positive())
    }

    /// Replaces the basic variable of `row` with the variable of `col`.
    pub fn pivot(&mut self, col: usize, row: usize) -> Result<(), SolveError> {
        if row == 0 || row >= self.height() || col == RHS || col >= self.width() {
            return Err(SolveError::InvalidArgument(format!(
                "pivot position ({row}, {col}) is outside the constraint area"
            )));
        }
        let scale = self.matrix[row][col].recip()?;
        self.basis.replace(row, col)?;
        if self.phase == Phase::One {
            self.phase_one_ran = true;
        }

        for value in &mut self.matrix[row] {
            if !value.is_zero() {
                *value = &*value * &scale;
            }
        }
        let pivot_row = self.matrix[row].clone();
        for (i, values) in self.matrix.iter_mut().enumerate() {
            if i == row || values[col].is_zero() {
                continue;
            }
            let factor = values[col].clone();
            for (value, p) in values.iter_mut().zip(&pivot_row) {
                if !p.is_zero() {
                    *value = &*value - &factor * p;
                }
            }
        }
        Ok(())
    }

    /// Position `(col, row)` of a degenerate pivot that moves a zero-valued
    /// artificial variable out of the basis at the end of phase 1.
    pub fn artificial_exit(&self) -> Option<(usize, usize)> {
        if self.phase != Phase::One {
            return None;
        }
        let row = self.basis.row_of(ARTIFICIAL)?;
        if !self.rhs(row).is_zero() {
            return None;
        }
        let col = (2..self.width()).find(|&c| !self.matrix[row][c].is_zero())?;
        Some((col, row))
    }

    /// Drops the artificial column and installs the real objective.
    pub fn enter_phase_two(&mut self) -> Result<(), SolveError> {
        if self.phase == Phase::Two {
            return Err(SolveError::InvalidArgument(
                "tableau is already in phase two".to_string(),
            ));
        }
        if self.basis.is_basic(ARTIFICIAL) {
            return Err(SolveError::NoFeasibleSolution);
        }
        self.basis.drop_column(ARTIFICIAL)?;
        self.rebuild(|row| {
            row.into_iter()
                .enumerate()
                .filter(|&(col, _)| col != ARTIFICIAL)
                .map(|(_, value)| value)
                .collect()
        });
        self.labels.remove(ARTIFICIAL);
        self.phase = Phase::Two;

        self.matrix[0] = if self.phase_one_ran {
            self.reduced_objective_row()
        } else {
            self.initial_objective_row()
        };
        Ok(())
    }

    fn cost(&self, col: usize) -> Rational {
        match self.labels[col] {
            ColumnLabel::Decision(j) => self.costs[j].clone(),
            _ => Rational::zero(),
        }
    }

    fn initial_objective_row(&self) -> Vec<Rational> {
        (0..self.width())
            .map(|col| if col == RHS { -&self.constant } else { self.cost(col) })
            .collect()
    }

    /// Objective row with every basic variable substituted out.
    fn reduced_objective_row(&self) -> Vec<Rational> {
        let mut objective = self.initial_objective_row();
        for (row, values) in self.matrix.iter().enumerate().skip(1) {
            let Some(basic) = self.basis.column_of(row) else {
                continue;
            };
            let cost = self.cost(basic);
            if cost.is_zero() {
                continue;
            }
            for (target, value) in objective.iter_mut().zip(values) {
                if !value.is_zero() {
                    *target = &*target - &cost * value;
                }
            }
        }
        objective
    }

    /// Adds a constraint over the decision variables to an optimal phase 2
    /// tableau and restores feasibility with a dual pivot when it is violated.
    pub fn add_constraint(&mut self, constraint: &Constraint) -> Result<(), SolveError> {
        if constraint.coefficients.len() != self.num_variables() {
            return Err(SolveError::MalformedConstraint(format!(
                "constraint has {} coefficients but the tableau has {} variables",
                constraint.coefficients.len(),
                self.num_variables()
            )));
        }
        for normalized in constraint.normalized() {
            self.ensure_extendable()?;
            let mut values = vec![Rational::zero(); self.width() + 1];
            values[RHS] = normalized.rhs.clone();
            for (j, coefficient) in normalized.coefficients.iter().enumerate() {
                values[self.decision_column(j)] = coefficient.clone();
            }
            values[self.width()] = Rational::one();

            // Rewrite in terms of the current nonbasic variables.
            for j in 0..self.num_variables() {
                let col = self.decision_column(j);
                let Some(row) = self.basis.row_of(col) else {
                    continue;
                };
                let factor = values[col].clone();
                if factor.is_zero() {
                    continue;
                }
                for (target, value) in values.iter_mut().zip(&self.matrix[row]) {
                    if !value.is_zero() {
                        *target = &*target - &factor * value;
                    }
                }
            }

            let label = ColumnLabel::Slack(self.slack_count);
            self.slack_count += 1;
            let row = self.append_row(values, label)?;
            self.restore_row(row)?;
        }
        Ok(())
    }

    /// Adds a `<=` constraint already written over the current columns.
    ///
    /// The coefficients cover columns `1..width` plus the new slack column,
    /// whose coefficient must be one.
    pub fn add_preformatted_constraint(&mut self, constraint: &Constraint) -> Result<(), SolveError> {
        self.ensure_extendable()?;
        if constraint.relation != Relation::Le {
            return Err(SolveError::MalformedConstraint(
                "pre-formatted constraints must be <= rows".to_string(),
            ));
        }
        if constraint.coefficients.len() != self.width() {
            return Err(SolveError::MalformedConstraint(format!(
                "pre-formatted constraint has {} coefficients, expected {}",
                constraint.coefficients.len(),
                self.width()
            )));
        }
        if !constraint.coefficients.last().is_some_and(|c| c.is_one()) {
            return Err(SolveError::MalformedConstraint(
                "last coefficient of a pre-formatted constraint must be 1".to_string(),
            ));
        }

        let mut values = Vec::with_capacity(self.width() + 1);
        values.push(constraint.rhs.clone());
        values.extend(constraint.coefficients.iter().cloned());

        self.cut_count += 1;
        let row = self.append_row(values, ColumnLabel::Cut(self.cut_count))?;
        self.restore_row(row)
    }

    fn ensure_extendable(&self) -> Result<(), SolveError> {
        if self.phase != Phase::Two {
            return Err(SolveError::InvalidArgument(
                "constraints can only be added in phase two".to_string(),
            ));
        }
        if !self.is_optimal() {
            return Err(SolveError::InvalidArgument(
                "constraints can only be added to an optimal tableau".to_string(),
            ));
        }
        Ok(())
    }

    fn append_row(&mut self, values: Vec<Rational>, label: ColumnLabel) -> Result<usize, SolveError> {
        let col = self.width();
        self.rebuild(|row| row.into_iter().chain(std::iter::once(Rational::zero())).collect());
        self.matrix.push(values);
        self.labels.push(label);
        self.basis.push(col)?;
        Ok(self.height() - 1)
    }

    /// Replaces the matrix with one built row by row from the current one.
    /// Every change of shape goes through here.
    fn rebuild(&mut self, reshape: impl Fn(Vec<Rational>) -> Vec<Rational>) {
        let matrix = std::mem::take(&mut self.matrix);
        self.matrix = matrix.into_iter().map(reshape).collect();
    }

    /// One dual pivot on `row` if its right-hand side is negative.
    fn restore_row(&mut self, row: usize) -> Result<(), SolveError> {
        if !self.rhs(row).is_negative() {
            return Ok(());
        }
        let col = self
            .dual_entering_column(row)
            .ok_or(SolveError::UnboundedSolution)?;
        self.pivot(col, row)
    }

    /// Entering column for a dual pivot on `row`.
    ///
    /// Takes the nonbasic column with a negative entry in `row` minimizing
    /// `objective / entry` (a non-negative ratio), stopping early at zero.
    /// The ratio numerator is read from the objective row.
    pub fn dual_entering_column(&self, row: usize) -> Option<usize> {
        let mut best: Option<(usize, Rational)> = None;
        for col in self.col_offset()..self.width() {
            if self.basis.is_basic(col) {
                continue;
            }
            let entry = &self.matrix[row][col];
            if !entry.is_negative() {
                continue;
            }
            let Ok(ratio) = self.matrix[0][col].checked_div(entry) else {
                continue;
            };
            if ratio.is_negative() {
                continue;
            }
            let done = ratio.is_zero();
            if best.as_ref().is_none_or(|(_, b)| ratio < *b) {
                best = Some((col, ratio));
            }
            if done {
                break;
            }
        }
        best.map(|(col, _)| col)
    }

    /// Row of a basic decision or slack variable with the largest fractional
    /// value, lowest row on ties. `None` once all of them are integral.
    pub fn gomory_row(&self) -> Option<usize> {
        let mut best: Option<(usize, Rational)> = None;
        for row in 1..self.height() {
            let Some(col) = self.basis.column_of(row) else {
                continue;
            };
            if !matches!(self.labels[col], ColumnLabel::Decision(_) | ColumnLabel::Slack(_)) {
                continue;
            }
            let fraction = self.rhs(row).fract();
            if fraction.is_zero() {
                continue;
            }
            if best.as_ref().is_none_or(|(_, b)| fraction > *b) {
                best = Some((row, fraction));
            }
        }
        best.map(|(row, _)| row)
    }

    /// Gomory fractional cut derived from `row`, pre-formatted for
    /// [`Tableau::add_preformatted_constraint`].
    pub fn gomory_cut(&self, row: usize) -> Constraint {
        let mut coefficients: Vec<Rational> = (1..self.width())
            .map(|col| {
                if self.basis.is_basic(col) {
                    Rational::zero()
                } else {
                    -self.matrix[row][col].fract()
                }
            })
            .collect();
        coefficients.push(Rational::one());
        Constraint::le(coefficients, -self.rhs(row).fract())
    }

    /// Values of the decision variables at the current basic solution.
    pub fn point(&self) -> Vec<Rational> {
        (0..self.num_variables())
            .map(|j| {
                self.basis
                    .row_of(self.decision_column(j))
                    .map(|row| self.rhs(row).clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Objective value at the current basic solution, constant included.
    pub fn objective_value(&self) -> Rational {
        match self.goal {
            Goal::Maximize => -self.rhs(0),
            Goal::Minimize => self.rhs(0).clone(),
        }
    }

    pub fn snapshot(&self) -> TableauSnapshot {
        TableauSnapshot {
            matrix: self.matrix.clone(),
            labels: self.labels.iter().map(ToString::to_string).collect(),
            basic_columns: self.basis.columns().to_vec(),
        }
    }
}
