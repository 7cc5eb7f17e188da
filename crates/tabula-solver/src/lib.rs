//! Exact rational tableau simplex solver.
//!
//! Solves linear programs with the two-phase simplex method over arbitrary
//! precision fractions, optionally tightening the optimum to an integral one
//! with Gomory fractional cuts, and reports every pivot through a [`StepSink`].

mod basis;
mod error;
mod problem;
mod rational;
mod request;
mod simplex;
mod solution;
mod tableau;
mod trace;

pub use basis::Basis;
pub use error::SolveError;
pub use problem::{Constraint, Goal, IntegerMethod, LpProblem, Objective, PivotRule, Relation};
pub use rational::{ArithmeticError, Rational};
pub use request::{ConstraintRow, SolveRequest};
pub use simplex::{Solver, Stage};
pub use solution::Solution;
pub use tableau::{ColumnLabel, Phase, Tableau};
pub use trace::{Step, StepSink, TableauSnapshot};
