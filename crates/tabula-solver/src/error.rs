use thiserror::Error;

use crate::rational::ArithmeticError;

/// Every way a solve can end without an optimum.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("malformed constraint: {0}")]
    MalformedConstraint(String),
    #[error("no feasible solution")]
    NoFeasibleSolution,
    #[error("the objective is unbounded")]
    UnboundedSolution,
    #[error("iteration limit of {0} exceeded")]
    TooManyIterations(usize),
    #[error("more than {0} consecutive degenerate pivots")]
    DegenerateCycleLimit(usize),
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SolveError {
    /// Fatal errors indicate a defect or misuse rather than a property of the problem.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SolveError::DegenerateCycleLimit(_) | SolveError::InvalidArgument(_)
        )
    }
}
