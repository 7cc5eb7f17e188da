use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SolveError;
use crate::rational::Rational;

/// Default bound on pivots and cuts for a single solve.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Optimization direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum Goal {
    #[default]
    Maximize,
    Minimize,
}

/// Comparison between a constraint's left-hand side and its constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum Relation {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

/// How integrality of the decision variables is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum IntegerMethod {
    /// Solve the linear relaxation only
    #[default]
    None,
    /// Gomory fractional cutting planes
    Gomory,
    BranchAndBound,
    BranchAndCut,
}

/// Entering column selection rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum PivotRule {
    /// Largest positive objective-row entry
    #[default]
    Dantzig,
    /// First improving column that admits a valid leaving row
    Bland,
    /// Uniformly random improving column
    Random,
    /// Currently behaves exactly like Dantzig
    Greedy,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Objective {
    /// Coefficient for each decision variable
    pub coefficients: Vec<Rational>,
    /// Constant term added to the objective value
    pub constant: Rational,
}

/// A linear constraint `coefficients · x (relation) rhs`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Constraint {
    pub coefficients: Vec<Rational>,
    pub relation: Relation,
    pub rhs: Rational,
}

impl Constraint {
    pub fn new(coefficients: Vec<Rational>, relation: Relation, rhs: Rational) -> Self {
        Self {
            coefficients,
            relation,
            rhs,
        }
    }

    pub fn le(coefficients: Vec<Rational>, rhs: Rational) -> Self {
        Self::new(coefficients, Relation::Le, rhs)
    }

    /// Rewrites the constraint as one or two `<=` constraints.
    ///
    /// `a >= b` becomes `-a <= -b`; `a = b` becomes `a <= b` followed by `-a <= -b`.
    pub fn normalized(&self) -> Vec<Constraint> {
        let as_le = Constraint::le(self.coefficients.clone(), self.rhs.clone());
        match self.relation {
            Relation::Le => vec![as_le],
            Relation::Ge => vec![as_le.negated()],
            Relation::Eq => {
                let flipped = as_le.negated();
                vec![as_le, flipped]
            }
        }
    }

    fn negated(&self) -> Constraint {
        Constraint {
            coefficients: self.coefficients.iter().map(|c| -c).collect(),
            relation: self.relation,
            rhs: -&self.rhs,
        }
    }
}

/// A linear program over exact rationals together with its solve options.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LpProblem {
    pub objective: Objective,
    constraints: Vec<Constraint>,
    pub goal: Goal,
    /// Every decision variable is restricted to be >= 0
    pub non_negative: bool,
    pub integer_method: IntegerMethod,
    pub pivot_rule: PivotRule,
    pub max_iterations: usize,
}

impl LpProblem {
    /// Creates a maximization problem with no constraints.
    pub fn new(objective: Vec<Rational>) -> Self {
        Self {
            objective: Objective {
                coefficients: objective,
                constant: Rational::default(),
            },
            constraints: Vec::new(),
            goal: Goal::default(),
            non_negative: true,
            integer_method: IntegerMethod::default(),
            pivot_rule: PivotRule::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_constant(mut self, constant: Rational) -> Self {
        self.objective.constant = constant;
        self
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = goal;
        self
    }

    pub fn with_non_negative(mut self, non_negative: bool) -> Self {
        self.non_negative = non_negative;
        self
    }

    pub fn with_integer_method(mut self, method: IntegerMethod) -> Self {
        self.integer_method = method;
        self
    }

    pub fn with_pivot_rule(mut self, rule: PivotRule) -> Self {
        self.pivot_rule = rule;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Adds a constraint; its width must match the objective.
    pub fn add_constraint(
        &mut self,
        coefficients: Vec<Rational>,
        relation: Relation,
        rhs: Rational,
    ) -> Result<(), SolveError> {
        if coefficients.len() != self.num_variables() {
            return Err(SolveError::MalformedConstraint(format!(
                "constraint {} has {} coefficients but the objective has {}",
                self.constraints.len(),
                coefficients.len(),
                self.num_variables()
            )));
        }
        self.constraints.push(Constraint::new(coefficients, relation, rhs));
        Ok(())
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.objective.coefficients.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// All constraints as `<=` rows, duplicates removed, first occurrence kept.
    pub fn normalized_constraints(&self) -> Vec<Constraint> {
        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        for constraint in &self.constraints {
            for row in constraint.normalized() {
                if seen.insert(row.clone()) {
                    rows.push(row);
                }
            }
        }
        rows
    }
}

#[cfg(test)]
pub(crate) fn ints(values: &[i64]) -> Vec<Rational> {
    values.iter().map(|&v| Rational::from(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_constraint_checks_width() {
        let mut problem = LpProblem::new(ints(&[1, 2]));
        assert!(problem.add_constraint(ints(&[1, 1]), Relation::Le, 4.into()).is_ok());
        let err = problem
            .add_constraint(ints(&[1, 1, 1]), Relation::Le, 4.into())
            .unwrap_err();
        assert!(matches!(err, SolveError::MalformedConstraint(_)));
        assert_eq!(problem.num_constraints(), 1);
    }

    #[test]
    fn test_defaults() {
        let problem = LpProblem::new(ints(&[1]));
        assert_eq!(problem.goal, Goal::Maximize);
        assert!(problem.non_negative);
        assert_eq!(problem.integer_method, IntegerMethod::None);
        assert_eq!(problem.pivot_rule, PivotRule::Dantzig);
        assert_eq!(problem.max_iterations, 10_000);
    }

    #[test]
    fn test_normalize_relations() {
        let ge = Constraint::new(ints(&[1, -2]), Relation::Ge, 3.into());
        assert_eq!(ge.normalized(), vec![Constraint::le(ints(&[-1, 2]), (-3).into())]);

        let eq = Constraint::new(ints(&[1, 1]), Relation::Eq, 2.into());
        assert_eq!(
            eq.normalized(),
            vec![
                Constraint::le(ints(&[1, 1]), 2.into()),
                Constraint::le(ints(&[-1, -1]), (-2).into()),
            ]
        );
    }

    #[test]
    fn test_normalized_constraints_dedupe_in_order() {
        let mut problem = LpProblem::new(ints(&[1, 1]));
        problem.add_constraint(ints(&[1, 0]), Relation::Le, 3.into()).unwrap();
        problem.add_constraint(ints(&[1, 1]), Relation::Eq, 2.into()).unwrap();
        problem.add_constraint(ints(&[-1, -1]), Relation::Le, (-2).into()).unwrap();
        problem.add_constraint(ints(&[1, 0]), Relation::Le, 3.into()).unwrap();

        let rows = problem.normalized_constraints();
        assert_eq!(
            rows,
            vec![
                Constraint::le(ints(&[1, 0]), 3.into()),
                Constraint::le(ints(&[1, 1]), 2.into()),
                Constraint::le(ints(&[-1, -1]), (-2).into()),
            ]
        );
    }
}
