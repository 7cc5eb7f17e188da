#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SolveError;
use crate::problem::{DEFAULT_MAX_ITERATIONS, Goal, IntegerMethod, LpProblem, PivotRule, Relation};
use crate::rational::Rational;

/// A constraint row in dictionary form.
///
/// The row describes `coefficients · x + constant`; the constraint solved is
/// `-coefficients · x (relation) constant`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintRow {
    pub coefficients: Vec<f64>,
    pub relation: Relation,
    #[cfg_attr(feature = "serde", serde(default))]
    pub constant: f64,
}

/// Floating point description of a problem, as received from outer layers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SolveRequest {
    pub objective: Vec<f64>,
    pub objective_constant: f64,
    pub constraints: Vec<ConstraintRow>,
    pub goal: Goal,
    pub non_negative: bool,
    pub integer_method: IntegerMethod,
    pub pivot_rule: PivotRule,
    pub max_iterations: usize,
}

impl Default for SolveRequest {
    fn default() -> Self {
        Self {
            objective: Vec::new(),
            objective_constant: 0.0,
            constraints: Vec::new(),
            goal: Goal::default(),
            non_negative: true,
            integer_method: IntegerMethod::default(),
            pivot_rule: PivotRule::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolveRequest {
    /// Converts every number to an exact fraction and builds the problem.
    pub fn to_problem(&self) -> Result<LpProblem, SolveError> {
        let objective = convert(&self.objective, false)?;
        let mut problem = LpProblem::new(objective)
            .with_constant(Rational::from_f64(self.objective_constant)?)
            .with_goal(self.goal)
            .with_non_negative(self.non_negative)
            .with_integer_method(self.integer_method)
            .with_pivot_rule(self.pivot_rule)
            .with_max_iterations(self.max_iterations);

        for row in &self.constraints {
            problem.add_constraint(
                convert(&row.coefficients, true)?,
                row.relation,
                Rational::from_f64(row.constant)?,
            )?;
        }
        Ok(problem)
    }
}

fn convert(values: &[f64], negate: bool) -> Result<Vec<Rational>, SolveError> {
    values
        .iter()
        .map(|&v| -> Result<Rational, SolveError> {
            let r = Rational::from_f64(v)?;
            Ok(if negate { -r } else { r })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Constraint, ints};
    use crate::rational::ArithmeticError;
    use crate::simplex::Solver;
    use crate::trace::Step;

    fn half_request() -> SolveRequest {
        SolveRequest {
            objective: vec![1.5, 0.5],
            objective_constant: 0.25,
            constraints: vec![ConstraintRow {
                coefficients: vec![-1.0, -1.0],
                relation: Relation::Le,
                constant: 2.5,
            }],
            ..SolveRequest::default()
        }
    }

    #[test]
    fn test_conversion_negates_constraint_coefficients() {
        let problem = half_request().to_problem().unwrap();
        assert_eq!(
            problem.objective.coefficients,
            vec![Rational::new(3, 2).unwrap(), Rational::new(1, 2).unwrap()]
        );
        assert_eq!(problem.objective.constant, Rational::new(1, 4).unwrap());
        assert_eq!(
            problem.constraints(),
            &[Constraint::le(ints(&[1, 1]), Rational::new(5, 2).unwrap())]
        );
        assert_eq!(problem.max_iterations, 10_000);
        assert!(problem.non_negative);
    }

    #[test]
    fn test_solve_request() {
        let mut steps: Vec<Step> = Vec::new();
        let solution = Solver::new()
            .solve_request(&half_request(), &mut steps)
            .unwrap();
        // x0 = 5/2: 3/2 * 5/2 + 1/4
        assert_eq!(solution.point, vec![Rational::new(5, 2).unwrap(), Rational::from(0)]);
        assert_eq!(solution.value, Rational::from(4));
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let mut request = half_request();
        request.objective[0] = f64::NAN;
        assert!(matches!(
            request.to_problem(),
            Err(SolveError::Arithmetic(ArithmeticError::NotFinite(_)))
        ));

        let mut request = half_request();
        request.constraints[0].coefficients.push(1.0);
        assert!(matches!(
            request.to_problem(),
            Err(SolveError::MalformedConstraint(_))
        ));
    }
}
