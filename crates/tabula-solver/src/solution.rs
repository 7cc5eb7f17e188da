#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rational::Rational;

/// The optimum of a successful solve
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Solution {
    /// Value of each decision variable
    pub point: Vec<Rational>,
    /// Objective value at `point`, constant included
    pub value: Rational,
    /// Pivots, phase transitions, and cuts performed
    pub iterations: usize,
}

impl Solution {
    pub fn is_integral(&self) -> bool {
        self.point.iter().all(Rational::is_integer)
    }

    /// Lossy view of the point for display
    pub fn point_f64(&self) -> Vec<f64> {
        self.point.iter().map(Rational::to_f64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrality_and_float_view() {
        let solution = Solution {
            point: vec![Rational::from(2), Rational::new(1, 4).unwrap()],
            value: Rational::from(3),
            iterations: 2,
        };
        assert!(!solution.is_integral());
        assert_eq!(solution.point_f64(), vec![2.0, 0.25]);
    }
}
