use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rational::Rational;
use crate::tableau::{Phase, Tableau};

/// Copy of a tableau at one point of a solve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableauSnapshot {
    pub matrix: Vec<Vec<Rational>>,
    /// Column names: `RHS`, `L`, `x0..`, `y0..`, `i1..`
    pub labels: Vec<String>,
    /// Basic column of each constraint row, in row order
    pub basic_columns: Vec<usize>,
}

impl fmt::Display for TableauSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .matrix
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .map(|(col, label)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(col).map(String::len))
                    .chain(std::iter::once(label.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:>4}", "")?;
        for (label, width) in self.labels.iter().zip(widths.iter().copied()) {
            write!(f, " {label:>width$}")?;
        }
        writeln!(f)?;
        for (row, values) in cells.iter().enumerate() {
            let name = match row.checked_sub(1).and_then(|i| self.basic_columns.get(i)) {
                Some(&col) => self.labels.get(col).map(String::as_str).unwrap_or("?"),
                None => "z",
            };
            write!(f, "{name:>4}")?;
            for (value, width) in values.iter().zip(widths.iter().copied()) {
                write!(f, " {value:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// One reported solver step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Step {
    /// Column that entered the basis, if any
    pub entering: Option<usize>,
    /// Row whose basic variable left, or the source row of a cut
    pub leaving: Option<usize>,
    pub phase_one: bool,
    pub tableau: TableauSnapshot,
}

/// Receives every pivot, phase start, and cut of a solve.
pub trait StepSink {
    fn record(&mut self, entering: Option<usize>, leaving: Option<usize>, tableau: &Tableau);
}

impl StepSink for Vec<Step> {
    fn record(&mut self, entering: Option<usize>, leaving: Option<usize>, tableau: &Tableau) {
        self.push(Step {
            entering,
            leaving,
            phase_one: tableau.phase() == Phase::One,
            tableau: tableau.snapshot(),
        });
    }
}

/// Discards every step.
impl StepSink for () {
    fn record(&mut self, _entering: Option<usize>, _leaving: Option<usize>, _tableau: &Tableau) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{LpProblem, Relation, ints};

    #[test]
    fn test_vec_sink_captures_snapshot() {
        let mut problem = LpProblem::new(ints(&[1, 1]));
        problem.add_constraint(ints(&[1, 2]), Relation::Le, 4.into()).unwrap();
        let tableau = Tableau::new(&problem).unwrap();

        let mut steps: Vec<Step> = Vec::new();
        steps.record(None, None, &tableau);
        steps.record(Some(2), Some(1), &tableau);

        assert_eq!(steps.len(), 2);
        assert!(steps[0].phase_one);
        assert_eq!(steps[1].entering, Some(2));
        assert_eq!(steps[1].leaving, Some(1));
        assert_eq!(steps[1].tableau.labels, vec!["RHS", "L", "x0", "x1", "y0"]);
        assert_eq!(steps[1].tableau.basic_columns, vec![4]);
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = TableauSnapshot {
            matrix: vec![ints(&[0, 3]), vec![Rational::new(1, 2).unwrap(), Rational::from(1)]],
            labels: vec!["RHS".to_string(), "x0".to_string()],
            basic_columns: vec![1],
        };
        let text = snapshot.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["     RHS x0", "   z   0  3", "  x0 1/2  1"]);
    }
}
