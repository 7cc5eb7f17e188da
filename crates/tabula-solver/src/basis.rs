use crate::error::SolveError;

/// Bijection between constraint rows and their basic columns.
///
/// Rows are numbered from 1 as in the tableau; row 0 is the objective row
/// and never has a basic column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basis {
    by_row: Vec<usize>,
    by_col: Vec<Option<usize>>,
}

impl Basis {
    /// `columns[i]` is the basic column of row `i + 1`.
    pub fn new(columns: Vec<usize>, width: usize) -> Result<Self, SolveError> {
        let mut by_col = vec![None; width];
        for (i, &col) in columns.iter().enumerate() {
            match by_col.get(col) {
                Some(None) => by_col[col] = Some(i + 1),
                Some(Some(_)) => {
                    return Err(SolveError::InvalidArgument(format!(
                        "column {col} is basic in more than one row"
                    )));
                }
                None => return Err(out_of_range("column", col)),
            }
        }
        Ok(Self { by_row: columns, by_col })
    }

    pub fn column_of(&self, row: usize) -> Option<usize> {
        row.checked_sub(1).and_then(|i| self.by_row.get(i)).copied()
    }

    pub fn row_of(&self, col: usize) -> Option<usize> {
        self.by_col.get(col).copied().flatten()
    }

    pub fn is_basic(&self, col: usize) -> bool {
        self.row_of(col).is_some()
    }

    /// Basic columns ordered by row.
    pub fn columns(&self) -> &[usize] {
        &self.by_row
    }

    /// Makes `col` basic in `row`, releasing the column that was basic there.
    pub fn replace(&mut self, row: usize, col: usize) -> Result<(), SolveError> {
        let Some(slot) = row.checked_sub(1).and_then(|i| self.by_row.get_mut(i)) else {
            return Err(out_of_range("row", row));
        };
        match self.by_col.get(col) {
            None => return Err(out_of_range("column", col)),
            Some(Some(current)) if *current != row => {
                return Err(SolveError::InvalidArgument(format!(
                    "column {col} is already basic in row {current}"
                )));
            }
            Some(_) => {}
        }
        let leaving = std::mem::replace(slot, col);
        self.by_col[leaving] = None;
        self.by_col[col] = Some(row);
        Ok(())
    }

    /// Appends a row whose basic column is a newly appended column.
    pub fn push(&mut self, col: usize) -> Result<(), SolveError> {
        if col != self.by_col.len() {
            return Err(SolveError::InvalidArgument(format!(
                "new basic column {col} must be appended at {}",
                self.by_col.len()
            )));
        }
        self.by_row.push(col);
        self.by_col.push(Some(self.by_row.len()));
        Ok(())
    }

    /// Removes a nonbasic column, shifting every later column down by one.
    pub fn drop_column(&mut self, col: usize) -> Result<(), SolveError> {
        match self.by_col.get(col) {
            None => return Err(out_of_range("column", col)),
            Some(Some(row)) => {
                return Err(SolveError::InvalidArgument(format!(
                    "cannot drop column {col}: it is basic in row {row}"
                )));
            }
            Some(None) => {}
        }
        self.by_col.remove(col);
        for basic in &mut self.by_row {
            if *basic > col {
                *basic -= 1;
            }
        }
        Ok(())
    }
}

fn out_of_range(what: &str, index: usize) -> SolveError {
    SolveError::InvalidArgument(format!("{what} {index} is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        let basis = Basis::new(vec![3, 4], 5).unwrap();
        assert_eq!(basis.column_of(1), Some(3));
        assert_eq!(basis.column_of(2), Some(4));
        assert_eq!(basis.column_of(0), None);
        assert_eq!(basis.row_of(4), Some(2));
        assert_eq!(basis.row_of(1), None);
        assert!(basis.is_basic(3));
        assert!(!basis.is_basic(2));
    }

    #[test]
    fn test_rejects_duplicate_column() {
        assert!(Basis::new(vec![3, 3], 5).is_err());
        assert!(Basis::new(vec![7], 5).is_err());
    }

    #[test]
    fn test_replace_keeps_bijection() {
        let mut basis = Basis::new(vec![3, 4], 5).unwrap();
        basis.replace(2, 1).unwrap();
        assert_eq!(basis.columns(), &[3, 1]);
        assert_eq!(basis.row_of(1), Some(2));
        assert_eq!(basis.row_of(4), None);

        let err = basis.replace(2, 3).unwrap_err();
        assert!(matches!(err, SolveError::InvalidArgument(_)));
        assert!(basis.replace(3, 2).is_err());
    }

    #[test]
    fn test_push_and_drop() {
        let mut basis = Basis::new(vec![3, 4], 5).unwrap();
        basis.push(5).unwrap();
        assert_eq!(basis.row_of(5), Some(3));
        assert!(basis.push(9).is_err());

        assert!(basis.drop_column(3).is_err());
        basis.drop_column(1).unwrap();
        assert_eq!(basis.columns(), &[2, 3, 4]);
        assert_eq!(basis.row_of(2), Some(1));
        assert_eq!(basis.row_of(4), Some(3));
    }
}
