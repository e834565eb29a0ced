//! Fixed-shape tables used for edge costs and middle-node choices.
//!
//! Every edge of an [`SbpGraph`](crate::SbpGraph) stores a [`CostTable`] whose rows are
//! indexed by the candidates of the start node and whose columns are indexed by the
//! candidates of the end node. Bridged edges additionally store a [`ChoiceTable`] of the
//! same shape. Both are instances of the generic row-major [`Table`].

use crate::error::{SbpError, SbpResult};
use crate::{is_forbidden, normalize_cost};
use std::ops::Index;

/// A dense row-major table with a fixed shape.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// Cost of every (start candidate, end candidate) combination of an edge.
pub type CostTable = Table<f64>;

/// Minimizing middle-node candidate of every (start candidate, end candidate) combination.
pub type ChoiceTable = Table<usize>;

impl<T: Copy> Table<T> {
    /// Create a `rows × cols` table with every entry set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Table<T> {
        Table {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Create a `rows × cols` table by evaluating `entry(row, col)` for every position.
    pub fn from_fn<F: FnMut(usize, usize) -> T>(rows: usize, cols: usize, mut entry: F) -> Table<T> {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(entry(row, col));
            }
        }
        Table { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The `(rows, cols)` pair of this table.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Read one entry.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside of the table.
    pub fn get(&self, row: usize, col: usize) -> T {
        self[(row, col)]
    }

    /// Overwrite one entry.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside of the table.
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(row < self.rows && col < self.cols, "Position out of range.");
        self.data[row * self.cols + col] = value;
    }

    /// All entries of one row.
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn transpose(&self) -> Table<T> {
        Table::from_fn(self.cols, self.rows, |row, col| self.get(col, row))
    }

    /// Build a new table whose `i`-th row is the `rows[i]`-th row of this table.
    ///
    /// This is how the rows of an edge are expanded when its start node is merged into a
    /// cross-product node: every merged candidate copies the row of the half it came from.
    pub fn select_rows(&self, rows: &[usize]) -> Table<T> {
        Table::from_fn(rows.len(), self.cols, |row, col| self.get(rows[row], col))
    }

    /// Build a new table whose `j`-th column is the `cols[j]`-th column of this table.
    pub fn select_cols(&self, cols: &[usize]) -> Table<T> {
        Table::from_fn(self.rows, cols.len(), |row, col| self.get(row, cols[col]))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().copied()
    }

    /// Apply `f` to every entry, keeping the shape.
    pub fn map<U, F: FnMut(T) -> U>(&self, f: F) -> Table<U> {
        Table {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().copied().map(f).collect(),
        }
    }
}

impl<T> Index<(usize, usize)> for Table<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(row < self.rows && col < self.cols, "Position out of range.");
        &self.data[row * self.cols + col]
    }
}

impl CostTable {
    /// Build a cost table from nested rows.
    ///
    /// Fails with [`SbpError::RaggedTable`] if the rows do not have the same length and with
    /// [`SbpError::InvalidCost`] if some entry is `NaN` or `-inf`. Entries of `+inf` are
    /// stored as [`FORBIDDEN_COST`](crate::FORBIDDEN_COST).
    pub fn from_rows(rows: Vec<Vec<f64>>) -> SbpResult<CostTable> {
        let cols = rows.first().map(|it| it.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(SbpError::RaggedTable {
                    row: index,
                    expected: cols,
                    actual: row.len(),
                });
            }
            for (col, entry) in row.iter().enumerate() {
                let Some(entry) = normalize_cost(*entry) else {
                    return Err(SbpError::InvalidCost(format!("cost table entry ({index}, {col})")));
                };
                data.push(entry);
            }
        }
        Ok(Table {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// The smallest entry (`+inf` for an empty table).
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// The largest entry that is not forbidden, if any.
    pub fn max_finite(&self) -> Option<f64> {
        self.data
            .iter()
            .copied()
            .filter(|it| !is_forbidden(*it))
            .reduce(f64::max)
    }

    /// Add `other` to this table entry-wise. If `transposed` is set, `other` is oriented the
    /// other way around, i.e. its rows correspond to the columns of this table.
    pub(crate) fn accumulate(&mut self, other: &CostTable, transposed: bool) {
        if transposed {
            debug_assert_eq!(other.shape(), (self.cols, self.rows));
            for row in 0..self.rows {
                for col in 0..self.cols {
                    self.data[row * self.cols + col] += other.get(col, row);
                }
            }
        } else {
            debug_assert_eq!(other.shape(), self.shape());
            for (entry, value) in self.data.iter_mut().zip(other.data.iter()) {
                *entry += *value;
            }
        }
    }

    /// Multiply every positive entry that is not forbidden by `ratio`.
    ///
    /// Forbidden entries stay forbidden and zero entries stay zero.
    pub fn scale_finite(&mut self, ratio: f64) {
        for entry in self.data.iter_mut() {
            if *entry > 0.0 && !is_forbidden(*entry) {
                *entry *= ratio;
            }
        }
    }
}
