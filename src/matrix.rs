// imports
use crate::error::{CoocError, Result};
use crate::table::{CellKey, CountTable};
use ndarray::Array2;
use serde::{Deserialize, Serialize};


/// Compressed sparse row matrix of co-occurrence counts.
///
/// Row `i` holds its non-zero columns in `indices[indptr[i]..indptr[i + 1]]`,
/// sorted ascending, with the matching counts in `data`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<u64>,
}

impl CsrMatrix {

    /// All-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, indptr: vec![0; rows + 1], indices: Vec::new(), data: Vec::new() }
    }

    /// Builds the matrix from the accumulated cells: one stored entry per
    /// distinct cell. The shape may be larger than the largest index used.
    pub fn assemble(accumulator: CountTable, rows: usize, cols: usize) -> Result<CsrMatrix> {

        let mut cells = accumulator.into_iter().collect::<Vec<(CellKey, u64)>>();

        // row-major order makes the layout independent of hash iteration order
        cells.sort_unstable_by_key(|(key, _)| *key);

        let mut indptr = vec![0usize; rows + 1];
        let mut indices = Vec::with_capacity(cells.len());
        let mut data = Vec::with_capacity(cells.len());

        for (key, count) in cells {
            let (row, col) = (key.row(), key.col());
            if row >= rows || col >= cols {
                return Err(CoocError::OutOfShape { row, col, rows, cols })
            }
            indptr[row + 1] += 1;
            indices.push(col);
            data.push(count);
        }

        // counts per row -> offsets
        for i in 0..rows {
            indptr[i + 1] += indptr[i];
        }

        tracing::debug!("assembled {}x{} matrix with {} non-zero entries", rows, cols, data.len());

        Ok(CsrMatrix { rows, cols, indptr, indices, data })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn sum(&self) -> u64 {
        self.data.iter().sum()
    }

    pub fn density(&self) -> f64 {
        if self.rows == 0 || self.cols == 0 {
            return 0.0
        }
        self.nnz() as f64 / (self.rows as f64 * self.cols as f64)
    }

    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn data(&self) -> &[u64] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> u64 {
        if row >= self.rows {
            return 0
        }
        let (start, end) = (self.indptr[row], self.indptr[row + 1]);
        match self.indices[start..end].binary_search(&col) {
            Ok(i) => self.data[start + i],
            Err(_) => 0,
        }
    }

    /// Non-zero `(col, count)` entries of one row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
        let (start, end) = if row < self.rows { (self.indptr[row], self.indptr[row + 1]) } else { (0, 0) };
        self.indices[start..end].iter().copied().zip(self.data[start..end].iter().copied())
    }

    /// Every non-zero `(row, col, count)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        (0..self.rows).flat_map(move |r| self.row(r).map(move |(c, v)| (r, c, v)))
    }

    /// Dense copy, for inspection of small matrices.
    pub fn to_dense(&self) -> Array2<u64> {
        let mut dense = Array2::zeros((self.rows, self.cols));
        for (r, c, v) in self.iter() {
            dense[[r, c]] = v;
        }
        dense
    }
}
