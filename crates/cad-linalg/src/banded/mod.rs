//! Banded Matrices
//!
//! Square matrices whose nonzero entries lie within a diagonal band.
//! Each row only materializes the columns its band can reach, and the
//! LU factorization runs in place inside that storage.

mod row;
mod solver;

pub use row::BandedRow;
pub use solver::{OptionsError, PivotPolicy, SolverOptions};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for banded matrix operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BandedError {
    /// Bandwidths or row index inconsistent with the matrix size
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Element access outside the matrix
    #[error("Index ({row}, {col}) out of range for {size}x{size} matrix")]
    IndexOutOfRange {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
        /// Matrix dimension
        size: usize,
    },

    /// Operand shape incompatible with the matrix
    #[error("Dimension mismatch: expected {expected} rows, got {found}")]
    DimensionMismatch {
        /// Row count the matrix requires
        expected: usize,
        /// Row count that was supplied
        found: usize,
    },

    /// Dense input that should be square is not
    #[error("Expected a square matrix, got {rows}x{cols}")]
    NotSquare {
        /// Row count of the input
        rows: usize,
        /// Column count of the input
        cols: usize,
    },
}

/// Result type for banded matrix operations
pub type BandedResult<T> = Result<T, BandedError>;

/// Serialization format for banded matrices
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BandedMatrixData {
    size: usize,
    lower_bandwidth: usize,
    upper_bandwidth: usize,
    rows: Vec<BandedRow>,
}

/// A square `n × n` matrix stored inside a band of lower bandwidth `lb`
/// and upper bandwidth `ub`.
///
/// Entry `(i, j)` with `j < i - lb` or `j > i + ub` is zero and never
/// stored. The matrix doubles as the storage for its own LU factors: a
/// call to [`solve`](Self::solve) replaces the coefficients with the
/// factorization, and any later [`set`](Self::set) discards it.
#[derive(Debug, Clone)]
pub struct BandedMatrix {
    /// Matrix dimension
    size: usize,
    /// Lower bandwidth
    lower_bandwidth: usize,
    /// Upper bandwidth
    upper_bandwidth: usize,
    /// Physical row storage
    rows: Vec<BandedRow>,
    /// Logical row -> physical row
    piv: Vec<usize>,
    /// Storage currently holds a complete LU factorization
    decomposed: bool,
    /// First pivot column the next factorization pass works on
    start: usize,
    /// A factorization pass has touched storage or pivots since the last write
    factoring: bool,
}

impl BandedMatrix {
    /// Create a zero matrix of dimension `size` with the given bandwidths
    pub fn new(size: usize, lower_bandwidth: usize, upper_bandwidth: usize) -> BandedResult<Self> {
        if size == 0 {
            return Err(BandedError::InvalidConfiguration(
                "matrix size must be at least 1".to_string(),
            ));
        }
        let rows = (0..size)
            .map(|row| BandedRow::new(row, size, upper_bandwidth, lower_bandwidth))
            .collect::<BandedResult<Vec<_>>>()?;

        Ok(Self {
            size,
            lower_bandwidth,
            upper_bandwidth,
            rows,
            piv: (0..size).collect(),
            decomposed: false,
            start: 0,
            factoring: false,
        })
    }

    /// Build a banded matrix from the in-band entries of a square dense matrix
    pub fn from_dense(
        dense: &Array2<f64>,
        lower_bandwidth: usize,
        upper_bandwidth: usize,
    ) -> BandedResult<Self> {
        let (size, cols) = dense.dim();
        if cols != size {
            return Err(BandedError::NotSquare { rows: size, cols });
        }
        let mut matrix = Self::new(size, lower_bandwidth, upper_bandwidth)?;
        for i in 0..size {
            let first = i.saturating_sub(lower_bandwidth);
            let last = (i + upper_bandwidth).min(size - 1);
            for j in first..=last {
                matrix.rows[i].set(j, dense[[i, j]]);
            }
        }
        Ok(matrix)
    }

    /// Matrix dimension
    pub fn size(&self) -> usize {
        self.size
    }

    /// Lower bandwidth
    pub fn lower_bandwidth(&self) -> usize {
        self.lower_bandwidth
    }

    /// Upper bandwidth
    pub fn upper_bandwidth(&self) -> usize {
        self.upper_bandwidth
    }

    /// Whether the storage currently holds a complete LU factorization
    pub fn is_decomposed(&self) -> bool {
        self.decomposed
    }

    /// Current row permutation (logical row -> physical row)
    pub fn pivots(&self) -> &[usize] {
        &self.piv
    }

    /// Storage of physical row `i`
    pub fn row(&self, i: usize) -> Option<&BandedRow> {
        self.rows.get(i)
    }

    /// Value stored at physical row `i`, column `j`
    pub fn get(&self, i: usize, j: usize) -> BandedResult<f64> {
        self.check_index(i, j)?;
        Ok(self.rows[i].get(j))
    }

    /// Store `value` at physical row `i`, column `j`.
    ///
    /// Invalidates any factorization. Writes outside the band of row `i`
    /// are accepted and dropped.
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> BandedResult<()> {
        self.check_index(i, j)?;
        self.rows[i].set(j, value);
        self.invalidate();
        Ok(())
    }

    /// Dense copy of the stored values, rows in physical order
    pub fn to_dense(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.size, self.size), |(i, j)| self.rows[i].get(j))
    }

    fn check_index(&self, i: usize, j: usize) -> BandedResult<()> {
        if i >= self.size || j >= self.size {
            return Err(BandedError::IndexOutOfRange {
                row: i,
                col: j,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Drop factorization state so the next solve starts a fresh pass
    fn invalidate(&mut self) {
        if self.factoring {
            self.piv.iter_mut().enumerate().for_each(|(i, p)| *p = i);
            self.factoring = false;
        }
        self.decomposed = false;
        self.start = 0;
    }
}

/// Writes the stored values only. A factorized matrix serializes its LU
/// factors, which read back as plain coefficients.
impl Serialize for BandedMatrix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let data = BandedMatrixData {
            size: self.size,
            lower_bandwidth: self.lower_bandwidth,
            upper_bandwidth: self.upper_bandwidth,
            rows: self.rows.clone(),
        };
        data.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BandedMatrix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let data = BandedMatrixData::deserialize(deserializer)?;
        let mut matrix =
            BandedMatrix::new(data.size, data.lower_bandwidth, data.upper_bandwidth)
                .map_err(D::Error::custom)?;
        if data.rows.len() != data.size {
            return Err(D::Error::custom(BandedError::DimensionMismatch {
                expected: data.size,
                found: data.rows.len(),
            }));
        }
        let covers_band = |i: usize, row: &BandedRow| {
            row.first_index() <= i.saturating_sub(data.lower_bandwidth)
                && row.last_index() >= (i + data.upper_bandwidth).min(data.size - 1)
        };
        if let Some(i) = data.rows.iter().enumerate().position(|(i, row)| {
            !row.is_consistent() || row.size() != data.size || !covers_band(i, row)
        }) {
            return Err(D::Error::custom(format!("inconsistent storage for row {}", i)));
        }
        matrix.rows = data.rows;
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_new_rejects_bad_configuration() {
        assert!(matches!(
            BandedMatrix::new(0, 0, 0),
            Err(BandedError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            BandedMatrix::new(3, 3, 1),
            Err(BandedError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            BandedMatrix::new(3, 1, 5),
            Err(BandedError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            BandedMatrix::new(3, usize::MAX, 0),
            Err(BandedError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            BandedMatrix::new(3, 0, usize::MAX),
            Err(BandedError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_zero_outside_band_after_construction() {
        let (n, lb, ub) = (9, 2, 1);
        let matrix = BandedMatrix::new(n, lb, ub).unwrap();
        for i in 0..n {
            for j in 0..n {
                if j + lb < i || j > i + ub {
                    assert_eq!(matrix.get(i, j).unwrap(), 0.0, "entry ({}, {})", i, j);
                }
            }
        }
        assert!(!matrix.is_decomposed());
        assert_eq!(matrix.pivots(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_in_band_write_reads_back() {
        let (n, lb, ub) = (7, 1, 2);
        let mut matrix = BandedMatrix::new(n, lb, ub).unwrap();
        for i in 0..n {
            for j in i.saturating_sub(lb)..=(i + ub).min(n - 1) {
                let value = 0.1 + (i * n + j) as f64 / 3.0;
                matrix.set(i, j, value).unwrap();
                assert_eq!(matrix.get(i, j).unwrap(), value);
            }
        }
    }

    #[test]
    fn test_index_out_of_range() {
        let mut matrix = BandedMatrix::new(4, 1, 1).unwrap();
        assert_eq!(
            matrix.get(4, 0),
            Err(BandedError::IndexOutOfRange {
                row: 4,
                col: 0,
                size: 4
            })
        );
        assert!(matches!(
            matrix.get(0, 4),
            Err(BandedError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            matrix.set(0, 10, 1.0),
            Err(BandedError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_row_storage_view() {
        let matrix = BandedMatrix::new(6, 1, 2).unwrap();
        let row = matrix.row(2).unwrap();
        assert_eq!((row.first_index(), row.last_index()), (1, 5));
        assert!(matrix.row(6).is_none());
    }

    #[test]
    fn test_out_of_band_write_is_dropped() {
        let mut matrix = BandedMatrix::new(6, 1, 1).unwrap();
        matrix.set(0, 5, 3.0).unwrap();
        assert_eq!(matrix.get(0, 5).unwrap(), 0.0);
    }

    #[test]
    fn test_from_dense_keeps_band_only() {
        let dense = array![
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ];
        let matrix = BandedMatrix::from_dense(&dense, 1, 1).unwrap();
        let expected = array![
            [1.0, 2.0, 0.0, 0.0],
            [5.0, 6.0, 7.0, 0.0],
            [0.0, 10.0, 11.0, 12.0],
            [0.0, 0.0, 15.0, 16.0],
        ];
        assert_eq!(matrix.to_dense(), expected);
    }

    #[test]
    fn test_from_dense_rejects_non_square() {
        let dense = Array2::<f64>::zeros((3, 4));
        let err = BandedMatrix::from_dense(&dense, 1, 1).unwrap_err();
        assert_eq!(err, BandedError::NotSquare { rows: 3, cols: 4 });
        assert_eq!(err.to_string(), "Expected a square matrix, got 3x4");
    }

    #[test]
    fn test_ron_snapshot_restores_values() {
        let mut matrix = BandedMatrix::new(5, 1, 2).unwrap();
        matrix.set(0, 0, 4.0).unwrap();
        matrix.set(2, 1, -1.5).unwrap();
        matrix.set(3, 4, 0.25).unwrap();

        let text = ron::ser::to_string_pretty(&matrix, ron::ser::PrettyConfig::default()).unwrap();
        let restored: BandedMatrix = ron::from_str(&text).unwrap();

        assert_eq!(restored.size(), 5);
        assert_eq!(restored.lower_bandwidth(), 1);
        assert_eq!(restored.upper_bandwidth(), 2);
        assert_eq!(restored.to_dense(), matrix.to_dense());
        assert!(!restored.is_decomposed());
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_rows() {
        let matrix = BandedMatrix::new(3, 1, 1).unwrap();

        // Claims a bigger matrix than the stored rows describe
        let data = BandedMatrixData {
            size: 4,
            lower_bandwidth: 1,
            upper_bandwidth: 1,
            rows: matrix.rows.clone(),
        };
        let text = ron::to_string(&data).unwrap();
        assert!(ron::from_str::<BandedMatrix>(&text).is_err());

        let mut rows = matrix.rows.clone();
        rows[1] = BandedRow::new(1, 5, 1, 1).unwrap();
        let data = BandedMatrixData {
            size: 3,
            lower_bandwidth: 1,
            upper_bandwidth: 1,
            rows,
        };
        let text = ron::to_string(&data).unwrap();
        assert!(ron::from_str::<BandedMatrix>(&text).is_err());
    }
}
