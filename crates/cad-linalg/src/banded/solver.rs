//! Banded LU Solver
//!
//! In-place LU factorization restricted to the band, with optional row
//! pivoting inside the lower-bandwidth window, and forward/backward
//! substitution for any number of right-hand sides.

use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{BandedError, BandedMatrix, BandedResult};

/// When the factorization swaps rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PivotPolicy {
    /// Factorize without pivoting, retry with pivoting on a zero pivot
    #[default]
    Auto,
    /// Always pick the largest pivot in the band window
    Always,
    /// Never swap rows, a zero pivot means no solution
    Never,
}

/// Options controlling how a [`BandedMatrix`] is factorized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Pivoting strategy
    pub pivoting: PivotPolicy,
}

impl SolverOptions {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pivoting strategy
    pub fn with_pivoting(mut self, pivoting: PivotPolicy) -> Self {
        self.pivoting = pivoting;
        self
    }

    /// Save options to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OptionsError> {
        let content = self.to_ron()?;
        std::fs::write(path.as_ref(), content).map_err(|e| OptionsError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load options from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| OptionsError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    /// Serialize options to a RON string
    pub fn to_ron(&self) -> Result<String, OptionsError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| OptionsError::Serialize(e.to_string()))
    }

    /// Parse options from a RON string
    pub fn from_ron(content: &str) -> Result<Self, OptionsError> {
        ron::from_str(content).map_err(|e| OptionsError::Deserialize(e.to_string()))
    }
}

/// Solver option file errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum OptionsError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(String),
    /// Options could not be written as RON
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// File content is not valid RON options
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

impl BandedMatrix {
    /// Logical row in `[col, col + lb]` with the largest `|A[piv[row], col]|`.
    ///
    /// Ties keep the earliest row.
    fn pick_pivot_row(&self, col: usize) -> usize {
        let last = (col + self.lower_bandwidth).min(self.size - 1);
        let mut best = col;
        let mut best_abs = self.rows[self.piv[col]].get(col).abs();
        for row in (col + 1)..=last {
            let candidate = self.rows[self.piv[row]].get(col).abs();
            if candidate > best_abs {
                best = row;
                best_abs = candidate;
            }
        }
        best
    }

    /// Run (or resume) the in-place LU factorization.
    ///
    /// Starts at the column where the previous attempt stopped, so a failed
    /// pass without pivoting can be continued with pivoting. Returns `false`
    /// on an exactly zero pivot.
    fn factorize(&mut self, use_pivoting: bool) -> bool {
        let n = self.size;
        self.factoring = true;

        for k in self.start..n.saturating_sub(1) {
            self.start = k;

            if use_pivoting {
                let candidate = self.pick_pivot_row(k);
                if candidate != k {
                    tracing::trace!("Pivot column {}: swapping rows {} and {}", k, k, candidate);
                    self.piv.swap(k, candidate);
                    let pivot_last = self.rows[self.piv[k]].last_index();
                    for row in (k + 1)..=candidate {
                        self.rows[self.piv[row]].grow_to(pivot_last);
                    }
                }
            }

            let pivot_row = self.piv[k];
            let pivot = self.rows[pivot_row].get(k);
            if pivot == 0.0 {
                tracing::debug!("Zero pivot in column {} (pivoting: {})", k, use_pivoting);
                return false;
            }

            let pivot_last = self.rows[pivot_row].last_index();
            let last_row = (k + self.lower_bandwidth).min(n - 1);
            for i in (k + 1)..=last_row {
                let target = self.piv[i];
                let factor = self.rows[target].get(k) / pivot;
                self.rows[target].set(k, factor);
                if factor == 0.0 {
                    continue;
                }
                for j in (k + 1)..=pivot_last {
                    let value = self.rows[target].get(j) - factor * self.rows[pivot_row].get(j);
                    self.rows[target].set(j, value);
                }
            }
        }

        // The loop never inspects the last diagonal entry
        self.start = n - 1;
        if self.rows[self.piv[n - 1]].get(n - 1) == 0.0 {
            tracing::debug!("Zero pivot in column {} (pivoting: {})", n - 1, use_pivoting);
            return false;
        }

        self.decomposed = true;
        true
    }

    /// Factorize according to `options` unless a valid factorization exists.
    ///
    /// Returns `false` when the matrix is singular within working precision.
    pub fn factorize_with(&mut self, options: &SolverOptions) -> bool {
        if self.decomposed {
            return true;
        }
        match options.pivoting {
            PivotPolicy::Never => self.factorize(false),
            PivotPolicy::Always => self.factorize(true),
            PivotPolicy::Auto => {
                if self.factorize(false) {
                    return true;
                }
                tracing::debug!("Retrying factorization with pivoting from column {}", self.start);
                self.factorize(true)
            }
        }
    }

    /// Solve `A · X = B` for every column of `b`.
    ///
    /// Factorizes first if needed, without pivoting and then with pivoting.
    /// Returns `Ok(None)` if the matrix is singular.
    pub fn solve(&mut self, b: &Array2<f64>) -> BandedResult<Option<Array2<f64>>> {
        self.solve_with(b, &SolverOptions::default())
    }

    /// Solve `A · X = B` using the given factorization options
    pub fn solve_with(
        &mut self,
        b: &Array2<f64>,
        options: &SolverOptions,
    ) -> BandedResult<Option<Array2<f64>>> {
        if b.nrows() != self.size {
            return Err(BandedError::DimensionMismatch {
                expected: self.size,
                found: b.nrows(),
            });
        }
        if !self.factorize_with(options) {
            tracing::warn!("Banded system of size {} is singular", self.size);
            return Ok(None);
        }

        let n = self.size;
        let mut result = Array2::zeros(b.raw_dim());
        let mut y = vec![0.0; n];

        for (k, column) in b.axis_iter(Axis(1)).enumerate() {
            // Forward substitution, unit lower triangle
            for i in 0..n {
                let row = &self.rows[self.piv[i]];
                let sum: f64 = (row.first_index()..i).map(|j| row.get(j) * y[j]).sum();
                y[i] = column[self.piv[i]] - sum;
            }

            // Backward substitution
            let row = &self.rows[self.piv[n - 1]];
            result[[n - 1, k]] = y[n - 1] / row.get(n - 1);
            for i in (0..n - 1).rev() {
                let row = &self.rows[self.piv[i]];
                let sum: f64 = ((i + 1)..=row.last_index())
                    .map(|j| row.get(j) * result[[j, k]])
                    .sum();
                result[[i, k]] = (y[i] - sum) / row.get(i);
            }
        }

        Ok(Some(result))
    }

    /// Solve `A · x = b` for a single right-hand side
    pub fn solve_vector(&mut self, b: &Array1<f64>) -> BandedResult<Option<Array1<f64>>> {
        let rhs = b.view().insert_axis(Axis(1)).to_owned();
        Ok(self
            .solve(&rhs)?
            .map(|x| x.index_axis_move(Axis(1), 0)))
    }
}
