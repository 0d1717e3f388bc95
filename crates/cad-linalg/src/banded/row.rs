//! Band Storage Row
//!
//! Stores the materialized slice of a single matrix row. Columns outside
//! the slice read as zero and ignore writes.

use serde::{Deserialize, Serialize};

use super::{BandedError, BandedResult};

/// Stored slice of one row of a [`BandedMatrix`](super::BandedMatrix)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandedRow {
    /// First materialized column (inclusive)
    first: usize,
    /// Last materialized column (inclusive)
    last: usize,
    /// Logical row length
    size: usize,
    /// Values for columns `first..=last`
    values: Vec<f64>,
}

impl BandedRow {
    /// Create the storage for row `row` of a `size × size` matrix
    pub fn new(
        row: usize,
        size: usize,
        upper_bandwidth: usize,
        lower_bandwidth: usize,
    ) -> BandedResult<Self> {
        if size == 0 {
            return Err(BandedError::InvalidConfiguration(
                "matrix size must be at least 1".to_string(),
            ));
        }
        if lower_bandwidth >= size || upper_bandwidth >= size {
            return Err(BandedError::InvalidConfiguration(format!(
                "bandwidths (lower {}, upper {}) exceed matrix size {}",
                lower_bandwidth, upper_bandwidth, size
            )));
        }
        if row >= size {
            return Err(BandedError::InvalidConfiguration(format!(
                "row index {} outside matrix of size {}",
                row, size
            )));
        }

        // Both bandwidths are below `size`, so the sums cannot overflow
        let (first, last) = if upper_bandwidth + lower_bandwidth >= size {
            // Banding buys nothing, keep the whole row
            (0, size - 1)
        } else {
            // Room for the natural band plus `lower_bandwidth` columns of fill-in
            let mut first = row.saturating_sub(lower_bandwidth);
            let mut last = row + lower_bandwidth + upper_bandwidth;
            if last > size - 1 {
                first = first.saturating_sub(last - (size - 1));
                last = size - 1;
            }
            (first, last)
        };

        Ok(Self {
            first,
            last,
            size,
            values: vec![0.0; last - first + 1],
        })
    }

    /// First materialized column
    #[inline]
    pub fn first_index(&self) -> usize {
        self.first
    }

    /// Last materialized column
    #[inline]
    pub fn last_index(&self) -> usize {
        self.last
    }

    /// Logical row length
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Value at `col`, zero outside the materialized slice
    #[inline]
    pub fn get(&self, col: usize) -> f64 {
        if col < self.first || col > self.last {
            return 0.0;
        }
        self.values[col - self.first]
    }

    /// Store `value` at `col`.
    ///
    /// Writes outside the materialized slice are dropped. Callers grow the
    /// row first when fill-in has to land past the current upper bound.
    #[inline]
    pub fn set(&mut self, col: usize, value: f64) {
        if col < self.first || col > self.last {
            return;
        }
        self.values[col - self.first] = value;
    }

    /// Extend the upper bound by `delta` columns, capped at the row end.
    ///
    /// Existing values keep their columns; new columns start at zero.
    pub fn grow(&mut self, delta: usize) {
        if self.last == self.size - 1 || delta == 0 {
            return;
        }
        let last = self.last.saturating_add(delta).min(self.size - 1);
        let mut values = vec![0.0; last - self.first + 1];
        values[..self.values.len()].copy_from_slice(&self.values);
        self.values = values;
        self.last = last;
    }

    /// Grow until the upper bound reaches `last` (no-op if it already does)
    pub fn grow_to(&mut self, last: usize) {
        if last > self.last {
            self.grow(last - self.last);
        }
    }

    /// Check the storage invariants, used after deserialization
    pub(crate) fn is_consistent(&self) -> bool {
        self.size > 0
            && self.first <= self.last
            && self.last < self.size
            && self.values.len() == self.last - self.first + 1
    }
}
