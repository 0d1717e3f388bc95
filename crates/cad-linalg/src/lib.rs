//! Linear Algebra Kernels for CADability
//!
//! This crate provides:
//! - Banded matrix storage that only materializes each row's band
//! - In-place banded LU factorization with pivoting inside the band
//! - Multi right-hand-side triangular solves
//! - Serializable solver options
//!
//! Curve and surface fitting assemble their normal equations into a
//! [`BandedMatrix`] and read the solution back as dense `ndarray` columns.
//!
//! ```
//! use cad_linalg::BandedMatrix;
//! use ndarray::array;
//!
//! let mut matrix = BandedMatrix::new(3, 1, 1)?;
//! for i in 0..3 {
//!     matrix.set(i, i, 2.0)?;
//! }
//! let x = matrix.solve(&array![[2.0], [4.0], [6.0]])?.expect("regular system");
//! assert_eq!(x[[2, 0]], 3.0);
//! # Ok::<(), cad_linalg::BandedError>(())
//! ```

pub mod banded;

// Re-exports for convenience
pub use banded::{
    BandedError, BandedMatrix, BandedResult, BandedRow, OptionsError, PivotPolicy, SolverOptions,
};
