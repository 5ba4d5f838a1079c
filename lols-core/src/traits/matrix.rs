//! Core matrix abstraction traits for the LOLS specification
//!
//! This module defines the fundamental traits that all sparse matrix
//! implementations must satisfy. These are pure interfaces with no
//! concrete implementations.

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use super::element::MatrixValue;

/// Core sparse matrix trait for storage-agnostic access
///
/// This trait provides the minimal interface that all sparse matrix
/// implementations must provide, regardless of storage backend. A matrix
/// is n-dimensional; coordinates are tuples of one index per axis.
pub trait SparseMatrix {
    /// The element type stored in this matrix
    type Element: MatrixValue;

    /// Get a stored element at the specified coordinates
    ///
    /// Returns `None` if the element equals the default (not stored) or if
    /// the coordinates are out of bounds.
    fn get_element(&self, coords: &[usize]) -> Option<Self::Element>;

    /// Get the logical extent along each axis
    fn shape(&self) -> &[usize];

    /// Get the number of axes
    fn dim(&self) -> usize {
        self.shape().len()
    }

    /// Get the number of stored (non-default) elements
    fn nnz(&self) -> usize;
}

/// Extension trait for whole-matrix extraction (requires alloc feature)
///
/// This trait provides higher-level operations that require allocation.
/// Only available when the `alloc` feature is enabled.
#[cfg(feature = "alloc")]
pub trait MatrixOperations: SparseMatrix {
    /// Get every stored element with its coordinates
    ///
    /// Entries are returned in lexicographic coordinate order.
    fn stored_entries(&self) -> Vec<(Vec<usize>, Self::Element)>;
}
