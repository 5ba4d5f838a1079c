//! Abstract interfaces for the LOLS specification
//!
//! This module defines all trait abstractions used in the LOLS ecosystem.
//! Traits are pure interfaces - no concrete implementations.

pub mod element;
pub mod matrix;

pub use element::{MatrixElement, MatrixValue};
#[cfg(feature = "alloc")]
pub use matrix::MatrixOperations;
pub use matrix::SparseMatrix;
