#![no_std]

//! Core vocabulary for LOLS sparse matrix storage.
//!
//! Everything a storage engine and a host binding must agree on before any
//! list structure exists lives here: the closed [`DataType`] set, the
//! element contracts ([`MatrixValue`], [`MatrixElement`]), the
//! n-dimensional [`SparseMatrix`] access traits, the categorized
//! [`StorageError`] taxonomy, and the coordinate/slice validation
//! arithmetic.
//!
//! The crate is `no_std` and dependency-free so a binding layer can embed
//! it without pulling in the engine. Validation works on plain `&[usize]`
//! slices with checked arithmetic, independent of whatever vector types
//! the engine picks for shapes and offsets. The optional `alloc` feature
//! gates only [`MatrixOperations`], the one trait that hands back
//! collected entries.

// Public modules
pub mod dtype;
pub mod error;
pub mod traits;
pub mod validation;

// Re-export core types for convenience
pub use dtype::*;
pub use error::*;
pub use traits::*;
pub use validation::*;
