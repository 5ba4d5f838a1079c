//! Engine-level error type
//!
//! Wraps the core error taxonomy and adds the payload-carrying failures of
//! the dynamic dispatch layer.

use lols_core::{DataType, StorageError};
use thiserror::Error as ThisError;

/// Errors surfaced by the storage engine
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// A failure classified by the core taxonomy
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No pairwise dispatch entry exists for this dtype combination
    #[error("no dispatch entry for dtype pair ({left}, {right})")]
    NoDispatch {
        /// Dtype of the left operand
        left: DataType,
        /// Dtype of the right operand
        right: DataType,
    },

    /// The requested cast has no defined conversion
    #[error("cannot cast {from} storage to {to}")]
    Cast {
        /// Source dtype
        from: DataType,
        /// Requested dtype
        to: DataType,
    },
}

/// Result type for storage engine operations
pub type Result<T> = core::result::Result<T, Error>;
