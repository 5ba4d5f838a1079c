//! Error taxonomy for LOLS storage operations
//!
//! This module provides a Linux kernel style error classification system
//! with distinct error codes for different categories of failures.

/// Errors that can occur during sparse storage operations
///
/// Error codes are organized by category with distinct numeric ranges
/// to enable efficient error handling and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StorageError {
    // Unimplemented operations - 1-15
    /// Matrix multiplication is not implemented for list storage
    MatrixMultiply = 1,
    /// Transposition is not implemented for list storage
    Transpose = 2,
    /// Slice-assignment from another matrix is not implemented
    MatrixSliceAssignment = 3,
    /// Non-diagonal counting is only defined for two dimensions
    NonDiagonalCount = 4,

    // Type errors (dtype issues) - 16-31
    /// A value of an unsupported type was supplied
    UnsupportedValueType = 16,
    /// No pairwise dispatch entry exists for the dtype combination
    NoDispatchEntry = 17,
    /// A value cannot be converted to the requested dtype
    InvalidConversion = 18,

    // Boundary errors (index/size issues) - 32-47
    /// Coordinate out of bounds for the storage shape
    CoordinateOutOfRange = 32,
    /// Slice extends beyond the storage shape
    SliceOutOfRange = 33,
    /// Index arithmetic would overflow
    IndexOverflow = 34,

    // Dimension errors (shape consistency) - 48-63
    /// A storage must have at least one axis
    ZeroDimension = 48,
    /// Axis counts of the operands differ
    DimensionMismatch = 49,
    /// Logical shapes of the operands differ
    ShapeMismatch = 50,
}

impl StorageError {
    /// Get the error category for this error
    pub const fn category(&self) -> ErrorCategory {
        match *self as u8 {
            1..=15 => ErrorCategory::NotImplemented,
            16..=31 => ErrorCategory::Type,
            32..=47 => ErrorCategory::Boundary,
            48..=63 => ErrorCategory::Dimension,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Get the numeric error code
    pub const fn code(&self) -> u8 {
        *self as u8
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Operations the storage kind deliberately does not support
    NotImplemented,
    /// Dtype and value type errors
    Type,
    /// Index and slice boundary errors
    Boundary,
    /// Shape and axis-count consistency errors
    Dimension,
    /// Unknown/undefined category
    Unknown,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            // Unimplemented operations
            StorageError::MatrixMultiply => {
                "multiplication not implemented for list-of-lists matrices"
            }
            StorageError::Transpose => "transposition not implemented for list-of-lists matrices",
            StorageError::MatrixSliceAssignment => {
                "slice-assignment from a matrix is not implemented"
            }
            StorageError::NonDiagonalCount => {
                "non-diagonal element counting only defined for two dimensions"
            }

            // Type errors
            StorageError::UnsupportedValueType => "unsupported value type for this operation",
            StorageError::NoDispatchEntry => "no dispatch entry for this dtype combination",
            StorageError::InvalidConversion => "value cannot be converted to the requested dtype",

            // Boundary errors
            StorageError::CoordinateOutOfRange => "coordinate out of bounds for the storage shape",
            StorageError::SliceOutOfRange => "slice extends beyond the storage shape",
            StorageError::IndexOverflow => "index arithmetic would overflow",

            // Dimension errors
            StorageError::ZeroDimension => "a storage must have at least one axis",
            StorageError::DimensionMismatch => "axis counts of the operands differ",
            StorageError::ShapeMismatch => "logical shapes of the operands differ",
        };
        write!(f, "{msg}")
    }
}

impl core::error::Error for StorageError {}

/// Result type for LOLS core operations
pub type Result<T> = core::result::Result<T, StorageError>;
