//! Shape consistency validation for the LOLS specification

use crate::StorageError;

/// Validate an axis count for storage construction
///
/// A storage must have at least one axis.
pub const fn validate_dim(dim: usize) -> Result<(), StorageError> {
    if dim == 0 {
        return Err(StorageError::ZeroDimension);
    }
    Ok(())
}

/// Validate that two logical shapes are compatible for pairwise traversal
///
/// Pairwise operations (equality, merged map) require identical axis counts
/// and identical logical extents.
pub fn validate_same_shape(left: &[usize], right: &[usize]) -> Result<(), StorageError> {
    if left.len() != right.len() {
        return Err(StorageError::DimensionMismatch);
    }
    if left != right {
        return Err(StorageError::ShapeMismatch);
    }
    Ok(())
}
