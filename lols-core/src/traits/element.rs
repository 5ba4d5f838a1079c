//! Element type constraints for the LOLS specification
//!
//! This module defines the traits that constrain what types can be stored
//! as matrix elements in a LOLS storage.

use crate::dtype::DataType;

/// Trait for values a sparse storage can hold
///
/// This is the minimal typed-value abstraction the storage consumes:
/// equality (to decide whether a value matches the default and must not be
/// stored), copying, and debug formatting. Both the numeric dtypes and the
/// host-object dtype satisfy it.
pub trait MatrixValue: Clone + PartialEq + core::fmt::Debug + 'static {}

/// Trait for numeric types that can be stored as matrix elements
///
/// This trait adds the casting contract on top of [`MatrixValue`]:
/// - Copy: can be copied without allocation
/// - data_type: the dtype tag for this element type
/// - from_f64/to_f64: conversion through a common numeric type, used for
///   generic construction and cross-dtype operations
pub trait MatrixElement: MatrixValue + Copy + Sized {
    /// Get the [`DataType`] representation for this element type
    fn data_type() -> DataType;

    /// Get the size in bytes of this element type
    fn size_bytes() -> usize {
        core::mem::size_of::<Self>()
    }

    /// Convert from f64 for generic construction
    ///
    /// This is used for generic matrix construction where the exact
    /// element type may not be known at compile time.
    fn from_f64(value: f64) -> Self;

    /// Convert to f64 for generic operations
    ///
    /// This is used for generic operations where a common numeric
    /// type is needed.
    fn to_f64(self) -> f64;
}

// Implement the element traits for standard numeric types

macro_rules! impl_matrix_element {
    ($type:ty, $variant:ident) => {
        impl MatrixValue for $type {}

        impl MatrixElement for $type {
            fn data_type() -> DataType {
                DataType::$variant
            }

            fn from_f64(value: f64) -> Self {
                value as $type
            }

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_matrix_element!(i32, I32);
impl_matrix_element!(i64, I64);
impl_matrix_element!(u32, U32);
impl_matrix_element!(u64, U64);
impl_matrix_element!(f32, F32);
impl_matrix_element!(f64, F64);
