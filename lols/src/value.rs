//! Dynamic boundary values and the element contract of the list storage
//!
//! [`ScalarValue`] is the dtype-erased scalar exchanged with callers of the
//! dynamic layer, one variant per dtype. [`ListElement`] is what the list
//! storage requires of an element type on top of [`MatrixValue`]: its dtype
//! tag and conversion to/from the boundary scalar. [`PairEq`] supplies the
//! per-dtype-pair comparison used by cross-dtype equality.

use lols_core::{DataType, MatrixElement, MatrixValue};

use crate::object::ObjectValue;

/// A dtype-erased scalar crossing the storage boundary
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Object(ObjectValue),
}

impl ScalarValue {
    /// The dtype this value carries
    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::I32(_) => DataType::I32,
            ScalarValue::I64(_) => DataType::I64,
            ScalarValue::U32(_) => DataType::U32,
            ScalarValue::U64(_) => DataType::U64,
            ScalarValue::F32(_) => DataType::F32,
            ScalarValue::F64(_) => DataType::F64,
            ScalarValue::Object(_) => DataType::Object,
        }
    }

    /// The smallest dtype that represents this value
    ///
    /// Used to pick a storage dtype when a bare scalar stands in for a
    /// matrix operand.
    pub fn min_dtype(&self) -> DataType {
        match self {
            ScalarValue::I32(_) => DataType::I32,
            ScalarValue::I64(v) => {
                if i32::try_from(*v).is_ok() {
                    DataType::I32
                } else {
                    DataType::I64
                }
            }
            ScalarValue::U32(_) => DataType::U32,
            ScalarValue::U64(v) => {
                if u32::try_from(*v).is_ok() {
                    DataType::U32
                } else {
                    DataType::U64
                }
            }
            ScalarValue::F32(_) => DataType::F32,
            ScalarValue::F64(_) => DataType::F64,
            ScalarValue::Object(_) => DataType::Object,
        }
    }

    /// Numeric view of this value, when it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::I32(v) => Some(*v as f64),
            ScalarValue::I64(v) => Some(*v as f64),
            ScalarValue::U32(v) => Some(*v as f64),
            ScalarValue::U64(v) => Some(*v as f64),
            ScalarValue::F32(v) => Some(*v as f64),
            ScalarValue::F64(v) => Some(*v),
            ScalarValue::Object(_) => None,
        }
    }
}

/// Element contract of the list storage
///
/// Extends the typed-value abstraction with the dtype tag and the
/// conversions the dynamic layer needs at the storage boundary.
pub trait ListElement: MatrixValue {
    /// The dtype tag of this element type
    fn dtype() -> DataType;

    /// Convert a stored element to the boundary scalar
    fn to_scalar(&self) -> ScalarValue;

    /// Convert a boundary scalar to this element type
    ///
    /// Numeric values convert with numeric casts; returns `None` when no
    /// conversion exists (an object into a numeric storage).
    fn from_scalar(value: &ScalarValue) -> Option<Self>;
}

macro_rules! impl_list_element {
    ($type:ty, $variant:ident) => {
        impl ListElement for $type {
            fn dtype() -> DataType {
                <$type as MatrixElement>::data_type()
            }

            fn to_scalar(&self) -> ScalarValue {
                ScalarValue::$variant(*self)
            }

            fn from_scalar(value: &ScalarValue) -> Option<Self> {
                match value {
                    ScalarValue::I32(v) => Some(*v as $type),
                    ScalarValue::I64(v) => Some(*v as $type),
                    ScalarValue::U32(v) => Some(*v as $type),
                    ScalarValue::U64(v) => Some(*v as $type),
                    ScalarValue::F32(v) => Some(*v as $type),
                    ScalarValue::F64(v) => Some(*v as $type),
                    ScalarValue::Object(_) => None,
                }
            }
        }
    };
}

impl_list_element!(i32, I32);
impl_list_element!(i64, I64);
impl_list_element!(u32, U32);
impl_list_element!(u64, U64);
impl_list_element!(f32, F32);
impl_list_element!(f64, F64);

impl ListElement for ObjectValue {
    fn dtype() -> DataType {
        DataType::Object
    }

    fn to_scalar(&self) -> ScalarValue {
        ScalarValue::Object(self.clone())
    }

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Object(o) => Some(o.clone()),
            // a numeric scalar written into an object storage is wrapped
            // as a host value
            numeric => Some(ObjectValue::new(numeric.clone())),
        }
    }
}

/// Per-dtype-pair equality used by cross-dtype comparisons
///
/// Same dtype compares exactly; integer pairs widen to a common integer
/// type; every pair involving a float (or mixing signedness) compares
/// through f64.
pub trait PairEq<R> {
    fn pair_eq(&self, other: &R) -> bool;
}

macro_rules! impl_pair_eq {
    ($left:ty, $right:ty, $common:ty) => {
        impl PairEq<$right> for $left {
            fn pair_eq(&self, other: &$right) -> bool {
                (*self as $common) == (*other as $common)
            }
        }
    };
}

// same dtype: exact
impl_pair_eq!(i32, i32, i32);
impl_pair_eq!(i64, i64, i64);
impl_pair_eq!(u32, u32, u32);
impl_pair_eq!(u64, u64, u64);
impl_pair_eq!(f32, f32, f32);
impl_pair_eq!(f64, f64, f64);

// signed pairs widen to i64
impl_pair_eq!(i32, i64, i64);
impl_pair_eq!(i64, i32, i64);

// unsigned pairs widen to u64
impl_pair_eq!(u32, u64, u64);
impl_pair_eq!(u64, u32, u64);

// mixed signedness and float pairs compare through f64
impl_pair_eq!(i32, u32, f64);
impl_pair_eq!(i32, u64, f64);
impl_pair_eq!(i32, f32, f64);
impl_pair_eq!(i32, f64, f64);
impl_pair_eq!(i64, u32, f64);
impl_pair_eq!(i64, u64, f64);
impl_pair_eq!(i64, f32, f64);
impl_pair_eq!(i64, f64, f64);
impl_pair_eq!(u32, i32, f64);
impl_pair_eq!(u32, i64, f64);
impl_pair_eq!(u32, f32, f64);
impl_pair_eq!(u32, f64, f64);
impl_pair_eq!(u64, i32, f64);
impl_pair_eq!(u64, i64, f64);
impl_pair_eq!(u64, f32, f64);
impl_pair_eq!(u64, f64, f64);
impl_pair_eq!(f32, i32, f64);
impl_pair_eq!(f32, i64, f64);
impl_pair_eq!(f32, u32, f64);
impl_pair_eq!(f32, u64, f64);
impl_pair_eq!(f32, f64, f64);
impl_pair_eq!(f64, i32, f64);
impl_pair_eq!(f64, i64, f64);
impl_pair_eq!(f64, u32, f64);
impl_pair_eq!(f64, u64, f64);
impl_pair_eq!(f64, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_dtype_shrinks_integers() {
        assert_eq!(ScalarValue::I64(7).min_dtype(), DataType::I32);
        assert_eq!(ScalarValue::I64(1 << 40).min_dtype(), DataType::I64);
        assert_eq!(ScalarValue::U64(7).min_dtype(), DataType::U32);
        assert_eq!(ScalarValue::F64(7.0).min_dtype(), DataType::F64);
    }

    #[test]
    fn from_scalar_converts_numerics() {
        assert_eq!(i32::from_scalar(&ScalarValue::F64(2.75)), Some(2));
        assert_eq!(f64::from_scalar(&ScalarValue::I32(3)), Some(3.0));
        assert_eq!(u64::from_scalar(&ScalarValue::U32(9)), Some(9));
    }

    #[test]
    fn from_scalar_rejects_objects_for_numerics() {
        let obj = ScalarValue::Object(ObjectValue::new(1i64));
        assert_eq!(i32::from_scalar(&obj), None);
        assert_eq!(f64::from_scalar(&obj), None);
    }

    #[test]
    fn object_from_scalar_wraps_numerics() {
        let wrapped = ObjectValue::from_scalar(&ScalarValue::I64(5)).unwrap();
        assert_eq!(wrapped.downcast_ref::<ScalarValue>(), Some(&ScalarValue::I64(5)));
    }

    #[test]
    fn pair_eq_widens() {
        assert!(3i32.pair_eq(&3i64));
        assert!(3u32.pair_eq(&3.0f64));
        assert!(!3i64.pair_eq(&4i32));
        assert!((-1i32).pair_eq(&-1i64));
        assert!(!(-1i64).pair_eq(&u64::MAX));
    }

    #[test]
    fn round_trip_through_scalar() {
        assert_eq!(i64::from_scalar(&42i64.to_scalar()), Some(42));
        assert_eq!(42i64.to_scalar().data_type(), DataType::I64);
    }
}
