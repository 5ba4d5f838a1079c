//! Dtype-erased matrix handle and pairwise dtype dispatch
//!
//! [`DynamicMatrix`] closes the dtype set into one enum so callers that
//! only know dtypes at runtime can drive the typed storage. Pairwise
//! operations (equality, merged map, cast) dispatch over the dtype x dtype
//! table spelled out by the nested matches below; combinations without an
//! entry fail rather than guess.

use tracing::instrument;

use lols_core::{validate_same_shape, DataType, StorageError};

use crate::error::{Error, Result};
use crate::object::{HostGc, ObjectValue};
use crate::slice::Slice;
use crate::storage::{map_merged, ListMatrix};
use crate::value::{ListElement, PairEq, ScalarValue};

/// A list storage of any dtype
#[derive(Debug)]
pub enum DynamicMatrix {
    I32(ListMatrix<i32>),
    I64(ListMatrix<i64>),
    U32(ListMatrix<u32>),
    U64(ListMatrix<u64>),
    F32(ListMatrix<f32>),
    F64(ListMatrix<f64>),
    Object(ListMatrix<ObjectValue>),
}

/// Right operand of a binary operation: a matrix or a bare scalar
pub enum Operand<'a> {
    Scalar(ScalarValue),
    Matrix(&'a DynamicMatrix),
}

macro_rules! per_variant {
    ($self:expr, |$m:ident| $body:expr) => {
        match $self {
            DynamicMatrix::I32($m) => $body,
            DynamicMatrix::I64($m) => $body,
            DynamicMatrix::U32($m) => $body,
            DynamicMatrix::U64($m) => $body,
            DynamicMatrix::F32($m) => $body,
            DynamicMatrix::F64($m) => $body,
            DynamicMatrix::Object($m) => $body,
        }
    };
}

macro_rules! per_variant_wrap {
    ($self:expr, |$m:ident| $body:expr) => {
        match $self {
            DynamicMatrix::I32($m) => DynamicMatrix::I32($body),
            DynamicMatrix::I64($m) => DynamicMatrix::I64($body),
            DynamicMatrix::U32($m) => DynamicMatrix::U32($body),
            DynamicMatrix::U64($m) => DynamicMatrix::U64($body),
            DynamicMatrix::F32($m) => DynamicMatrix::F32($body),
            DynamicMatrix::F64($m) => DynamicMatrix::F64($body),
            DynamicMatrix::Object($m) => DynamicMatrix::Object($body),
        }
    };
}

fn build<T: ListElement>(shape: &[usize], default: &ScalarValue) -> Result<ListMatrix<T>> {
    let default = T::from_scalar(default).ok_or(StorageError::UnsupportedValueType)?;
    ListMatrix::new(shape, default)
}

fn set_scalar<T: ListElement>(m: &ListMatrix<T>, slice: &Slice, v: &ScalarValue) -> Result<()> {
    let converted = T::from_scalar(v).ok_or(StorageError::UnsupportedValueType)?;
    m.set(slice, converted)
}

fn merge_pair<L: ListElement, R: ListElement>(
    left: &ListMatrix<L>,
    right: &ListMatrix<R>,
    default: Option<ObjectValue>,
    f: &mut dyn FnMut(ScalarValue, ScalarValue) -> ObjectValue,
) -> Result<ListMatrix<ObjectValue>> {
    map_merged(left, right, default, |a, b| f(a.to_scalar(), b.to_scalar()))
}

impl DynamicMatrix {
    /// Create an owning storage of the given dtype
    ///
    /// The default value is converted to the storage dtype first.
    #[instrument(skip(default), fields(dtype = %dtype))]
    pub fn new(dtype: DataType, shape: &[usize], default: &ScalarValue) -> Result<Self> {
        Ok(match dtype {
            DataType::I32 => DynamicMatrix::I32(build(shape, default)?),
            DataType::I64 => DynamicMatrix::I64(build(shape, default)?),
            DataType::U32 => DynamicMatrix::U32(build(shape, default)?),
            DataType::U64 => DynamicMatrix::U64(build(shape, default)?),
            DataType::F32 => DynamicMatrix::F32(build(shape, default)?),
            DataType::F64 => DynamicMatrix::F64(build(shape, default)?),
            DataType::Object => DynamicMatrix::Object(build(shape, default)?),
        })
    }

    pub fn dim(&self) -> usize {
        per_variant!(self, |m| m.dim())
    }

    pub fn shape(&self) -> &[usize] {
        per_variant!(self, |m| m.shape())
    }

    pub fn data_type(&self) -> DataType {
        per_variant!(self, |m| m.data_type())
    }

    pub fn nnz(&self) -> usize {
        per_variant!(self, |m| m.nnz())
    }

    pub fn is_view(&self) -> bool {
        per_variant!(self, |m| m.is_view())
    }

    pub fn ref_count(&self) -> usize {
        per_variant!(self, |m| m.ref_count())
    }

    pub fn default_value(&self) -> ScalarValue {
        per_variant!(self, |m| m.default_value().to_scalar())
    }

    /// Value at a coordinate: the stored value or the default
    pub fn get(&self, coords: &[usize]) -> Result<ScalarValue> {
        per_variant!(self, |m| Ok(m.get(coords)?.to_scalar()))
    }

    /// Stored value at a coordinate, without the default fallback
    pub fn stored(&self, coords: &[usize]) -> Result<Option<ScalarValue>> {
        per_variant!(self, |m| Ok(m.stored(coords)?.map(|v| v.to_scalar())))
    }

    /// Write a value to every coordinate of the slice
    ///
    /// A matrix operand is rejected: slice-assignment from a matrix is
    /// not implemented. A scalar operand is converted to the storage
    /// dtype; a converted value equal to the default removes the range.
    pub fn set(&self, slice: &Slice, value: &Operand<'_>) -> Result<()> {
        match value {
            Operand::Matrix(_) => Err(StorageError::MatrixSliceAssignment.into()),
            Operand::Scalar(v) => per_variant!(self, |m| set_scalar(m, slice, v)),
        }
    }

    /// Remove every stored value in the slice range
    pub fn remove(&self, slice: &Slice) -> Result<()> {
        per_variant!(self, |m| m.remove(slice))
    }

    /// Aliasing view over a slice of this storage
    pub fn view(&self, slice: &Slice) -> Result<DynamicMatrix> {
        Ok(per_variant_wrap!(self, |m| m.view(slice)?))
    }

    /// Owning deep copy of a slice of this storage
    pub fn slice(&self, slice: &Slice) -> Result<DynamicMatrix> {
        Ok(per_variant_wrap!(self, |m| m.slice(slice)?))
    }

    /// Owning deep copy; materializes views
    pub fn copy(&self) -> DynamicMatrix {
        per_variant_wrap!(self, |m| m.copy())
    }

    /// Logical content equality across dtypes
    ///
    /// Same dtype compares exactly; numeric pairs compare through the
    /// pairwise widening table; object storages only compare against
    /// object storages.
    pub fn content_eq(&self, other: &DynamicMatrix) -> Result<bool> {
        validate_same_shape(self.shape(), other.shape())?;
        use DynamicMatrix::*;
        macro_rules! against_numeric {
            ($l:ident) => {
                match other {
                    I32(r) => Ok($l.eq_with(r, |a, b| a.pair_eq(b))),
                    I64(r) => Ok($l.eq_with(r, |a, b| a.pair_eq(b))),
                    U32(r) => Ok($l.eq_with(r, |a, b| a.pair_eq(b))),
                    U64(r) => Ok($l.eq_with(r, |a, b| a.pair_eq(b))),
                    F32(r) => Ok($l.eq_with(r, |a, b| a.pair_eq(b))),
                    F64(r) => Ok($l.eq_with(r, |a, b| a.pair_eq(b))),
                    Object(_) => Err(self.no_dispatch(other)),
                }
            };
        }
        match self {
            I32(l) => against_numeric!(l),
            I64(l) => against_numeric!(l),
            U32(l) => against_numeric!(l),
            U64(l) => against_numeric!(l),
            F32(l) => against_numeric!(l),
            F64(l) => against_numeric!(l),
            Object(l) => match other {
                Object(r) => Ok(l.eq_with(r, |a, b| a == b)),
                _ => Err(self.no_dispatch(other)),
            },
        }
    }

    /// Element-wise merge with another matrix or a bare scalar
    ///
    /// Produces an object-dtype storage. The result default is
    /// `f(left default, right default)` unless supplied. A scalar right
    /// operand stands in for a matrix of its minimum dtype shaped like
    /// the left operand.
    #[instrument(skip(self, right, default, f), fields(left = %self.data_type()))]
    pub fn map_merged(
        &self,
        right: &Operand<'_>,
        default: Option<ObjectValue>,
        f: &mut dyn FnMut(ScalarValue, ScalarValue) -> ObjectValue,
    ) -> Result<DynamicMatrix> {
        match right {
            Operand::Scalar(v) => {
                let stand_in = DynamicMatrix::new(v.min_dtype(), self.shape(), v)?;
                self.map_merged(&Operand::Matrix(&stand_in), default, f)
            }
            Operand::Matrix(rhs) => {
                use DynamicMatrix::*;
                macro_rules! against {
                    ($l:ident) => {
                        match rhs {
                            I32(r) => merge_pair($l, r, default, f),
                            I64(r) => merge_pair($l, r, default, f),
                            U32(r) => merge_pair($l, r, default, f),
                            U64(r) => merge_pair($l, r, default, f),
                            F32(r) => merge_pair($l, r, default, f),
                            F64(r) => merge_pair($l, r, default, f),
                            Object(r) => merge_pair($l, r, default, f),
                        }
                    };
                }
                let merged = match self {
                    I32(l) => against!(l),
                    I64(l) => against!(l),
                    U32(l) => against!(l),
                    U64(l) => against!(l),
                    F32(l) => against!(l),
                    F64(l) => against!(l),
                    Object(l) => against!(l),
                }?;
                Ok(DynamicMatrix::Object(merged))
            }
        }
    }

    /// Visit every stored value with its reference indices
    pub fn each_stored(&self, f: &mut dyn FnMut(ScalarValue, &[usize])) {
        per_variant!(self, |m| m.each_stored(|v, idx| f(v.to_scalar(), idx)))
    }

    /// Visit every index tuple of the logical shape, substituting the
    /// default where nothing is stored
    pub fn each_dense(&self, f: &mut dyn FnMut(ScalarValue, &[usize])) {
        per_variant!(self, |m| m.each_dense(|v, idx| f(v.to_scalar(), idx)))
    }

    /// Owning copy with every element cast to a new dtype
    pub fn cast(&self, dtype: DataType) -> Result<DynamicMatrix> {
        use DynamicMatrix::*;
        if dtype == self.data_type() {
            return Ok(self.copy());
        }
        macro_rules! cast_numeric {
            ($l:ident) => {
                match dtype {
                    DataType::I32 => Ok(I32($l.cast_copy())),
                    DataType::I64 => Ok(I64($l.cast_copy())),
                    DataType::U32 => Ok(U32($l.cast_copy())),
                    DataType::U64 => Ok(U64($l.cast_copy())),
                    DataType::F32 => Ok(F32($l.cast_copy())),
                    DataType::F64 => Ok(F64($l.cast_copy())),
                    DataType::Object => Err(self.cast_error(dtype)),
                }
            };
        }
        match self {
            I32(l) => cast_numeric!(l),
            I64(l) => cast_numeric!(l),
            U32(l) => cast_numeric!(l),
            U64(l) => cast_numeric!(l),
            F32(l) => cast_numeric!(l),
            F64(l) => cast_numeric!(l),
            Object(_) => Err(self.cast_error(dtype)),
        }
    }

    /// Stored entries off the diagonal, two-dimensional storages only
    pub fn count_nondiagonal(&self) -> Result<usize> {
        per_variant!(self, |m| m.count_nondiagonal())
    }

    /// Matrix multiplication is not implemented for list storage
    pub fn multiply(&self, _other: &DynamicMatrix) -> Result<DynamicMatrix> {
        Err(StorageError::MatrixMultiply.into())
    }

    /// Transposition is not implemented for list storage
    pub fn transpose(&self) -> Result<DynamicMatrix> {
        Err(StorageError::Transpose.into())
    }

    /// Report owned host references to the host garbage collector
    ///
    /// Only object storages own host references; other dtypes have
    /// nothing to report.
    pub fn mark(&self, gc: &mut dyn HostGc) {
        if let DynamicMatrix::Object(m) = self {
            m.mark(gc);
        }
    }

    fn no_dispatch(&self, other: &DynamicMatrix) -> Error {
        Error::NoDispatch {
            left: self.data_type(),
            right: other.data_type(),
        }
    }

    fn cast_error(&self, to: DataType) -> Error {
        Error::Cast {
            from: self.data_type(),
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_matrix(shape: &[usize], default: i64) -> DynamicMatrix {
        DynamicMatrix::new(DataType::I64, shape, &ScalarValue::I64(default)).unwrap()
    }

    fn set_one(m: &DynamicMatrix, coords: &[usize], v: i64) {
        m.set(
            &Slice::single(coords),
            &Operand::Scalar(ScalarValue::I64(v)),
        )
        .unwrap();
    }

    #[test]
    fn empty_storages_with_unequal_defaults_differ() {
        let a = int_matrix(&[3, 3], 0);
        let b = int_matrix(&[3, 3], 1);
        assert!(!a.content_eq(&b).unwrap());
        let c = int_matrix(&[3, 3], 0);
        assert!(a.content_eq(&c).unwrap());
    }

    #[test]
    fn stored_values_decide_equality() {
        let a = int_matrix(&[3, 3], 0);
        set_one(&a, &[1, 1], 5);
        let b = int_matrix(&[3, 3], 0);
        set_one(&b, &[1, 1], 5);
        assert!(a.content_eq(&b).unwrap());
        set_one(&b, &[1, 1], 6);
        assert!(!a.content_eq(&b).unwrap());
    }

    #[test]
    fn eq_dispatches_across_numeric_dtypes() {
        let a = int_matrix(&[2, 2], 0);
        set_one(&a, &[0, 1], 3);
        let b = DynamicMatrix::new(DataType::F64, &[2, 2], &ScalarValue::F64(0.0)).unwrap();
        b.set(
            &Slice::single(&[0, 1]),
            &Operand::Scalar(ScalarValue::F64(3.0)),
        )
        .unwrap();
        assert!(a.content_eq(&b).unwrap());
        b.set(
            &Slice::single(&[0, 1]),
            &Operand::Scalar(ScalarValue::F64(3.5)),
        )
        .unwrap();
        assert!(!a.content_eq(&b).unwrap());
    }

    #[test]
    fn eq_has_no_entry_for_object_vs_numeric() {
        let a = int_matrix(&[2, 2], 0);
        let b = DynamicMatrix::new(
            DataType::Object,
            &[2, 2],
            &ScalarValue::Object(ObjectValue::new(0i64)),
        )
        .unwrap();
        let err = a.content_eq(&b).unwrap_err();
        assert_eq!(
            err,
            Error::NoDispatch {
                left: DataType::I64,
                right: DataType::Object,
            }
        );
    }

    #[test]
    fn eq_rejects_shape_mismatch() {
        let a = int_matrix(&[2, 2], 0);
        let b = int_matrix(&[3, 3], 0);
        assert!(a.content_eq(&b).is_err());
    }

    #[test]
    fn merged_map_sums_into_object_storage() {
        let a = int_matrix(&[3, 3], 0);
        set_one(&a, &[0, 0], 1);
        set_one(&a, &[1, 2], 3);
        let b = int_matrix(&[3, 3], 0);
        set_one(&b, &[0, 0], 4);
        set_one(&b, &[2, 1], 7);

        let mut add = |x: ScalarValue, y: ScalarValue| {
            ObjectValue::new(x.as_f64().unwrap() + y.as_f64().unwrap())
        };
        let sum = a.map_merged(&Operand::Matrix(&b), None, &mut add).unwrap();

        assert_eq!(sum.data_type(), DataType::Object);
        assert_eq!(sum.default_value(), ScalarValue::Object(ObjectValue::new(0.0f64)));
        assert_eq!(sum.nnz(), 3);
        let at = |coords: &[usize]| match sum.stored(coords).unwrap() {
            Some(ScalarValue::Object(o)) => o.downcast_ref::<f64>().copied(),
            _ => None,
        };
        assert_eq!(at(&[0, 0]), Some(5.0));
        assert_eq!(at(&[1, 2]), Some(3.0));
        assert_eq!(at(&[2, 1]), Some(7.0));
    }

    #[test]
    fn merged_map_accepts_scalar_operand() {
        let a = int_matrix(&[2, 2], 0);
        set_one(&a, &[1, 1], 2);
        let mut add = |x: ScalarValue, y: ScalarValue| {
            ObjectValue::new(x.as_f64().unwrap() + y.as_f64().unwrap())
        };
        let out = a
            .map_merged(&Operand::Scalar(ScalarValue::I64(10)), None, &mut add)
            .unwrap();
        // default is f(0, 10) = 10; only the stored cell produces 12
        assert_eq!(out.nnz(), 1);
        match out.stored(&[1, 1]).unwrap() {
            Some(ScalarValue::Object(o)) => {
                assert_eq!(o.downcast_ref::<f64>(), Some(&12.0))
            }
            other => panic!("expected stored object, got {other:?}"),
        }
    }

    #[test]
    fn set_rejects_matrix_operand() {
        let a = int_matrix(&[2, 2], 0);
        let b = int_matrix(&[2, 2], 0);
        let err = a
            .set(&Slice::single(&[0, 0]), &Operand::Matrix(&b))
            .unwrap_err();
        assert_eq!(err, Error::Storage(StorageError::MatrixSliceAssignment));
    }

    #[test]
    fn set_converts_scalar_to_storage_dtype() {
        let a = int_matrix(&[2, 2], 0);
        a.set(
            &Slice::single(&[0, 0]),
            &Operand::Scalar(ScalarValue::F64(2.75)),
        )
        .unwrap();
        assert_eq!(a.get(&[0, 0]).unwrap(), ScalarValue::I64(2));
    }

    #[test]
    fn set_converted_default_removes_range() {
        let a = int_matrix(&[2, 2], 0);
        set_one(&a, &[0, 0], 9);
        // 0.25 converts to 0, the default, so the write removes
        a.set(
            &Slice::single(&[0, 0]),
            &Operand::Scalar(ScalarValue::F64(0.25)),
        )
        .unwrap();
        assert_eq!(a.nnz(), 0);
    }

    #[test]
    fn object_storage_rejects_nothing_numeric_but_numeric_rejects_objects() {
        let obj = DynamicMatrix::new(
            DataType::Object,
            &[2, 2],
            &ScalarValue::Object(ObjectValue::new(0i64)),
        )
        .unwrap();
        obj.set(
            &Slice::single(&[0, 0]),
            &Operand::Scalar(ScalarValue::I64(3)),
        )
        .unwrap();

        let num = int_matrix(&[2, 2], 0);
        let err = num
            .set(
                &Slice::single(&[0, 0]),
                &Operand::Scalar(ScalarValue::Object(ObjectValue::new(3i64))),
            )
            .unwrap_err();
        assert_eq!(err, Error::Storage(StorageError::UnsupportedValueType));
    }

    #[test]
    fn cast_preserves_content() {
        let a = int_matrix(&[2, 2], 1);
        set_one(&a, &[0, 1], 300);
        let f = a.cast(DataType::F64).unwrap();
        assert_eq!(f.data_type(), DataType::F64);
        assert_eq!(f.get(&[0, 1]).unwrap(), ScalarValue::F64(300.0));
        assert_eq!(f.default_value(), ScalarValue::F64(1.0));
        let back = f.cast(DataType::I64).unwrap();
        assert!(back.content_eq(&a).unwrap());
    }

    #[test]
    fn cast_to_object_has_no_entry() {
        let a = int_matrix(&[2, 2], 0);
        assert!(a.cast(DataType::Object).is_err());
        let same = a.cast(DataType::I64).unwrap();
        assert!(same.content_eq(&a).unwrap());
    }

    #[test]
    fn unimplemented_surfaces_fail_explicitly() {
        let a = int_matrix(&[2, 2], 0);
        let b = int_matrix(&[2, 2], 0);
        assert_eq!(
            a.multiply(&b).unwrap_err(),
            Error::Storage(StorageError::MatrixMultiply)
        );
        assert_eq!(
            a.transpose().unwrap_err(),
            Error::Storage(StorageError::Transpose)
        );
        let three = DynamicMatrix::new(DataType::I64, &[2, 2, 2], &ScalarValue::I64(0)).unwrap();
        assert_eq!(
            three.count_nondiagonal().unwrap_err(),
            Error::Storage(StorageError::NonDiagonalCount)
        );
    }

    #[test]
    fn view_and_slice_round_trip_through_dispatch() {
        let a = int_matrix(&[4, 4], 0);
        set_one(&a, &[2, 2], 7);
        let v = a.view(&Slice::new(&[2, 2], &[2, 2])).unwrap();
        assert!(v.is_view());
        assert_eq!(a.ref_count(), 2);
        assert_eq!(v.get(&[0, 0]).unwrap(), ScalarValue::I64(7));
        let c = v.copy();
        assert!(!c.is_view());
        assert!(c.content_eq(&v).unwrap());
    }

    #[test]
    fn mark_reaches_objects_only() {
        struct Collector(usize);
        impl HostGc for Collector {
            fn mark(&mut self, _value: &ObjectValue) {
                self.0 += 1;
            }
        }

        let num = int_matrix(&[2, 2], 0);
        let mut gc = Collector(0);
        num.mark(&mut gc);
        assert_eq!(gc.0, 0);

        let obj = DynamicMatrix::new(
            DataType::Object,
            &[2, 2],
            &ScalarValue::Object(ObjectValue::new(0i64)),
        )
        .unwrap();
        obj.set(
            &Slice::single(&[0, 1]),
            &Operand::Scalar(ScalarValue::Object(ObjectValue::new(4i64))),
        )
        .unwrap();
        obj.mark(&mut gc);
        // the default plus one stored leaf
        assert_eq!(gc.0, 2);
    }

    #[test]
    fn scalar_operand_uses_minimum_dtype() {
        let a = int_matrix(&[2, 2], 0);
        let small = ScalarValue::I64(7);
        assert_eq!(small.min_dtype(), DataType::I32);
        let mut keep_left = |x: ScalarValue, _y: ScalarValue| ObjectValue::new(x);
        // conversion through the stand-in storage must not disturb values
        let out = a
            .map_merged(&Operand::Scalar(small), None, &mut keep_left)
            .unwrap();
        assert_eq!(out.data_type(), DataType::Object);
    }
}
