//! List-of-lists sparse matrix storage
//!
//! A [`ListMatrix`] is a handle onto shared storage state: the stored
//! shape, the default value and the top-level row list live behind an
//! `Rc<RefCell<..>>` so that views can alias them. The handle itself
//! carries the logical shape and the per-axis offsets into the owner
//! frame. A view composes its offsets with its parent's at construction
//! and points straight at the terminal owner, so resolving a view is O(1)
//! and the `Rc` strong count is exactly one reference per live handle.
//!
//! A coordinate whose value equals the default is never stored; `set`
//! enforces this by turning a default write into a removal over the slice
//! range.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::{debug, instrument, trace};

use lols_core::validation::{validate_coords, validate_slice};
use lols_core::{
    validate_dim, validate_same_shape, DataType, MatrixElement, MatrixOperations, SparseMatrix,
    StorageError,
};

use crate::error::Result;
use crate::list::{List, Value};
use crate::object::{HostGc, ObjectValue};
use crate::recurse::RecurseState;
use crate::slice::Slice;
use crate::traverse;
use crate::value::ListElement;

/// Shape, offset and coordinate vector type
///
/// Matrices rarely exceed four axes; larger axis counts spill to the heap.
pub type Dims = SmallVec<[usize; 4]>;

/// Shared state of an owning storage
#[derive(Debug)]
pub(crate) struct Inner<T> {
    /// Stored extents (the owner's logical shape)
    pub shape: Dims,
    /// The scalar denoting "absent"
    pub default: T,
    /// Top-level row list, at depth dim - 1
    pub rows: List<T>,
}

/// Sparse n-dimensional matrix backed by nested sorted lists
#[derive(Debug)]
pub struct ListMatrix<T: ListElement> {
    inner: Rc<RefCell<Inner<T>>>,
    /// Logical extents of this handle
    shape: Dims,
    /// Composed per-axis offsets into the owner frame
    offset: Dims,
    view: bool,
}

impl<T: ListElement> ListMatrix<T> {
    /// Create an owning storage, taking ownership of shape and default
    #[instrument(skip(default), fields(dim = shape.len(), dtype = %T::dtype()))]
    pub fn new(shape: &[usize], default: T) -> Result<Self> {
        validate_dim(shape.len())?;
        let shape = Dims::from_slice(shape);
        let offset = Dims::from_elem(0, shape.len());
        Ok(ListMatrix {
            inner: Rc::new(RefCell::new(Inner {
                shape: shape.clone(),
                default,
                rows: List::new(),
            })),
            shape,
            offset,
            view: false,
        })
    }

    /// Build an owning storage around already-constructed rows
    pub(crate) fn from_parts(shape: Dims, default: T, rows: List<T>) -> Self {
        let offset = Dims::from_elem(0, shape.len());
        ListMatrix {
            inner: Rc::new(RefCell::new(Inner {
                shape: shape.clone(),
                default,
                rows,
            })),
            shape,
            offset,
            view: false,
        }
    }

    pub fn dim(&self) -> usize {
        self.shape.len()
    }

    /// Logical extents of this handle
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Composed per-axis offsets into the owner frame
    pub fn offsets(&self) -> &[usize] {
        &self.offset
    }

    pub fn data_type(&self) -> DataType {
        T::dtype()
    }

    /// Whether this handle aliases another storage's rows
    pub fn is_view(&self) -> bool {
        self.view
    }

    /// Number of live handles onto the shared storage state
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// The scalar denoting "absent"
    pub fn default_value(&self) -> T {
        self.inner.borrow().default.clone()
    }

    /// Stored value at a coordinate, without the default fallback
    pub fn stored(&self, coords: &[usize]) -> Result<Option<T>> {
        validate_coords(&self.shape, coords)?;
        let inner = self.inner.borrow();
        let dim = self.dim();
        let mut list = &inner.rows;
        for axis in 0..dim - 1 {
            match list.find(self.offset[axis] + coords[axis]) {
                Some(Value::Sub(sub)) => list = sub,
                Some(Value::Scalar(_)) => unreachable!("scalar node above leaf depth"),
                None => return Ok(None),
            }
        }
        match list.find(self.offset[dim - 1] + coords[dim - 1]) {
            Some(Value::Scalar(v)) => Ok(Some(v.clone())),
            Some(Value::Sub(_)) => unreachable!("sublist node at leaf depth"),
            None => Ok(None),
        }
    }

    /// Value at a coordinate: the stored value or the default
    pub fn get(&self, coords: &[usize]) -> Result<T> {
        Ok(match self.stored(coords)? {
            Some(v) => v,
            None => self.inner.borrow().default.clone(),
        })
    }

    /// Aliasing view over a slice of this storage
    ///
    /// The view shares rows and default with the owner, carries its own
    /// shape and offsets, and holds one reference on the owner.
    #[instrument(skip(self))]
    pub fn view(&self, slice: &Slice) -> Result<Self> {
        validate_slice(&self.shape, slice.coords(), slice.lengths())?;
        let mut offset = self.offset.clone();
        for (o, c) in offset.iter_mut().zip(slice.coords()) {
            *o += c;
        }
        Ok(ListMatrix {
            inner: Rc::clone(&self.inner),
            shape: Dims::from_slice(slice.lengths()),
            offset,
            view: true,
        })
    }

    /// Owning deep copy of a slice of this storage
    ///
    /// The copy has the slice's lengths as shape, zero offsets, and a
    /// fresh copy of the default.
    #[instrument(skip(self))]
    pub fn slice(&self, slice: &Slice) -> Result<Self> {
        validate_slice(&self.shape, slice.coords(), slice.lengths())?;
        let base = self.window_base(slice);
        let inner = self.inner.borrow();
        let rows = inner.rows.slice_window(&base, slice.lengths(), 0);
        Ok(Self::from_parts(
            Dims::from_slice(slice.lengths()),
            inner.default.clone(),
            rows,
        ))
    }

    /// Owning deep copy of this storage's logical content
    ///
    /// Materializes views: the copy owns its rows, has zero offsets, and
    /// compares equal to the source.
    #[instrument(skip(self))]
    pub fn copy(&self) -> Self {
        let inner = self.inner.borrow();
        let rows = inner.rows.slice_window(&self.offset, &self.shape, 0);
        Self::from_parts(self.shape.clone(), inner.default.clone(), rows)
    }

    /// Write one value to every coordinate of the slice
    ///
    /// Writing the default value removes the whole range instead, so no
    /// stored node ever equals the default.
    #[instrument(skip(self, value), fields(dim = self.dim()))]
    pub fn set(&self, slice: &Slice, value: T) -> Result<()> {
        validate_slice(&self.shape, slice.coords(), slice.lengths())?;
        let base = self.window_base(slice);
        let mut inner = self.inner.borrow_mut();
        if value == inner.default {
            trace!("default write, removing range");
            inner.rows.remove_range(&base, slice.lengths(), 0);
        } else {
            inner.rows.fill_range(&base, slice.lengths(), 0, &value);
        }
        Ok(())
    }

    /// Remove every stored value in the slice range
    pub fn remove(&self, slice: &Slice) -> Result<()> {
        validate_slice(&self.shape, slice.coords(), slice.lengths())?;
        let base = self.window_base(slice);
        self.inner
            .borrow_mut()
            .rows
            .remove_range(&base, slice.lengths(), 0);
        Ok(())
    }

    /// Raw single-coordinate write, bypassing the default check
    ///
    /// Drills down creating intermediate sublists as needed and
    /// insert-or-replaces the leaf. The caller guarantees the value does
    /// not equal the default; writing the default through this path
    /// violates the storage invariant.
    pub fn insert_unchecked(&self, coords: &[usize], value: T) -> Result<()> {
        validate_coords(&self.shape, coords)?;
        let mut inner = self.inner.borrow_mut();
        let dim = self.dim();
        let mut list = &mut inner.rows;
        for axis in 0..dim - 1 {
            list = list.sublist_entry(self.offset[axis] + coords[axis]);
        }
        list.insert_scalar(self.offset[dim - 1] + coords[dim - 1], value);
        Ok(())
    }

    /// Number of stored elements within this handle's logical frame
    pub fn nnz(&self) -> usize {
        if self.view {
            let mut count = 0;
            self.each_stored(|_, _| count += 1);
            count
        } else {
            self.inner.borrow().rows.count_stored()
        }
    }

    /// Stored entries off the diagonal, two-dimensional storages only
    pub fn count_nondiagonal(&self) -> Result<usize> {
        if self.dim() != 2 {
            return Err(StorageError::NonDiagonalCount.into());
        }
        let inner = self.inner.borrow();
        let mut count = 0;
        let mut row = inner.rows.first.as_deref();
        while let Some(r) = row {
            if let Some(i) = r.key.checked_sub(self.offset[0]) {
                if i < self.shape[0] {
                    let mut col = r.val.as_sub().first.as_deref();
                    while let Some(c) = col {
                        if let Some(j) = c.key.checked_sub(self.offset[1]) {
                            if j < self.shape[1] && i != j {
                                count += 1;
                            }
                        }
                        col = c.next.as_deref();
                    }
                }
            }
            row = r.next.as_deref();
        }
        Ok(count)
    }

    /// Compare logical content against another storage with a custom
    /// element comparator
    ///
    /// Callers guarantee the logical shapes match. Absence on either side
    /// denotes that side's default.
    pub fn eq_with<R: ListElement>(
        &self,
        other: &ListMatrix<R>,
        eq: impl Fn(&T, &R) -> bool,
    ) -> bool {
        debug_assert_eq!(self.shape(), other.shape());
        let li = self.inner.borrow();
        let ri = other.inner.borrow();
        let ls = RecurseState::new(&self.shape, &self.offset, &li);
        let rs = RecurseState::new(&other.shape, &other.offset, &ri);
        traverse::eq_lists(
            &ls,
            &rs,
            ls.top_level_list(),
            rs.top_level_list(),
            self.dim() - 1,
            &eq,
        )
    }

    /// Visit every stored value with its reference indices, in
    /// non-decreasing index order
    pub fn each_stored(&self, mut f: impl FnMut(&T, &[usize])) {
        let inner = self.inner.borrow();
        let state = RecurseState::new(&self.shape, &self.offset, &inner);
        let mut stack = Vec::with_capacity(self.dim());
        traverse::each_stored(
            &state,
            state.top_level_list(),
            self.dim() - 1,
            &mut stack,
            &mut f,
        );
    }

    /// Visit every index tuple of the logical shape, substituting the
    /// default where nothing is stored
    pub fn each_dense(&self, mut f: impl FnMut(&T, &[usize])) {
        let inner = self.inner.borrow();
        let state = RecurseState::new(&self.shape, &self.offset, &inner);
        let mut stack = Vec::with_capacity(self.dim());
        traverse::each_dense(
            &state,
            state.top_level_list(),
            self.dim() - 1,
            &mut stack,
            &mut f,
        );
    }

    /// Owning copy with every element cast to a new dtype
    ///
    /// Views are first materialized, then cast.
    #[instrument(skip(self), fields(from = %T::dtype(), to = %L::dtype()))]
    pub fn cast_copy<L>(&self) -> ListMatrix<L>
    where
        T: MatrixElement,
        L: MatrixElement + ListElement,
    {
        if self.view {
            return self.copy().cast_copy();
        }
        let inner = self.inner.borrow();
        let default = L::from_f64(inner.default.to_f64());
        let rows = inner.rows.cast_contents::<L>();
        ListMatrix::from_parts(self.shape.clone(), default, rows)
    }

    fn window_base(&self, slice: &Slice) -> Dims {
        self.offset
            .iter()
            .zip(slice.coords())
            .map(|(o, c)| o + c)
            .collect()
    }
}

/// Element-wise merge of two aligned storages
///
/// Produces an owning storage whose default is `f(left default, right
/// default)`, or the supplied default. Where only one side stores a value
/// the other side's default is the phantom partner. Results equal to the
/// output default are not stored.
#[instrument(skip(left, right, default, f))]
pub fn map_merged<L, R, O, F>(
    left: &ListMatrix<L>,
    right: &ListMatrix<R>,
    default: Option<O>,
    mut f: F,
) -> Result<ListMatrix<O>>
where
    L: ListElement,
    R: ListElement,
    O: ListElement,
    F: FnMut(&L, &R) -> O,
{
    validate_same_shape(left.shape(), right.shape())?;
    let li = left.inner.borrow();
    let ri = right.inner.borrow();
    let ls = RecurseState::new(&left.shape, &left.offset, &li);
    let rs = RecurseState::new(&right.shape, &right.offset, &ri);
    debug!(
        left = %ls.data_type(),
        right = %rs.data_type(),
        "merged map"
    );

    let out_default = match default {
        Some(d) => d,
        None => f(ls.init(), rs.init()),
    };

    let mut rows = List::new();
    traverse::map_merged_lists(
        &ls,
        &rs,
        &mut rows,
        ls.top_level_list(),
        rs.top_level_list(),
        ls.dim() - 1,
        &out_default,
        &mut f,
    );

    Ok(ListMatrix::from_parts(
        left.shape.clone(),
        out_default,
        rows,
    ))
}

impl<T: ListElement> PartialEq for ListMatrix<T> {
    /// Logical content equality: identical shapes and identical values at
    /// every coordinate, with absence denoting the default
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.eq_with(other, |a, b| a == b)
    }
}

impl<T: ListElement> SparseMatrix for ListMatrix<T> {
    type Element = T;

    fn get_element(&self, coords: &[usize]) -> Option<T> {
        self.stored(coords).ok().flatten()
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn nnz(&self) -> usize {
        self.nnz()
    }
}

impl<T: ListElement> MatrixOperations for ListMatrix<T> {
    fn stored_entries(&self) -> Vec<(Vec<usize>, T)> {
        let mut out = Vec::new();
        self.each_stored(|v, idx| out.push((idx.to_vec(), v.clone())));
        out
    }
}

impl ListMatrix<ObjectValue> {
    /// Report every owned host reference to the host garbage collector
    ///
    /// Visits the default value and every stored leaf, including entries
    /// outside this handle's logical frame: they are still owned by the
    /// shared rows.
    pub fn mark(&self, gc: &mut dyn HostGc) {
        let inner = self.inner.borrow();
        gc.mark(&inner.default);
        inner.rows.visit_scalars(&mut |v| gc.mark(v));
    }
}
