//! Traversal state over a resolved storage
//!
//! A [`RecurseState`] fixes one side of a traversal: the handle's logical
//! shape and composed offsets plus borrows of the owner's stored shape,
//! default value and top-level row list. Traversals index it by recursion
//! depth, where depth counts up from the leaf: the axis at depth `rec` is
//! `dim - rec - 1`.

use lols_core::DataType;

use crate::list::List;
use crate::storage::Inner;
use crate::value::ListElement;

pub(crate) struct RecurseState<'a, T> {
    dim: usize,
    ref_shape: &'a [usize],
    actual_shape: &'a [usize],
    offset: &'a [usize],
    init: &'a T,
    rows: &'a List<T>,
}

impl<'a, T> RecurseState<'a, T> {
    pub fn new(ref_shape: &'a [usize], offset: &'a [usize], inner: &'a Inner<T>) -> Self {
        let state = RecurseState {
            dim: ref_shape.len(),
            ref_shape,
            actual_shape: &inner.shape,
            offset,
            init: &inner.default,
            rows: &inner.rows,
        };
        debug_assert!((0..state.dim)
            .all(|rec| state.offset(rec) + state.ref_shape(rec) <= state.actual_shape(rec)));
        state
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Logical extent at this recursion depth
    pub fn ref_shape(&self, rec: usize) -> usize {
        self.ref_shape[self.dim - rec - 1]
    }

    /// Stored (owner) extent at this recursion depth
    pub fn actual_shape(&self, rec: usize) -> usize {
        self.actual_shape[self.dim - rec - 1]
    }

    /// Composed offset into the owner frame at this recursion depth
    pub fn offset(&self, rec: usize) -> usize {
        self.offset[self.dim - rec - 1]
    }

    /// The owner's default value
    pub fn init(&self) -> &'a T {
        self.init
    }

    /// The owner's top-level row list
    pub fn top_level_list(&self) -> &'a List<T> {
        self.rows
    }
}

impl<T: ListElement> RecurseState<'_, T> {
    pub fn data_type(&self) -> DataType {
        T::dtype()
    }
}
