//! LOLS - List-of-lists sparse n-dimensional matrix storage
//!
//! This library stores an n-dimensional array of typed scalar values as
//! nested sorted singly-linked lists. A designated default value denotes
//! "absent": any coordinate whose value equals the default is simply not
//! stored, which keeps matrices dominated by a single background value
//! compact.
//!
//! The typed surface is [`ListMatrix`]; the dtype-erased surface for
//! callers that only know dtypes at runtime is [`DynamicMatrix`]. Views
//! ([`ListMatrix::view`]) alias the source storage through per-axis
//! offsets and logical lengths; traversals walk two such possibly-offset
//! structures in lock-step, honoring each side's default value.
//!
//! Storage handles are single-threaded by construction (`Rc`-backed, not
//! `Send`); readers may share a storage freely as long as no writer runs.

// Re-export core functionality
pub use lols_core::*;

pub mod dynamic;
pub mod error;
pub mod object;
pub mod slice;
pub mod storage;
pub mod value;

mod list;
mod recurse;
mod traverse;

pub use dynamic::{DynamicMatrix, Operand};
pub use error::{Error, Result};
pub use object::{HostGc, HostValue, ObjectValue};
pub use slice::Slice;
pub use storage::{map_merged, Dims, ListMatrix};
pub use value::{ListElement, PairEq, ScalarValue};
