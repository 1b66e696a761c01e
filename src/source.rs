//! Type tags and the type-erased stream source.
//!
//! This module provides:
//! - [`TypeTag`]: a lightweight runtime type identifier, used to describe a
//!   stream's source element type without carrying the generic parameter.
//! - [`Source`]: a type-erased, shared view over the materialized sequence a
//!   [`Stream`](crate::Stream) was built from. The runner asks it for owned copies
//!   of contiguous ranges, so the source itself is never consumed and every
//!   action can replay it.

use std::any::{type_name, Any, TypeId};
use std::ops::Range;
use std::sync::Arc;

/// One element travelling through a plan.
///
/// Operations downcast it to the type they expect; the stream builder keeps
/// those types consistent.
pub(crate) type Value = Box<dyn Any + Send>;

/// A lightweight runtime type tag for debugging and assertions.
///
/// ```
/// use monadflow::source::TypeTag;
/// let tag = TypeTag::of::<u32>();
/// assert_eq!(tag.name, "u32");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    /// Stable Rust type identifier.
    pub id: TypeId,
    /// Human-readable type name (best-effort).
    pub name: &'static str,
}

impl TypeTag {
    /// Construct a tag for `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

/// Type-erased access to a materialized sequence.
///
/// Implementations must hand out independent copies: `values` is called once
/// per batch, possibly from several worker threads at the same time.
pub(crate) trait Source: Send + Sync {
    /// Number of elements.
    fn len(&self) -> usize;

    /// Owned copies of the elements in `range`, clamped to the source length.
    fn values(&self, range: Range<usize>) -> Vec<Value>;

    /// Element type of the sequence.
    fn tag(&self) -> TypeTag;
}

/// Concrete [`Source`] over a `Vec<T>`.
pub(crate) struct VecSource<T>(Vec<T>);

impl<T: Clone + Send + Sync + 'static> Source for VecSource<T> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn values(&self, range: Range<usize>) -> Vec<Value> {
        let end = range.end.min(self.0.len());
        let start = range.start.min(end);
        self.0[start..end]
            .iter()
            .map(|v| Box::new(v.clone()) as Value)
            .collect()
    }

    fn tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }
}

/// Share `data` as a type-erased source.
pub(crate) fn source_for<T: Clone + Send + Sync + 'static>(data: Vec<T>) -> Arc<dyn Source> {
    Arc::new(VecSource(data))
}
