//! Lazily planned, replayable streams.
//!
//! A [`Stream`] pairs a shared, materialized source with an ordered plan of
//! element-wise operations. Building a plan evaluates nothing; an action
//! evaluates every planned operation over every element, in attach order, and
//! leaves the stream untouched so it can be collected again.
//!
//! ```
//! use monadflow::Stream;
//! # fn main() -> anyhow::Result<()> {
//! let s = Stream::from_iterable(1..=10)
//!     .filter(|x: &i32| x % 2 == 0)
//!     .map(|x: i32| x * 3);
//!
//! assert_eq!(s.collect()?, vec![6, 12, 18, 24, 30]);
//! assert_eq!(s.par_collect(2, false)?, s.collect()?);
//! assert_eq!(s.fold(0, |acc, x| acc + x)?, 90);
//! # Ok(())
//! # }
//! ```
//!
//! Elements and operations must be [`FlowBound`], i.e. shareable across the
//! worker threads a parallel action may use.

use crate::error::FlowError;
use crate::op::{FilterOp, MapOp, Op, PlannedOp, TapOp};
use crate::runner::{Backend, Runner};
use crate::source::{source_for, Source, TypeTag, Value};
use anyhow::Result;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "async")]
use crate::op::{AsyncFilterOp, AsyncMapOp, AsyncTapOp};
#[cfg(feature = "async")]
use std::future::Future;

/// Bound for stream elements.
pub trait FlowBound: 'static + Send + Sync + Clone {}
impl<T> FlowBound for T where T: 'static + Send + Sync + Clone {}

/// An immutable source plus a plan of operations producing `T`s.
pub struct Stream<T> {
    source: Arc<dyn Source>,
    ops: Vec<Op>,
    _t: PhantomData<fn() -> T>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            ops: self.ops.clone(),
            _t: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("source", &self.source.tag().name)
            .field("len", &self.source.len())
            .field("plan", &self.ops.iter().map(Op::describe).collect::<Vec<_>>())
            .finish()
    }
}

impl<T: FlowBound> From<Vec<T>> for Stream<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            source: source_for(data),
            ops: Vec::new(),
            _t: PhantomData,
        }
    }
}

impl<T: FlowBound> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: FlowBound> Stream<T> {
    /// Materialize `iter` once; every action replays the stored elements.
    pub fn from_iterable<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().collect()
    }

    /// A one-element stream.
    pub fn once(value: T) -> Self {
        Self::from(vec![value])
    }

    fn with_op<O>(&self, op: Op) -> Stream<O> {
        let mut ops = self.ops.clone();
        ops.push(op);
        Stream {
            source: Arc::clone(&self.source),
            ops,
            _t: PhantomData,
        }
    }

    // ---------- planning ----------

    pub fn map<O, F>(&self, f: F) -> Stream<O>
    where
        O: FlowBound,
        F: Fn(T) -> O + Send + Sync + 'static,
    {
        self.with_op(Op::Sync(Arc::new(MapOp::<T, O, F>(f, PhantomData))))
    }

    /// Apply several same-typed functions, left to right.
    pub fn map_all<F, I>(&self, fns: I) -> Stream<T>
    where
        F: Fn(T) -> T + Send + Sync + 'static,
        I: IntoIterator<Item = F>,
    {
        fns.into_iter().fold(self.clone(), |s, f| s.map(f))
    }

    /// Keep elements for which `p` holds. Later operations never see dropped elements.
    pub fn filter<P>(&self, p: P) -> Stream<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.with_op(Op::Sync(Arc::new(FilterOp::<T, P>(p, PhantomData))))
    }

    /// Keep elements accepted by every predicate, checked in order and stopping
    /// at the first rejection.
    pub fn filter_all<P, I>(&self, preds: I) -> Stream<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        I: IntoIterator<Item = P>,
    {
        preds.into_iter().fold(self.clone(), |s, p| s.filter(p))
    }

    /// Call `f` with a clone of each element; the return value is discarded.
    pub fn tap<F, R>(&self, f: F) -> Stream<T>
    where
        F: Fn(T) -> R + Send + Sync + 'static,
        R: 'static,
    {
        self.with_op(Op::Sync(Arc::new(TapOp::<T, F>(f, PhantomData))))
    }

    pub fn tap_all<F, R, I>(&self, fns: I) -> Stream<T>
    where
        F: Fn(T) -> R + Send + Sync + 'static,
        R: 'static,
        I: IntoIterator<Item = F>,
    {
        fns.into_iter().fold(self.clone(), |s, f| s.tap(f))
    }

    #[cfg(feature = "async")]
    pub fn map_async<O, F, Fut>(&self, f: F) -> Stream<O>
    where
        O: FlowBound,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        self.with_op(Op::Async(Arc::new(AsyncMapOp::<T, O, F>(f, PhantomData))))
    }

    /// Asynchronous filter; the predicate receives a clone of the element.
    #[cfg(feature = "async")]
    pub fn filter_async<P, Fut>(&self, p: P) -> Stream<T>
    where
        P: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.with_op(Op::Async(Arc::new(AsyncFilterOp::<T, P>(p, PhantomData))))
    }

    #[cfg(feature = "async")]
    pub fn tap_async<F, Fut>(&self, f: F) -> Stream<T>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
    {
        self.with_op(Op::Async(Arc::new(AsyncTapOp::<T, F>(f, PhantomData))))
    }

    // ---------- inspection ----------

    /// The planned operations, in evaluation order.
    pub fn plan(&self) -> Vec<PlannedOp> {
        self.ops.iter().map(Op::describe).collect()
    }

    /// Number of source elements (before any filter).
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.len() == 0
    }

    /// Element type of the source.
    pub fn source_type(&self) -> TypeTag {
        self.source.tag()
    }

    // ---------- actions ----------

    /// Evaluate sequentially on the calling thread.
    pub fn collect(&self) -> Result<Vec<T>> {
        self.collect_with(&Runner::sequential())
    }

    /// Evaluate in contiguous batches on `workers` workers (`-1` for all but
    /// one core). `use_threads` selects scoped OS threads over a rayon pool.
    ///
    /// Output order matches [`collect`](Self::collect).
    pub fn par_collect(&self, workers: isize, use_threads: bool) -> Result<Vec<T>> {
        self.collect_with(&Runner::parallel(workers, Backend::from_use_threads(use_threads)))
    }

    pub fn collect_with(&self, runner: &Runner) -> Result<Vec<T>> {
        downcast_all(runner.run(self.source.as_ref(), &self.ops)?)
    }

    /// Evaluate every element concurrently on the current task.
    ///
    /// Synchronous operations in the plan run inline. Results keep source
    /// order regardless of completion order.
    #[cfg(feature = "async")]
    pub async fn async_collect(&self) -> Result<Vec<T>> {
        downcast_all(crate::runner::run_async(self.source.as_ref(), &self.ops).await?)
    }

    /// Left fold over the collected elements.
    pub fn fold<A, F>(&self, initial: A, f: F) -> Result<A>
    where
        F: FnMut(A, T) -> A,
    {
        Ok(self.collect()?.into_iter().fold(initial, f))
    }

    /// Like [`fold`](Self::fold), materializing in parallel when `workers`
    /// resolves to more than one worker. The fold itself is sequential.
    pub fn par_fold<A, F>(&self, initial: A, f: F, workers: isize, use_threads: bool) -> Result<A>
    where
        F: FnMut(A, T) -> A,
    {
        let runner = Runner::for_workers(workers, use_threads)?;
        Ok(self.collect_with(&runner)?.into_iter().fold(initial, f))
    }

    /// Split the collected elements into `(matching, rest)`, as fresh streams.
    pub fn partition<P>(&self, p: P) -> Result<(Stream<T>, Stream<T>)>
    where
        P: Fn(&T) -> bool,
    {
        Ok(split(self.collect()?, p))
    }

    pub fn par_partition<P>(
        &self,
        p: P,
        workers: isize,
        use_threads: bool,
    ) -> Result<(Stream<T>, Stream<T>)>
    where
        P: Fn(&T) -> bool,
    {
        let runner = Runner::for_workers(workers, use_threads)?;
        Ok(split(self.collect_with(&runner)?, p))
    }
}

fn split<T: FlowBound, P: Fn(&T) -> bool>(values: Vec<T>, p: P) -> (Stream<T>, Stream<T>) {
    let (matching, rest): (Vec<T>, Vec<T>) = values.into_iter().partition(|v| p(v));
    (Stream::from(matching), Stream::from(rest))
}

fn downcast_all<T: 'static>(values: Vec<Value>) -> Result<Vec<T>> {
    values
        .into_iter()
        .map(|v| {
            v.downcast::<T>()
                .map(|b| *b)
                .map_err(|_| {
                    anyhow::Error::from(FlowError::TypeMismatch { expected: type_name::<T>() })
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::OpKind;

    #[test]
    fn planning_does_not_evaluate() {
        let s = Stream::from_iterable(vec![1, 2, 3])
            .map(|x: i32| -> i32 { panic!("evaluated {x}") });
        assert_eq!(s.plan().len(), 1);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn plan_lists_ops_in_order() {
        let s = Stream::from_iterable(0..3)
            .map(|x: i32| x + 1)
            .filter(|x: &i32| *x > 0)
            .tap(|_x: i32| ());
        let kinds: Vec<_> = s.plan().into_iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![OpKind::Map, OpKind::Filter, OpKind::Tap]);
        assert!(s.plan().iter().all(|p| !p.asynchronous));
    }

    #[test]
    fn builders_leave_the_original_alone() -> Result<()> {
        let base = Stream::from_iterable(1..=3);
        let doubled = base.map(|x: i32| x * 2);
        assert!(base.plan().is_empty());
        assert_eq!(base.collect()?, vec![1, 2, 3]);
        assert_eq!(doubled.collect()?, vec![2, 4, 6]);
        Ok(())
    }

    #[test]
    fn debug_shows_source_type() {
        let s = Stream::once(1u8);
        assert!(format!("{s:?}").contains("u8"));
        assert_eq!(s.source_type(), TypeTag::of::<u8>());
    }
}
