//! Planned stream operations and their per-element evaluation.
//!
//! Each operation is a type-erased [`DynOp`] (or [`DynAsyncOp`]) working on one
//! boxed element at a time. The typed wrappers below downcast the element to the
//! type the stream builder recorded for that position in the plan.

use crate::error::FlowError;
use crate::source::Value;
use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "async")]
use futures::future::{self, BoxFuture, FutureExt};
#[cfg(feature = "async")]
use std::future::Future;

/// What a planned operation does to the running value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    Map,
    Filter,
    Tap,
}

/// Description of one planned operation, as reported by [`Stream::plan`](crate::Stream::plan).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannedOp {
    pub kind: OpKind,
    /// Type name of the function.
    pub name: &'static str,
    pub asynchronous: bool,
}

/// Result of applying one operation to one element.
pub(crate) enum Step {
    Keep(Value),
    Skip,
}

pub(crate) trait DynOp: Send + Sync {
    fn kind(&self) -> OpKind;
    fn name(&self) -> &'static str;
    fn apply(&self, input: Value) -> Result<Step, FlowError>;
}

#[cfg(feature = "async")]
pub(crate) trait DynAsyncOp: Send + Sync {
    fn kind(&self) -> OpKind;
    fn name(&self) -> &'static str;
    fn apply(&self, input: Value) -> BoxFuture<'static, Result<Step, FlowError>>;
}

#[derive(Clone)]
pub(crate) enum Op {
    Sync(Arc<dyn DynOp>),
    #[cfg(feature = "async")]
    Async(Arc<dyn DynAsyncOp>),
}

impl Op {
    pub(crate) fn describe(&self) -> PlannedOp {
        match self {
            Op::Sync(op) => PlannedOp { kind: op.kind(), name: op.name(), asynchronous: false },
            #[cfg(feature = "async")]
            Op::Async(op) => PlannedOp { kind: op.kind(), name: op.name(), asynchronous: true },
        }
    }
}

fn mismatch<T>() -> FlowError {
    FlowError::TypeMismatch { expected: type_name::<T>() }
}

/// ---- Synchronous ops ----
pub(crate) struct MapOp<I, O, F>(pub(crate) F, pub(crate) PhantomData<(I, O)>);
impl<I, O, F> DynOp for MapOp<I, O, F>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    fn kind(&self) -> OpKind {
        OpKind::Map
    }
    fn name(&self) -> &'static str {
        type_name::<F>()
    }
    fn apply(&self, input: Value) -> Result<Step, FlowError> {
        let v = input.downcast::<I>().map_err(|_| mismatch::<I>())?;
        Ok(Step::Keep(Box::new(self.0(*v))))
    }
}

pub(crate) struct FilterOp<T, P>(pub(crate) P, pub(crate) PhantomData<T>);
impl<T, P> DynOp for FilterOp<T, P>
where
    T: Send + Sync + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn kind(&self) -> OpKind {
        OpKind::Filter
    }
    fn name(&self) -> &'static str {
        type_name::<P>()
    }
    fn apply(&self, input: Value) -> Result<Step, FlowError> {
        let keep = self.0(input.downcast_ref::<T>().ok_or_else(mismatch::<T>)?);
        Ok(if keep { Step::Keep(input) } else { Step::Skip })
    }
}

/// Taps observe a clone, so nothing they do reaches downstream operations.
pub(crate) struct TapOp<T, F>(pub(crate) F, pub(crate) PhantomData<T>);
impl<T, F, R> DynOp for TapOp<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    fn kind(&self) -> OpKind {
        OpKind::Tap
    }
    fn name(&self) -> &'static str {
        type_name::<F>()
    }
    fn apply(&self, input: Value) -> Result<Step, FlowError> {
        let copy = input.downcast_ref::<T>().ok_or_else(mismatch::<T>)?.clone();
        let _ = self.0(copy);
        Ok(Step::Keep(input))
    }
}

/// ---- Asynchronous ops ----
#[cfg(feature = "async")]
pub(crate) struct AsyncMapOp<I, O, F>(pub(crate) F, pub(crate) PhantomData<(I, O)>);
#[cfg(feature = "async")]
impl<I, O, F, Fut> DynAsyncOp for AsyncMapOp<I, O, F>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
{
    fn kind(&self) -> OpKind {
        OpKind::Map
    }
    fn name(&self) -> &'static str {
        type_name::<F>()
    }
    fn apply(&self, input: Value) -> BoxFuture<'static, Result<Step, FlowError>> {
        match input.downcast::<I>() {
            Ok(v) => {
                let pending = self.0(*v);
                async move {
                    let output = pending.await;
                    Ok::<_, FlowError>(Step::Keep(Box::new(output) as Value))
                }
                .boxed()
            }
            Err(_) => future::ready(Err::<Step, _>(mismatch::<I>())).boxed(),
        }
    }
}

#[cfg(feature = "async")]
pub(crate) struct AsyncFilterOp<T, P>(pub(crate) P, pub(crate) PhantomData<T>);
#[cfg(feature = "async")]
impl<T, P, Fut> DynAsyncOp for AsyncFilterOp<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    fn kind(&self) -> OpKind {
        OpKind::Filter
    }
    fn name(&self) -> &'static str {
        type_name::<P>()
    }
    fn apply(&self, input: Value) -> BoxFuture<'static, Result<Step, FlowError>> {
        let Some(copy) = input.downcast_ref::<T>().cloned() else {
            return future::ready(Err::<Step, _>(mismatch::<T>())).boxed();
        };
        let pending = self.0(copy);
        async move {
            let keep = pending.await;
            Ok::<_, FlowError>(if keep { Step::Keep(input) } else { Step::Skip })
        }
        .boxed()
    }
}

#[cfg(feature = "async")]
pub(crate) struct AsyncTapOp<T, F>(pub(crate) F, pub(crate) PhantomData<T>);
#[cfg(feature = "async")]
impl<T, F, Fut> DynAsyncOp for AsyncTapOp<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
{
    fn kind(&self) -> OpKind {
        OpKind::Tap
    }
    fn name(&self) -> &'static str {
        type_name::<F>()
    }
    fn apply(&self, input: Value) -> BoxFuture<'static, Result<Step, FlowError>> {
        let Some(copy) = input.downcast_ref::<T>().cloned() else {
            return future::ready(Err::<Step, _>(mismatch::<T>())).boxed();
        };
        let pending = self.0(copy);
        async move {
            let _ = pending.await;
            Ok::<_, FlowError>(Step::Keep(input))
        }
        .boxed()
    }
}

/// Run the full plan over one element. `None` means a filter dropped it.
pub(crate) fn apply_chain(value: Value, ops: &[Op]) -> Result<Option<Value>, FlowError> {
    let mut current = value;
    for op in ops {
        let step = match op {
            Op::Sync(op) => op.apply(current)?,
            #[cfg(feature = "async")]
            Op::Async(op) => return Err(FlowError::AsyncOperation { name: op.name() }),
        };
        match step {
            Step::Keep(v) => current = v,
            Step::Skip => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Asynchronous counterpart of [`apply_chain`]; synchronous ops run inline.
#[cfg(feature = "async")]
pub(crate) async fn apply_chain_async(
    value: Value,
    ops: &[Op],
) -> Result<Option<Value>, FlowError> {
    let mut current = value;
    for op in ops {
        let step = match op {
            Op::Sync(op) => op.apply(current)?,
            Op::Async(op) => op.apply(current).await?,
        };
        match step {
            Step::Keep(v) => current = v,
            Step::Skip => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// First asynchronous operation in `ops`, if any.
pub(crate) fn first_async(ops: &[Op]) -> Option<&'static str> {
    ops.iter().map(Op::describe).find(|p| p.asynchronous).map(|p| p.name)
}
