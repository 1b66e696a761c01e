//! # Monadflow
//!
//! A small **functional-combinator library** for Rust: a success/failure
//! container with monadic chaining, and a lazily planned, replayable stream
//! that can be evaluated sequentially, on a pool of workers, or asynchronously.
//!
//! ## Key Features
//!
//! - **Failures as data** - [`Outcome`] carries either a value or a [`Fault`] with the captured
//!   error and call context
//! - **Monadic chaining** - `map`, `map_err`, `and_then`, `or_else`, `match_with`, obeying the
//!   monad laws
//! - **Safe-call wrappers** - [`safe`], [`safe_try`], [`safe_method`] and [`safe_call!`] turn
//!   panics and errors into `Err`
//! - **Combinators** - [`compose`], [`all_of`], [`any_of`], [`none_of`], [`invert`], [`identity`]
//! - **Validated new types** - [`NewType`] definitions producing [`Refined`] values
//! - **Replayable streams** - plan `map` / `filter` / `tap` once, collect as many times as you like
//! - **Sequential, parallel and async execution** - every strategy produces the same ordered output
//!
//! ## Quick Start
//!
//! ```
//! use monadflow::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! // Wrap a function that may panic
//! let two_div = safe(|x: i32| 2 / x);
//!
//! // Plan a stream of outcomes, then evaluate it
//! let outcomes = Stream::from_iterable([0, 1, 2])
//!     .map(two_div)
//!     .collect()?;
//!
//! assert!(outcomes[0].is_err());
//! assert_eq!(outcomes[1], Outcome::Ok(2));
//!
//! // Failures carry the arguments that caused them
//! let fault = outcomes[0].fault().unwrap();
//! assert_eq!(fault.input_args().args, vec!["0".to_string()]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Outcome
//!
//! An [`Outcome<T, E>`] is either `Ok(T)` or `Err(Fault<E>)`. The default error
//! type is [`Failure`], an exception-like error remembering the type and message
//! of what went wrong. Two `Err`s are equal when their errors and captured
//! arguments are equal; the frame details are diagnostic only.
//!
//! [`Outcome::unwrap`] hands back the value, or re-signals the captured error as
//! an `anyhow::Error` that can be downcast to its original type.
//!
//! ### Streams
//!
//! A [`Stream<T>`] is built from a finite sequence and a plan of operations:
//! - [`map`](Stream::map) / [`map_all`](Stream::map_all) - transform each element
//! - [`filter`](Stream::filter) / [`filter_all`](Stream::filter_all) - drop elements
//! - [`tap`](Stream::tap) / [`tap_all`](Stream::tap_all) - observe a copy of each element
//! - `map_async`, `filter_async`, `tap_async` - awaitable counterparts (feature `async`)
//!
//! Planning never evaluates anything, and adding an operation returns a new
//! stream, so one base stream can feed many plans.
//!
//! ### Execution Modes
//!
//! - **Sequential** - [`collect()`](Stream::collect) - single-threaded, in-order
//! - **Parallel** - [`par_collect(workers, use_threads)`](Stream::par_collect) - contiguous
//!   batches on a rayon pool or scoped OS threads, created for the call
//! - **Async** - `async_collect()` - every element in flight at once on the current task
//! - **Explicit** - [`collect_with(&Runner)`](Stream::collect_with) - any [`Runner`] configuration
//!
//! [`fold`](Stream::fold) and [`partition`](Stream::partition) (and their `par_`
//! variants) materialize the stream first, then fold or split it.
//!
//! Planned operations are not guarded: a panic inside one aborts the action. Wrap
//! operations with [`safe`] to keep failures per element.
//!
//! ## Testing
//!
//! The [`testing`] module provides assertion helpers and a [`ValueLogger`](testing::ValueLogger)
//! for recording what a tap observed.
//!
//! ## Logging
//!
//! Monadflow emits [`tracing`] events (`debug` for dispatch and captured failures,
//! `trace` per batch) and installs no subscriber.

pub mod combinators;
pub mod context;
pub mod error;
pub mod new_type;
mod op;
pub mod result;
pub mod runner;
pub mod safe;
pub mod source;
pub mod stream;
pub mod testing;

// ----- Public re-exports -----
pub use combinators::{
    all_of, any_of, compose, compose2, endo, identity, invert, none_of, predicate, Endo, Predicate,
};
pub use context::{CapturedArgs, FrameInfo};
pub use error::{original_error, Failure, FlowError, Raise};
pub use new_type::{NewType, Refined};
pub use op::{OpKind, PlannedOp};
pub use result::{Fault, Outcome};
pub use runner::{Backend, ExecMode, Runner};
pub use safe::{safe, safe_method, safe_try};
pub use source::TypeTag;
pub use stream::{FlowBound, Stream};
