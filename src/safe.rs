//! Safe-call wrappers: turn panicking or erroring calls into [`Outcome`]s.
//!
//! This is the single layer where failures become data. The wrapped operation
//! runs under `catch_unwind`; a normal return becomes `Ok`, a panic (or, for
//! [`safe_try`], a returned `Err`) becomes `Err` carrying a [`Failure`], every
//! argument of the call and a frame for the wrapper. Side effects performed
//! before the failure are not rolled back.
//!
//! - [`safe`]: unary free functions, the shape stream operations take.
//! - [`safe_try`]: unary functions returning `Result`.
//! - [`safe_method`]: operations bound to a receiver.
//! - [`safe_call!`](crate::safe_call): n-ary calls, evaluated immediately.
//!
//! ```
//! use monadflow::{safe, safe_call, Outcome, Stream};
//!
//! fn add(a: i32, b: i32) -> i32 {
//!     a.checked_add(b).expect("overflow")
//! }
//!
//! assert_eq!(safe_call!(add, 1, 2), Outcome::Ok(3));
//! assert!(safe_call!(add, i32::MAX, 1).is_err());
//!
//! let two_div = safe(|x: i32| 2 / x);
//! let out = Stream::from_iterable([0, 1, 2]).map(two_div).collect().unwrap();
//! assert!(out[0].is_err());
//! assert_eq!(out[1..], [Outcome::Ok(2), Outcome::Ok(1)]);
//! ```
//!
//! A captured panic still runs the process panic hook first, so the default
//! hook prints its usual message to stderr for every `Err` produced this way.
//! Swap the hook out around noisy calls to keep them quiet:
//!
//! ```
//! use monadflow::safe;
//! use std::panic;
//!
//! let previous = panic::take_hook();
//! panic::set_hook(Box::new(|_| {}));
//! let failed = safe(|x: i32| 10 / x)(0);
//! panic::set_hook(previous);
//!
//! assert!(failed.is_err());
//! ```
//!
//! The hook is global to the process, including other test threads.

use crate::context::{CapturedArgs, FrameInfo};
use crate::error::Failure;
use crate::result::{Fault, Outcome};
use std::any::type_name;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe, Location};

/// Wrap a unary function so panics become `Err`.
///
/// The argument's `Debug` rendering is captured before the call.
#[track_caller]
pub fn safe<A, R, F>(f: F) -> impl Fn(A) -> Outcome<R> + Send + Sync + Clone + 'static
where
    A: Debug + 'static,
    R: 'static,
    F: Fn(A) -> R + Send + Sync + Clone + 'static,
{
    let location = Location::caller();
    move |arg: A| {
        let args = CapturedArgs::single(&arg);
        match panic::catch_unwind(AssertUnwindSafe(|| f(arg))) {
            Ok(value) => Outcome::Ok(value),
            Err(payload) => {
                captured(Failure::from_panic(payload), type_name::<F>(), location, args)
            }
        }
    }
}

/// Wrap a unary function returning `Result` so both its errors and its panics
/// become `Err`.
#[track_caller]
pub fn safe_try<A, R, E, F>(f: F) -> impl Fn(A) -> Outcome<R> + Send + Sync + Clone + 'static
where
    A: Debug + 'static,
    R: 'static,
    E: Into<anyhow::Error> + 'static,
    F: Fn(A) -> Result<R, E> + Send + Sync + Clone + 'static,
{
    let location = Location::caller();
    move |arg: A| {
        let args = CapturedArgs::single(&arg);
        match panic::catch_unwind(AssertUnwindSafe(|| f(arg))) {
            Ok(Ok(value)) => Outcome::Ok(value),
            Ok(Err(e)) => captured(Failure::from_error(e), type_name::<F>(), location, args),
            Err(payload) => {
                captured(Failure::from_panic(payload), type_name::<F>(), location, args)
            }
        }
    }
}

/// Wrap an operation bound to a receiver.
///
/// On failure the receiver is recorded as `input_args.receiver`, rendered
/// after the call so it reflects any state the operation changed.
#[track_caller]
pub fn safe_method<S, A, R, F>(f: F) -> impl Fn(&S, A) -> Outcome<R> + Send + Sync + Clone + 'static
where
    S: Debug + 'static,
    A: Debug + 'static,
    R: 'static,
    F: Fn(&S, A) -> R + Send + Sync + Clone + 'static,
{
    let location = Location::caller();
    move |receiver: &S, arg: A| {
        let args = CapturedArgs::single(&arg);
        match panic::catch_unwind(AssertUnwindSafe(|| f(receiver, arg))) {
            Ok(value) => Outcome::Ok(value),
            Err(payload) => captured(
                Failure::from_panic(payload),
                type_name::<F>(),
                location,
                args.with_receiver(receiver),
            ),
        }
    }
}

fn captured<R>(
    failure: Failure,
    function: &str,
    location: &Location<'_>,
    args: CapturedArgs,
) -> Outcome<R> {
    tracing::debug!(
        kind = failure.kind(),
        function,
        args = %args,
        "captured failure: {}",
        failure
    );
    let frame = FrameInfo::at(function, location, args.clone());
    Outcome::Err(Fault::new(failure).with_args(args).with_frame(frame))
}

/// Argument tuples accepted by [`safe_call!`](crate::safe_call).
pub trait CallArgs {
    fn render(&self) -> Vec<String>;
}

/// Apply a function to an argument tuple.
pub trait Invoke<F, R> {
    fn invoke(self, f: F) -> R;
}

macro_rules! impl_call_args {
    ($($name:ident),*) => {
        impl<$($name: Debug),*> CallArgs for ($($name,)*) {
            #[allow(non_snake_case)]
            fn render(&self) -> Vec<String> {
                let ($($name,)*) = self;
                vec![$(format!("{:?}", $name)),*]
            }
        }

        impl<Func, Ret, $($name),*> Invoke<Func, Ret> for ($($name,)*)
        where
            Func: FnOnce($($name),*) -> Ret,
        {
            #[allow(non_snake_case)]
            fn invoke(self, f: Func) -> Ret {
                let ($($name,)*) = self;
                f($($name),*)
            }
        }
    };
}

impl_call_args!();
impl_call_args!(A);
impl_call_args!(A, B);
impl_call_args!(A, B, C);
impl_call_args!(A, B, C, D);
impl_call_args!(A, B, C, D, E);
impl_call_args!(A, B, C, D, E, G);

/// Backs [`safe_call!`](crate::safe_call).
#[doc(hidden)]
pub fn call_safely<Args, F, R>(
    function: &str,
    file: &str,
    line: u32,
    f: F,
    args: Args,
) -> Outcome<R>
where
    Args: CallArgs + Invoke<F, R>,
{
    let rendered = CapturedArgs::positional(args.render());
    match panic::catch_unwind(AssertUnwindSafe(|| args.invoke(f))) {
        Ok(value) => Outcome::Ok(value),
        Err(payload) => {
            let failure = Failure::from_panic(payload);
            tracing::debug!(
                kind = failure.kind(),
                function,
                args = %rendered,
                "captured failure: {}",
                failure
            );
            let frame = FrameInfo::new(function, file, line, rendered.clone());
            Outcome::Err(Fault::new(failure).with_args(rendered).with_frame(frame))
        }
    }
}

/// Call `f` with the given arguments, capturing a panic as `Err`.
///
/// ```
/// use monadflow::safe_call;
///
/// fn div(a: i32, b: i32) -> i32 { a / b }
///
/// let failed = safe_call!(div, 1, 0);
/// assert_eq!(failed.fault().unwrap().input_args().args, vec!["1", "0"]);
/// ```
#[macro_export]
macro_rules! safe_call {
    ($f:expr $(, $arg:expr)* $(,)?) => {
        $crate::safe::call_safely(
            stringify!($f),
            file!(),
            line!(),
            $f,
            ($($arg,)*),
        )
    };
}
