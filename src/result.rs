//! The [`Outcome`] container: a success value or a captured failure.
//!
//! `Outcome` is a closed two-variant type. `Ok` owns the value; `Err` owns a
//! [`Fault`] holding the error plus the call context it was captured in. Every
//! operation consumes the outcome and returns a new one, so values never change
//! after construction.
//!
//! Chaining follows the usual monad laws, with [`Outcome::unit`] as `return`
//! and [`Outcome::and_then`] as bind:
//!
//! ```
//! use monadflow::{safe, Outcome};
//!
//! let parse = safe(|s: &'static str| s.parse::<i32>().unwrap());
//! let halve = safe(|x: i32| if x % 2 == 0 { x / 2 } else { panic!("odd: {x}") });
//!
//! let ok = Outcome::unit("42").and_then(&parse).and_then(&halve);
//! assert_eq!(ok, Outcome::Ok(21));
//!
//! let failed = Outcome::unit("7").and_then(&parse).and_then(&halve);
//! assert!(!failed.is_ok());
//! assert_eq!(failed.fault().unwrap().input_args().args, vec!["7".to_string()]);
//! ```

use crate::context::{CapturedArgs, FrameInfo};
use crate::error::{Failure, Raise};
use anyhow::Result;
use serde_json::{json, Value};
use std::any::type_name;
use std::fmt;
use std::panic::Location;

/// A success value or a captured failure.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T, E = Failure> {
    Ok(T),
    Err(Fault<E>),
}

/// The payload of [`Outcome::Err`].
///
/// Equality compares `error` and `input_args`; `details` is diagnostic only.
#[derive(Clone, Debug)]
pub struct Fault<E> {
    error: E,
    input_args: CapturedArgs,
    details: Vec<FrameInfo>,
}

impl<E> Fault<E> {
    pub fn new(error: E) -> Self {
        Self {
            error,
            input_args: CapturedArgs::default(),
            details: Vec::new(),
        }
    }

    pub fn with_args(mut self, input_args: CapturedArgs) -> Self {
        self.input_args = input_args;
        self
    }

    pub fn with_frame(mut self, frame: FrameInfo) -> Self {
        self.details.push(frame);
        self
    }

    pub fn error(&self) -> &E {
        &self.error
    }

    pub fn input_args(&self) -> &CapturedArgs {
        &self.input_args
    }

    pub fn details(&self) -> &[FrameInfo] {
        &self.details
    }

    pub fn into_error(self) -> E {
        self.error
    }

    /// Transform the error, keeping the captured context.
    pub fn map<F, G: FnOnce(E) -> F>(self, f: G) -> Fault<F> {
        Fault {
            error: f(self.error),
            input_args: self.input_args,
            details: self.details,
        }
    }
}

impl<E: fmt::Display> Fault<E> {
    /// JSON report of the failure and its context.
    pub fn report(&self) -> Value {
        json!({
            "error": self.error.to_string(),
            "input_args": self.input_args,
            "details": self.details,
        })
    }
}

impl<E: PartialEq> PartialEq for Fault<E> {
    fn eq(&self, other: &Self) -> bool {
        self.error == other.error && self.input_args == other.input_args
    }
}

impl<E: fmt::Display> fmt::Display for Fault<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.input_args.is_empty() {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{} (args: {})", self.error, self.input_args)
        }
    }
}

impl<T, E> Outcome<T, E> {
    /// Wrap a value as success.
    pub fn unit(value: T) -> Self {
        Outcome::Ok(value)
    }

    /// Wrap an error with no captured context.
    pub fn err(error: E) -> Self {
        Outcome::Err(Fault::new(error))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Apply `f` to an `Ok` value; `Err` passes through and `f` is not called.
    ///
    /// Panics raised by `f` are not caught here; wrap `f` with
    /// [`safe`](crate::safe) and use [`and_then`](Self::and_then) for that.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U, E> {
        match self {
            Outcome::Ok(v) => Outcome::Ok(f(v)),
            Outcome::Err(fault) => Outcome::Err(fault),
        }
    }

    /// Apply `f` to the error of an `Err`, keeping its captured context.
    pub fn map_err<F, G: FnOnce(E) -> F>(self, f: G) -> Outcome<T, F> {
        match self {
            Outcome::Ok(v) => Outcome::Ok(v),
            Outcome::Err(fault) => Outcome::Err(fault.map(f)),
        }
    }

    /// Monadic bind: feed an `Ok` value to `f`, which returns an outcome.
    ///
    /// When `f` fails, a frame naming `f` and this call site is appended to the
    /// fault details. An `Err` receiver is returned unchanged.
    #[track_caller]
    pub fn and_then<U, F: FnOnce(T) -> Outcome<U, E>>(self, f: F) -> Outcome<U, E> {
        let location = Location::caller();
        match self {
            Outcome::Ok(v) => match f(v) {
                Outcome::Err(fault) => Outcome::Err(fault.with_frame(FrameInfo::at(
                    type_name::<F>(),
                    location,
                    CapturedArgs::default(),
                ))),
                ok => ok,
            },
            Outcome::Err(fault) => Outcome::Err(fault),
        }
    }

    /// Recover from an `Err` by feeding its error to `f`. `Ok` passes through.
    pub fn or_else<F, G: FnOnce(E) -> Outcome<T, F>>(self, f: G) -> Outcome<T, F> {
        match self {
            Outcome::Ok(v) => Outcome::Ok(v),
            Outcome::Err(fault) => f(fault.into_error()),
        }
    }

    /// Apply exactly one of two handlers depending on the variant.
    pub fn match_with<U, F, OkFn, ErrFn>(self, if_ok: OkFn, if_err: ErrFn) -> Outcome<U, F>
    where
        OkFn: FnOnce(T) -> Outcome<U, F>,
        ErrFn: FnOnce(E) -> Outcome<U, F>,
    {
        match self {
            Outcome::Ok(v) => if_ok(v),
            Outcome::Err(fault) => if_err(fault.into_error()),
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(v) => Some(v),
            Outcome::Err(_) => None,
        }
    }

    pub fn into_error(self) -> Option<E> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Err(fault) => Some(fault.into_error()),
        }
    }

    pub fn fault(&self) -> Option<&Fault<E>> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Err(fault) => Some(fault),
        }
    }

    pub fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Outcome::Ok(v) => Outcome::Ok(v),
            Outcome::Err(fault) => Outcome::Err(Fault {
                error: &fault.error,
                input_args: fault.input_args.clone(),
                details: fault.details.clone(),
            }),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, Fault<E>> {
        match self {
            Outcome::Ok(v) => Ok(v),
            Outcome::Err(fault) => Err(fault),
        }
    }
}

impl<T, E: Raise> Outcome<T, E> {
    /// Take the `Ok` value, or re-signal the captured error.
    ///
    /// For exception-like errors the returned `anyhow::Error` is the original
    /// error, so callers can `downcast_ref` to its type. If a clone of the
    /// failure is still alive, for example in a collected stream, the original
    /// is the first source instead; [`original_error`](crate::original_error)
    /// finds it either way. Inert error values produce
    /// [`FlowError::NothingToRaise`](crate::FlowError::NothingToRaise).
    pub fn unwrap(self) -> Result<T> {
        match self {
            Outcome::Ok(v) => Ok(v),
            Outcome::Err(fault) => Err(fault.into_error().raise()),
        }
    }
}

impl<T, E> From<std::result::Result<T, E>> for Outcome<T, E> {
    fn from(r: std::result::Result<T, E>) -> Self {
        match r {
            Ok(v) => Outcome::Ok(v),
            Err(e) => Outcome::err(e),
        }
    }
}

impl<T: fmt::Display, E: fmt::Display> fmt::Display for Outcome<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok(v) => write!(f, "Ok({v})"),
            Outcome::Err(fault) => write!(f, "Err({fault})"),
        }
    }
}
