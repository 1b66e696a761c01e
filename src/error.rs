//! Error types shared by the container and the stream engine.
//!
//! Two families live here:
//! - [`FlowError`]: conditions raised by the library itself (misuse, plan faults).
//! - [`Failure`]: the default error carried by [`Outcome::Err`](crate::Outcome) when a
//!   [`safe`](crate::safe) wrapper captures a panic or an error value.
//!
//! [`Raise`] decides what [`Outcome::unwrap`](crate::Outcome::unwrap) re-signals for a
//! given error type.

use std::any::{type_name, Any, TypeId};
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::num::{ParseFloatError, ParseIntError};
use std::sync::Arc;
use thiserror::Error;

/// Conditions raised by the library itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    // ============================================================================
    // Execution Errors
    // ============================================================================
    #[error("workers must be -1 or a positive count, got {0}")]
    InvalidWorkers(isize),

    #[error("operation `{name}` is asynchronous; use async_collect")]
    AsyncOperation { name: &'static str },

    #[error("stream element is not a `{expected}`")]
    TypeMismatch { expected: &'static str },

    // ============================================================================
    // Container Errors
    // ============================================================================
    #[error("Err does not have a caught error to raise: {0}")]
    NothingToRaise(String),

    #[error("panicked: {0}")]
    Panicked(String),

    // ============================================================================
    // New Type Errors
    // ============================================================================
    #[error("{type_name} does not return true for `{validator}`, received `{value}`")]
    Validation {
        type_name: &'static str,
        validator: &'static str,
        value: String,
    },
}

/// A captured, exception-like failure.
///
/// `kind` is the type name of the original error (or `"panic"`, or `"message"`
/// for bare messages), `message` its rendering. The original error is kept as
/// the cause so it can be re-signalled by
/// [`Outcome::unwrap`](crate::Outcome::unwrap) or inspected with
/// [`Failure::downcast_ref`].
#[derive(Clone)]
pub struct Failure {
    kind: Cow<'static, str>,
    message: String,
    cause: Arc<anyhow::Error>,
}

impl Failure {
    /// Capture an error value.
    ///
    /// For `anyhow::Error` the kind names the error inside it, not the wrapper.
    pub fn from_error<E: Into<anyhow::Error> + 'static>(error: E) -> Self {
        let erased = TypeId::of::<E>() == TypeId::of::<anyhow::Error>();
        let cause: anyhow::Error = error.into();
        let kind = if erased {
            erased_kind(&cause)
        } else {
            Cow::Borrowed(type_name::<E>())
        };
        Self {
            kind,
            message: cause.to_string(),
            cause: Arc::new(cause),
        }
    }

    /// Capture a panic payload as returned by `std::panic::catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = panic_message(payload.as_ref());
        Self {
            kind: Cow::Borrowed("panic"),
            cause: Arc::new(FlowError::Panicked(message.clone()).into()),
            message,
        }
    }

    /// A failure carrying only a message.
    pub fn msg<M: fmt::Display>(message: M) -> Self {
        let message = message.to_string();
        Self {
            kind: Cow::Borrowed("message"),
            cause: Arc::new(anyhow::Error::msg(message.clone())),
            message,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `true` when the original cause is an `E`.
    pub fn is<E: fmt::Display + fmt::Debug + Send + Sync + 'static>(&self) -> bool {
        self.cause.is::<E>()
    }

    pub fn downcast_ref<E: fmt::Display + fmt::Debug + Send + Sync + 'static>(&self) -> Option<&E> {
        self.cause.downcast_ref::<E>()
    }
}

impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl Eq for Failure {}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + Send + Sync + 'static) = &**self.cause;
        Some(cause)
    }
}

fn erased_kind(cause: &anyhow::Error) -> Cow<'static, str> {
    if cause.is::<String>() || cause.is::<&'static str>() {
        return Cow::Borrowed("message");
    }
    let boxed = cause.downcast_ref::<Box<dyn StdError + Send + Sync>>();
    let top: &(dyn StdError + 'static) = match boxed {
        Some(boxed) => &**boxed,
        None => &**cause,
    };
    std::iter::successors(Some(top), |&e| e.source())
        .find_map(known_kind)
        .map(Cow::Borrowed)
        .unwrap_or_else(|| debug_kind(top))
}

fn known_kind(error: &(dyn StdError + 'static)) -> Option<&'static str> {
    macro_rules! first_match {
        ($($t:ty),* $(,)?) => {
            $(
                if error.is::<$t>() {
                    return Some(type_name::<$t>());
                }
            )*
        };
    }
    first_match!(
        std::io::Error,
        ParseIntError,
        ParseFloatError,
        std::fmt::Error,
        std::str::Utf8Error,
        std::string::FromUtf8Error,
        serde_json::Error,
        FlowError,
    );
    None
}

// Derived `Debug` output starts with the type name; string errors render quoted.
fn debug_kind(error: &dyn StdError) -> Cow<'static, str> {
    let rendered = format!("{error:?}");
    let name: String = rendered
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    if name.is_empty() {
        Cow::Borrowed("message")
    } else {
        Cow::Owned(name)
    }
}

/// Find an error of type `E` in what [`Outcome::unwrap`](crate::Outcome::unwrap)
/// returned.
///
/// `unwrap` hands back the original error itself when the failure was not
/// shared. When a clone of it is still alive (stream actions clone their
/// elements) the original sits one step down the error chain instead. This
/// looks in both places.
///
/// ```
/// use monadflow::error::original_error;
/// use monadflow::safe_try;
/// use std::num::ParseIntError;
///
/// let parse = safe_try(|s: &str| s.parse::<i32>());
/// let failed = parse("x");
/// let keep = failed.clone();
/// let err = failed.unwrap().unwrap_err();
/// assert!(original_error::<ParseIntError>(&err).is_some());
/// # drop(keep);
/// ```
pub fn original_error<E>(error: &anyhow::Error) -> Option<&E>
where
    E: StdError + Send + Sync + 'static,
{
    error
        .downcast_ref::<E>()
        .or_else(|| error.chain().find_map(|e| e.downcast_ref::<E>()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// The cause of a [`Failure`] that is still shared with a clone.
///
/// Its [`source`](std::error::Error::source) is the original error.
#[derive(Debug)]
pub struct SharedCause(Arc<anyhow::Error>);

impl fmt::Display for SharedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for SharedCause {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&**self.0)
    }
}

/// How an error held by `Err` is re-signalled by `unwrap`.
///
/// Exception-like errors hand back the original error; inert values (strings,
/// numbers, unit) are not errors and produce [`FlowError::NothingToRaise`].
pub trait Raise {
    fn raise(self) -> anyhow::Error;
}

impl Raise for Failure {
    /// Returns the original cause when this failure is its only owner, so
    /// `downcast_ref::<OriginalError>()` works on the result. Otherwise the
    /// cause comes back wrapped in [`SharedCause`]; see [`original_error`].
    fn raise(self) -> anyhow::Error {
        Arc::try_unwrap(self.cause).unwrap_or_else(|shared| anyhow::Error::new(SharedCause(shared)))
    }
}

impl Raise for anyhow::Error {
    fn raise(self) -> anyhow::Error {
        self
    }
}

macro_rules! impl_raise_error {
    ($($t:ty),* $(,)?) => {
        $(
            impl Raise for $t {
                fn raise(self) -> anyhow::Error {
                    anyhow::Error::new(self)
                }
            }
        )*
    };
}

macro_rules! impl_raise_inert {
    ($($t:ty),* $(,)?) => {
        $(
            impl Raise for $t {
                fn raise(self) -> anyhow::Error {
                    FlowError::NothingToRaise(format!("{self:?}")).into()
                }
            }
        )*
    };
}

impl_raise_error!(FlowError, std::io::Error, ParseIntError, ParseFloatError, std::fmt::Error);
impl_raise_inert!(
    (), bool, char, String, &'static str, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64,
    u128, usize, f32, f64
);
