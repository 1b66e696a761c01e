//! Structured diagnostics attached to a failed [`Outcome`](crate::Outcome).
//!
//! A [`Fault`](crate::Fault) records the arguments of the call that failed
//! ([`CapturedArgs`]) and one [`FrameInfo`] per boundary the failure crossed: the
//! `safe` wrapper that captured it, then every `and_then` whose function returned
//! `Err`. Both serialize with serde for reporting.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::panic::Location;

/// Rendered arguments of a failing call.
///
/// Arguments are stored as their `Debug` rendering, so any argument type can
/// be captured and two captures compare by what they printed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapturedArgs {
    /// The receiver of a bound operation (see [`safe_method`](crate::safe_method)).
    pub receiver: Option<String>,
    /// Positional arguments, in call order.
    pub args: Vec<String>,
}

impl CapturedArgs {
    pub fn positional(args: Vec<String>) -> Self {
        Self { receiver: None, args }
    }

    /// Capture a single argument.
    pub fn single<A: Debug>(arg: &A) -> Self {
        Self::positional(vec![format!("{arg:?}")])
    }

    pub fn with_receiver<S: Debug>(mut self, receiver: &S) -> Self {
        self.receiver = Some(format!("{receiver:?}"));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_none() && self.args.is_empty()
    }
}

impl fmt::Display for CapturedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(r) = &self.receiver {
            write!(f, "{r}.")?;
        }
        write!(f, "({})", self.args.join(", "))
    }
}

/// One boundary crossed by a failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub file: String,
    pub function: String,
    pub line_number: u32,
    /// The arguments visible at this boundary (empty when not captured).
    pub locals: CapturedArgs,
}

impl FrameInfo {
    pub fn new(function: &str, file: &str, line_number: u32, locals: CapturedArgs) -> Self {
        Self {
            file: file.to_string(),
            function: function.to_string(),
            line_number,
            locals,
        }
    }

    pub fn at(function: &str, location: &Location<'_>, locals: CapturedArgs) -> Self {
        Self::new(function, location.file(), location.line(), locals)
    }
}

impl fmt::Display for FrameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{} {}", self.function, self.file, self.line_number, self.locals)
    }
}
