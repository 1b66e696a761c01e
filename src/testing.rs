//! Testing utilities for monadflow streams.
//!
//! Helpers for end-users writing tests against their own pipelines:
//!
//! - [`assert_collections_equal`]: exact, order-dependent comparison
//! - [`assert_all_ok`]: every element of a collected stream is `Ok`
//! - [`assert_err_message`]: an outcome failed with a given message
//! - [`ValueLogger`]: records the values a [`tap`](crate::Stream::tap) observes
//!
//! # Quick Start
//!
//! ```
//! use monadflow::Stream;
//! use monadflow::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let log = ValueLogger::new();
//! let out = Stream::from_iterable(vec![1, 2, 3])
//!     .tap(log.recorder())
//!     .map(|x: i32| x * 2)
//!     .collect()?;
//!
//! assert_collections_equal(&out, &[2, 4, 6]);
//! assert_eq!(log.values(), vec![1, 2, 3]);
//! # Ok(())
//! # }
//! ```

use crate::result::Outcome;
use std::fmt::{Debug, Display};
use std::sync::{Arc, Mutex, PoisonError};

/// Assert that two collections are equal in order and content.
///
/// # Panics
///
/// Panics if the collections differ in length or content.
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "Collection mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that every outcome is `Ok`.
///
/// # Panics
///
/// Panics at the first `Err`, printing its index and fault.
pub fn assert_all_ok<T: Debug, E: Debug>(outcomes: &[Outcome<T, E>]) {
    if let Some((i, bad)) = outcomes.iter().enumerate().find(|(_, o)| o.is_err()) {
        panic!("Expected all Ok, found Err at index {i}: {bad:?}");
    }
}

/// Assert that `outcome` is an `Err` whose error renders as `message`.
///
/// # Panics
///
/// Panics if `outcome` is `Ok` or its error message differs.
pub fn assert_err_message<T: Debug, E: Display>(outcome: &Outcome<T, E>, message: &str) {
    match outcome {
        Outcome::Ok(v) => panic!("Expected Err({message:?}), got Ok({v:?})"),
        Outcome::Err(fault) => assert_eq!(
            fault.error().to_string(),
            message,
            "Error message mismatch (args: {})",
            fault.input_args()
        ),
    }
}

/// Shared log of values seen by a tap.
///
/// Clones share the same log, so a recorder handed to a parallel stream
/// still reports into the logger kept by the test.
pub struct ValueLogger<T> {
    seen: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for ValueLogger<T> {
    fn clone(&self) -> Self {
        Self { seen: Arc::clone(&self.seen) }
    }
}

impl<T> Default for ValueLogger<T> {
    fn default() -> Self {
        Self { seen: Arc::new(Mutex::new(Vec::new())) }
    }
}

impl<T: Clone + Send + 'static> ValueLogger<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tap function appending each value to this log.
    pub fn recorder(&self) -> impl Fn(T) + Send + Sync + Clone + 'static {
        let seen = Arc::clone(&self.seen);
        move |v: T| seen.lock().unwrap_or_else(PoisonError::into_inner).push(v)
    }

    /// Values recorded so far, in arrival order.
    pub fn values(&self) -> Vec<T> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Failure;

    #[test]
    fn logger_clones_share_state() {
        let log = ValueLogger::new();
        let rec = log.clone().recorder();
        rec(1);
        rec(2);
        assert_eq!(log.values(), vec![1, 2]);
        log.clear();
        assert!(log.values().is_empty());
    }

    #[test]
    fn err_message_matches() {
        let failed: Outcome<i32> = Outcome::err(Failure::msg("nope"));
        assert_err_message(&failed, "nope");
    }

    #[test]
    #[should_panic(expected = "found Err at index 1")]
    fn all_ok_reports_index() {
        let outcomes: Vec<Outcome<i32>> = vec![Outcome::Ok(1), Outcome::err(Failure::msg("bad"))];
        assert_all_ok(&outcomes);
    }
}
