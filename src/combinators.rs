//! Composable functions and predicates.
//!
//! Plain higher-order helpers: they take and return ordinary functions, so the
//! results can be handed straight to [`Stream::map`](crate::Stream::map) or
//! [`Stream::filter`](crate::Stream::filter).
//!
//! ```
//! use monadflow::{all_of, any_of, compose, invert, none_of};
//!
//! fn div3(x: &i32) -> bool { x % 3 == 0 }
//! fn div5(x: &i32) -> bool { x % 5 == 0 }
//!
//! assert!(all_of![div3, div5](&15));
//! assert!(any_of![div3, div5](&5));
//! assert!(none_of![div3, div5](&7));
//! assert!(invert(div3)(&7));
//! assert_eq!(compose!(|x: i32| x + 1, |x: i32| x * 10)(1), 20);
//! ```

use std::sync::Arc;

/// A shareable predicate.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A shareable endomorphism, the building block of [`compose`].
pub type Endo<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

/// Box a predicate for use with [`all_of`], [`any_of`] and [`none_of`].
pub fn predicate<T, P>(p: P) -> Predicate<T>
where
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    Arc::new(p)
}

/// Box a function for use with [`compose`].
pub fn endo<T, F>(f: F) -> Endo<T>
where
    F: Fn(T) -> T + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Returns its input unchanged.
pub fn identity<T>(x: T) -> T {
    x
}

/// Left-to-right composition of same-typed functions: `fns[n-1](..fns[0](x))`.
///
/// An empty list composes to the identity.
pub fn compose<T>(fns: Vec<Endo<T>>) -> impl Fn(T) -> T + Send + Sync + Clone {
    let fns: Arc<[Endo<T>]> = fns.into();
    move |x| fns.iter().fold(x, |acc, f| f(acc))
}

/// `g(f(x))`.
pub fn compose2<A, B, C, F, G>(f: F, g: G) -> impl Fn(A) -> C + Send + Sync + Clone
where
    F: Fn(A) -> B + Send + Sync + Clone,
    G: Fn(B) -> C + Send + Sync + Clone,
{
    move |x| g(f(x))
}

/// Short-circuiting AND over `preds`. An empty list accepts everything.
pub fn all_of<T>(preds: Vec<Predicate<T>>) -> impl Fn(&T) -> bool + Send + Sync + Clone {
    let preds: Arc<[Predicate<T>]> = preds.into();
    move |x| preds.iter().all(|p| p(x))
}

/// Short-circuiting OR over `preds`. An empty list rejects everything.
pub fn any_of<T>(preds: Vec<Predicate<T>>) -> impl Fn(&T) -> bool + Send + Sync + Clone {
    let preds: Arc<[Predicate<T>]> = preds.into();
    move |x| preds.iter().any(|p| p(x))
}

/// True when no predicate matches.
pub fn none_of<T>(preds: Vec<Predicate<T>>) -> impl Fn(&T) -> bool + Send + Sync + Clone {
    invert(any_of(preds))
}

/// Logical NOT of `p`.
pub fn invert<T, P>(p: P) -> impl Fn(&T) -> bool + Send + Sync + Clone
where
    P: Fn(&T) -> bool + Send + Sync + Clone,
{
    move |x| !p(x)
}

/// Left-to-right composition of any number of functions.
///
/// `compose!()` is [`identity`]; `compose!(f, g, h)` is `|x| h(g(f(x)))`.
#[macro_export]
macro_rules! compose {
    () => {
        $crate::combinators::identity
    };
    ($f:expr $(,)?) => {
        $f
    };
    ($f:expr, $($rest:expr),+ $(,)?) => {
        $crate::combinators::compose2($f, $crate::compose!($($rest),+))
    };
}

/// [`all_of`] over a list of predicate expressions.
#[macro_export]
macro_rules! all_of {
    ($($p:expr),* $(,)?) => {
        $crate::combinators::all_of(vec![$($crate::combinators::predicate($p)),*])
    };
}

/// [`any_of`] over a list of predicate expressions.
#[macro_export]
macro_rules! any_of {
    ($($p:expr),* $(,)?) => {
        $crate::combinators::any_of(vec![$($crate::combinators::predicate($p)),*])
    };
}

/// [`none_of`] over a list of predicate expressions.
#[macro_export]
macro_rules! none_of {
    ($($p:expr),* $(,)?) => {
        $crate::combinators::none_of(vec![$($crate::combinators::predicate($p)),*])
    };
}
