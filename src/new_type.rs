//! Validated wrapper types.
//!
//! A [`NewType`] is a named definition over a base type `T`: an ordered list
//! of converters applied first, then named validators that must all accept the
//! converted value. [`NewType::create`] produces a [`Refined<T>`], which only
//! exists for values that passed. The wrapper does not forward the base type's
//! methods; read the value with [`Refined::value`] or transform it with
//! [`Refined::map`], which re-runs the definition.
//!
//! ```
//! use monadflow::NewType;
//!
//! let email = NewType::<String>::new("Email")
//!     .converter(|s: String| s.trim().to_lowercase())
//!     .validator("has_len", |s: &String| !s.is_empty());
//!
//! let e = email.create("  Some_Email@Domain.Com ".to_string()).unwrap();
//! assert_eq!(e.value(), "some_email@domain.com");
//! assert!(email.create("   ".to_string()).is_err());
//! ```

use crate::error::FlowError;
use std::fmt::{self, Debug};
use std::sync::Arc;

type Validator<T> = (&'static str, Arc<dyn Fn(&T) -> bool + Send + Sync>);
type Converter<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

struct Spec<T> {
    name: &'static str,
    converters: Vec<Converter<T>>,
    validators: Vec<Validator<T>>,
}

/// A named definition of valid `T` values.
pub struct NewType<T> {
    spec: Arc<Spec<T>>,
}

impl<T> Clone for NewType<T> {
    fn clone(&self) -> Self {
        Self { spec: Arc::clone(&self.spec) }
    }
}

impl<T: Debug> NewType<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            spec: Arc::new(Spec {
                name,
                converters: Vec::new(),
                validators: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    /// Append a converter; converters run in the order they were added.
    pub fn converter<F>(self, f: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        let convert: Converter<T> = Arc::new(f);
        self.extend(|spec| spec.converters.push(convert))
    }

    /// Append a named validator.
    pub fn validator<F>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let check: Arc<dyn Fn(&T) -> bool + Send + Sync> = Arc::new(f);
        self.extend(|spec| spec.validators.push((name, check)))
    }

    fn extend(self, f: impl FnOnce(&mut Spec<T>)) -> Self {
        let mut spec = match Arc::try_unwrap(self.spec) {
            Ok(spec) => spec,
            Err(shared) => Spec {
                name: shared.name,
                converters: shared.converters.clone(),
                validators: shared.validators.clone(),
            },
        };
        f(&mut spec);
        Self { spec: Arc::new(spec) }
    }

    /// Convert then validate `value`.
    pub fn create(&self, value: T) -> Result<Refined<T>, FlowError> {
        let value = self.spec.converters.iter().fold(value, |v, c| c(v));
        let rejected = self.spec.validators.iter().find(|(_, check)| !check(&value));
        if let Some(&(validator, _)) = rejected {
            tracing::debug!(type_name = self.spec.name, validator, "validation rejected {value:?}");
            return Err(FlowError::Validation {
                type_name: self.spec.name,
                validator,
                value: format!("{value:?}"),
            });
        }
        Ok(Refined {
            inner: value,
            spec: self.clone(),
        })
    }
}

/// A value accepted by a [`NewType`].
pub struct Refined<T> {
    inner: T,
    spec: NewType<T>,
}

impl<T: Debug> Refined<T> {
    pub fn value(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn name(&self) -> &'static str {
        self.spec.name()
    }

    /// Transform the value and re-run the type's converters and validators.
    pub fn map<F: FnOnce(T) -> T>(self, f: F) -> Result<Refined<T>, FlowError> {
        let Refined { inner, spec } = self;
        spec.create(f(inner))
    }
}

impl<T: Clone> Clone for Refined<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            spec: self.spec.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq for Refined<T> {
    fn eq(&self, other: &Self) -> bool {
        self.spec.spec.name == other.spec.spec.name && self.inner == other.inner
    }
}

impl<T: Debug> Debug for Refined<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(self.spec.spec.name).field(&self.inner).finish()
    }
}
