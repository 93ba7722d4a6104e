//! Type-erased return values
//!
//! An [`Outcome`] carries whatever a member returned: a plain value, an
//! aggregate, `()` for void members, or a future-like handle. Handles are
//! never awaited or unwrapped here; they are forwarded like any other value.

use std::any::{type_name, Any};
use std::fmt;

use crate::error::{ProxyError, ProxyResult};

/// The value produced by a chain link
pub struct Outcome {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Outcome {
    /// Wrap a value
    pub fn new<R>(value: R) -> Self
    where
        R: Any + Send,
    {
        Outcome {
            value: Box::new(value),
            type_name: type_name::<R>(),
        }
    }

    /// The outcome of a void member
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Rust type name of the carried value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if the carried value is an `R`
    pub fn is<R: Any>(&self) -> bool {
        self.value.is::<R>()
    }

    /// Borrow the carried value as an `R`
    pub fn downcast_ref<R: Any>(&self) -> Option<&R> {
        self.value.downcast_ref::<R>()
    }

    /// Take the carried value as an `R`
    ///
    /// # Errors
    ///
    /// `ReturnTypeMismatch` naming `method` if the value has another type.
    pub fn downcast<R: Any>(self, method: &str) -> ProxyResult<R> {
        let actual = self.type_name;
        self.value
            .downcast::<R>()
            .map(|v| *v)
            .map_err(|_| ProxyError::ReturnTypeMismatch {
                method: method.to_string(),
                expected: type_name::<R>(),
                actual,
            })
    }

    /// Take the carried value as an `R`, handing the outcome back on mismatch
    pub fn try_downcast<R: Any>(self) -> Result<R, Outcome> {
        let type_name = self.type_name;
        self.value
            .downcast::<R>()
            .map(|v| *v)
            .map_err(|value| Outcome { value, type_name })
    }

    /// Transform the carried value
    ///
    /// # Errors
    ///
    /// `ReturnTypeMismatch` naming `method` if the value is not an `R`.
    pub fn map<R, S, F>(self, method: &str, f: F) -> ProxyResult<Outcome>
    where
        R: Any,
        S: Any + Send,
        F: FnOnce(R) -> S,
    {
        self.downcast::<R>(method).map(|r| Outcome::new(f(r)))
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcome")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
