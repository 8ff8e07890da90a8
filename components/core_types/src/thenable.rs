//! The thenable interoperability boundary.
//!
//! Any object exposing a callable `then(onFulfilled, onRejected)` can be
//! adopted by a promise. Foreign asynchronous objects implement [`Thenable`]
//! and travel through promise chains as [`Value::Thenable`].

use crate::Value;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A resolver function handed to [`Thenable::then`].
///
/// Cloning a `Callback` shares the same underlying closure. Callbacks may be
/// invoked any number of times; the receiving side is responsible for
/// ignoring every call after the first.
#[derive(Clone)]
pub struct Callback {
    inner: Rc<dyn Fn(Value)>,
}

impl Callback {
    /// Creates a new Callback from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) + 'static,
    {
        Self { inner: Rc::new(f) }
    }

    /// Invokes the callback with `value`.
    pub fn call(&self, value: Value) {
        (self.inner)(value)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback {{ ... }}")
    }
}

/// A value exposing a callable `then`.
///
/// Returning `Err(reason)` models a `then` method that throws; a promise
/// adopting the thenable rejects with `reason` unless one of the callbacks
/// already fired.
pub trait Thenable: Any {
    /// Registers the two resolver callbacks.
    fn then(&self, on_fulfilled: Callback, on_rejected: Callback) -> Result<(), Value>;

    /// Upcast used to recognise concrete thenable types (e.g. a promise being
    /// resolved with itself).
    fn as_any(&self) -> &dyn Any;
}

/// A thenable backed by a closure.
///
/// # Examples
///
/// ```
/// use core_types::{FnThenable, Value};
///
/// let thenable = Value::thenable(FnThenable::new(|on_fulfilled, _on_rejected| {
///     on_fulfilled.call(Value::Smi(42));
///     Ok(())
/// }));
///
/// assert!(thenable.is_thenable());
/// ```
pub struct FnThenable {
    then: Box<dyn Fn(Callback, Callback) -> Result<(), Value>>,
}

impl FnThenable {
    /// Creates a thenable whose `then` runs `f`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Callback, Callback) -> Result<(), Value> + 'static,
    {
        Self { then: Box::new(f) }
    }
}

impl Thenable for FnThenable {
    fn then(&self, on_fulfilled: Callback, on_rejected: Callback) -> Result<(), Value> {
        (self.then)(on_fulfilled, on_rejected)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for FnThenable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnThenable {{ ... }}")
    }
}
