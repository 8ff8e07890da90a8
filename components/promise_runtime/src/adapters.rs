//! Bridges from callback-style APIs to promises.
//!
//! A callback-style function takes its arguments plus a trailing
//! `callback(error, value)`; a truthy `error` means failure.

use crate::promise::Promise;
use crate::scheduler::{default_scheduler, SharedScheduler};
use core_types::{Callback, Value};

/// The trailing `callback(error, value)` handed to a callback-style function.
///
/// Only the first call has any effect on the promise.
#[derive(Debug, Clone)]
pub struct NodeCallback {
    promise: Promise,
}

impl NodeCallback {
    /// Rejects with `error` if it is truthy, otherwise fulfills with `value`.
    pub fn call(&self, error: Value, value: Value) {
        if error.is_truthy() {
            self.promise.reject(error);
        } else {
            self.promise.fulfill(value);
        }
    }
}

/// A pending promise together with bound resolver functions.
///
/// The resolvers capture the promise, so they can be handed around as plain
/// values without losing their receiver.
#[derive(Debug, Clone)]
pub struct Deferred {
    /// The promise controlled by `resolve` and `reject`
    pub promise: Promise,
    /// Resolves `promise`, adopting thenables
    pub resolve: Callback,
    /// Rejects `promise`
    pub reject: Callback,
}

impl Promise {
    /// Calls `f(args, callback)` now and returns a promise for its result.
    ///
    /// Uses the thread's default event loop. See [`Promise::promisify_in`].
    pub fn promisify<F>(f: F, args: Vec<Value>) -> Promise
    where
        F: FnOnce(Vec<Value>, NodeCallback),
    {
        Self::promisify_in(&default_scheduler(), f, args)
    }

    /// Calls `f(args, callback)` now and returns a promise for its result.
    ///
    /// `f` runs synchronously, before this returns.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_runtime::{EventLoop, Promise, PromiseState};
    /// use core_types::Value;
    ///
    /// let event_loop = EventLoop::new();
    /// let promise = Promise::promisify_in(
    ///     &event_loop.scheduler(),
    ///     |_args, callback| callback.call(Value::Null, Value::from("x")),
    ///     vec![],
    /// );
    /// assert_eq!(promise.inspect().value, Value::from("x"));
    /// ```
    pub fn promisify_in<F>(scheduler: &SharedScheduler, f: F, args: Vec<Value>) -> Promise
    where
        F: FnOnce(Vec<Value>, NodeCallback),
    {
        let promise = Promise::new_in(scheduler);
        f(
            args,
            NodeCallback {
                promise: promise.clone(),
            },
        );
        promise
    }

    /// Wraps `f` into a reusable promise-returning function.
    ///
    /// Uses the thread's default event loop. See [`Promise::prepare_in`].
    pub fn prepare<F>(f: F) -> impl Fn(Vec<Value>) -> Promise
    where
        F: Fn(Vec<Value>, NodeCallback) + 'static,
    {
        Self::prepare_in(default_scheduler(), f)
    }

    /// Wraps `f` into a reusable promise-returning function.
    ///
    /// Nothing is called until the returned function is; each invocation
    /// calls `f` once and returns a fresh promise.
    pub fn prepare_in<F>(scheduler: SharedScheduler, f: F) -> impl Fn(Vec<Value>) -> Promise
    where
        F: Fn(Vec<Value>, NodeCallback) + 'static,
    {
        move |args| Self::promisify_in(&scheduler, &f, args)
    }

    /// Creates a pending promise with bound resolvers on the default event
    /// loop.
    pub fn deferred() -> Deferred {
        Self::deferred_in(&default_scheduler())
    }

    /// Creates a pending promise with bound resolvers.
    pub fn deferred_in(scheduler: &SharedScheduler) -> Deferred {
        let promise = Promise::new_in(scheduler);
        let resolve = {
            let promise = promise.clone();
            Callback::new(move |value| {
                promise.fulfill(value);
            })
        };
        let reject = {
            let promise = promise.clone();
            Callback::new(move |reason| {
                promise.reject(reason);
            })
        };
        Deferred {
            promise,
            resolve,
            reject,
        }
    }
}
