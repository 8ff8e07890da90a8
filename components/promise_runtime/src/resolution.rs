//! The promise resolution procedure (Promises/A+ §2.3).
//!
//! Decides whether a value becoming a promise's outcome is stored directly or
//! unwrapped by chaining into a thenable.

use crate::promise::{Outcome, Promise};
use core_types::{Callback, JsError, Value};
use std::cell::Cell;
use std::rc::Rc;

thread_local! {
    // Thenables currently inside a synchronous `then` call on this thread.
    static ADOPTION_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        ADOPTION_DEPTH.with(|depth| depth.set(depth.get() + 1));
        DepthGuard
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        ADOPTION_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Resolves `promise` with `value`.
///
/// Non-thenables fulfill immediately. A promise resolved with itself rejects
/// with a `TypeError`. Any other thenable has its `then` called with a pair of
/// resolvers that share one guard, so only the first resolver call (or a
/// failure of `then` itself, if it comes first) decides the outcome.
pub(crate) fn resolve(promise: &Promise, value: Value) {
    let thenable = match value {
        Value::Thenable(thenable) => thenable,
        other => {
            promise.settle(Outcome::Fulfilled(other));
            return;
        }
    };

    if let Some(target) = thenable.as_any().downcast_ref::<Promise>() {
        if target.ptr_eq(promise) {
            tracing::debug!("promise resolved with itself");
            let error = JsError::type_error("Chaining cycle detected for promise");
            promise.settle(Outcome::Rejected(error.into()));
            return;
        }
    }

    let limit = promise.scheduler().adoption_limit();
    let depth = ADOPTION_DEPTH.with(Cell::get);
    if depth >= limit {
        tracing::debug!(depth, limit, "thenable adoption limit reached");
        let error = JsError::range_error(format!(
            "thenable adoption nested more than {limit} levels deep"
        ));
        promise.settle(Outcome::Rejected(error.into()));
        return;
    }

    promise.mark_resolving();
    tracing::trace!(depth, "adopting thenable");

    let called = Rc::new(Cell::new(false));
    let on_fulfilled = {
        let promise = promise.clone();
        let called = Rc::clone(&called);
        Callback::new(move |value| {
            if !called.replace(true) {
                resolve(&promise, value);
            }
        })
    };
    let on_rejected = {
        let promise = promise.clone();
        let called = Rc::clone(&called);
        Callback::new(move |reason| {
            if !called.replace(true) {
                promise.settle(Outcome::Rejected(reason));
            }
        })
    };

    let result = {
        let _guard = DepthGuard::enter();
        thenable.then(on_fulfilled, on_rejected)
    };

    if let Err(reason) = result {
        if !called.replace(true) {
            tracing::debug!(?reason, "thenable `then` failed");
            promise.settle(Outcome::Rejected(reason));
        }
    }
}
