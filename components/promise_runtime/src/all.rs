//! `Promise.all`: one promise for an ordered collection of outcomes.

use crate::promise::{Function, Promise, PromiseState};
use crate::scheduler::{default_scheduler, SharedScheduler};
use core_types::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

impl Promise {
    /// Combines `items` into a promise of their fulfillment values.
    ///
    /// Uses the thread's default event loop. See [`Promise::all_in`].
    pub fn all<I>(items: I) -> Promise
    where
        I: IntoIterator<Item = Value>,
    {
        Self::all_in(&default_scheduler(), items)
    }

    /// Combines `items` into a promise of their fulfillment values.
    ///
    /// Plain values count as already fulfilled; foreign thenables are adopted.
    /// The result fulfills with a `Value::Array` in input order once every
    /// item has fulfilled, or rejects with the first rejection reason. If
    /// nothing is left pending at call time the result is fulfilled before
    /// this returns.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_runtime::{EventLoop, Promise, PromiseState};
    /// use core_types::Value;
    ///
    /// let event_loop = EventLoop::new();
    /// let scheduler = event_loop.scheduler();
    ///
    /// let all = Promise::all_in(&scheduler, vec![Value::Smi(1), Value::from("two")]);
    /// assert_eq!(all.state(), PromiseState::Fulfilled);
    /// assert_eq!(all.inspect().value, Value::Array(vec![Value::Smi(1), Value::from("two")]));
    /// ```
    pub fn all_in<I>(scheduler: &SharedScheduler, items: I) -> Promise
    where
        I: IntoIterator<Item = Value>,
    {
        let sink = Promise::new_in(scheduler);
        let items: Vec<Value> = items.into_iter().collect();
        let results = Rc::new(RefCell::new(vec![Value::Undefined; items.len()]));
        let mut waiting = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            let source = match item {
                Value::Thenable(thenable) => match thenable.as_any().downcast_ref::<Promise>() {
                    Some(promise) => promise.clone(),
                    None => Promise::resolved_in(scheduler, Value::Thenable(thenable)),
                },
                plain => {
                    results.borrow_mut()[index] = plain;
                    continue;
                }
            };

            let snapshot = source.inspect();
            if snapshot.state == PromiseState::Fulfilled {
                results.borrow_mut()[index] = snapshot.value;
            } else {
                waiting.push((index, source));
            }
        }

        if waiting.is_empty() {
            sink.fulfill(Value::Array(results.take()));
            return sink;
        }

        let remaining = Rc::new(Cell::new(waiting.len()));
        for (index, source) in waiting {
            let on_fulfilled = {
                let sink = sink.clone();
                let results = Rc::clone(&results);
                let remaining = Rc::clone(&remaining);
                Function::new(move |value| {
                    results.borrow_mut()[index] = value;
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        sink.fulfill(Value::Array(results.take()));
                    }
                    Ok(Value::Undefined)
                })
            };
            let on_rejected = {
                let sink = sink.clone();
                Function::new(move |reason| {
                    sink.reject(reason);
                    Ok(Value::Undefined)
                })
            };
            source.then(Some(on_fulfilled), Some(on_rejected));
        }

        sink
    }
}
