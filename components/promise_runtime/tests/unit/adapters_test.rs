//! Unit tests for promisify, prepare and deferred

use super::setup;
use core_types::{FnThenable, JsError, Value};
use promise_runtime::{NodeCallback, Promise, PromiseState, Task};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn promisify_fulfills_on_success() {
    let (_el, scheduler) = setup();
    let promise = Promise::promisify_in(
        &scheduler,
        |_args, callback| callback.call(Value::Null, Value::from("some data.")),
        vec![],
    );
    assert_eq!(promise.state(), PromiseState::Fulfilled);
    assert_eq!(promise.inspect().value, Value::from("some data."));
}

#[test]
fn promisify_rejects_on_truthy_error() {
    let (_el, scheduler) = setup();
    let promise = Promise::promisify_in(
        &scheduler,
        |_args, callback| callback.call(Value::from("some data."), Value::Null),
        vec![],
    );
    assert_eq!(promise.state(), PromiseState::Rejected);
    assert_eq!(promise.inspect().value, Value::from("some data."));
}

#[test]
fn promisify_treats_falsy_error_as_success() {
    let (_el, scheduler) = setup();
    for falsy in [Value::Undefined, Value::Null, Value::Boolean(false), Value::Smi(0), Value::from("")] {
        let promise = Promise::promisify_in(
            &scheduler,
            move |_args, callback| callback.call(falsy, Value::Smi(1)),
            vec![],
        );
        assert_eq!(promise.state(), PromiseState::Fulfilled);
    }
}

#[test]
fn promisify_passes_arguments_and_calls_synchronously() {
    let (_el, scheduler) = setup();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();

    Promise::promisify_in(
        &scheduler,
        move |args, _callback| s.borrow_mut().extend(args),
        vec![Value::from("some data."), Value::from("some other data.")],
    );

    assert_eq!(
        *seen.borrow(),
        vec![Value::from("some data."), Value::from("some other data.")]
    );
}

#[test]
fn promisify_with_deferred_callback() {
    let (el, scheduler) = setup();
    let handle = el.clone();
    let promise = Promise::promisify_in(
        &scheduler,
        move |_args, callback: NodeCallback| {
            handle.enqueue_task(Task::new(move || {
                callback.call(Value::Undefined, Value::from("async"));
                Ok(())
            }));
        },
        vec![],
    );
    assert_eq!(promise.state(), PromiseState::Pending);

    el.run_until_done().unwrap();
    assert_eq!(promise.inspect().value, Value::from("async"));
}

#[test]
fn prepare_defers_call_until_invoked() {
    let (_el, scheduler) = setup();
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();

    let prepared = Promise::prepare_in(scheduler, move |args, callback| {
        c.set(c.get() + 1);
        callback.call(Value::Null, args.first().cloned().unwrap_or_default());
    });
    assert_eq!(calls.get(), 0);

    let a = prepared(vec![Value::from("a")]);
    let b = prepared(vec![Value::from("b")]);

    assert_eq!(calls.get(), 2);
    assert!(!a.ptr_eq(&b));
    assert_eq!(a.inspect().value, Value::from("a"));
    assert_eq!(b.inspect().value, Value::from("b"));
}

#[test]
fn prepare_rejects_on_error() {
    let (_el, scheduler) = setup();
    let prepared = Promise::prepare_in(scheduler, |_args, callback| {
        callback.call(Value::from(JsError::error("io")), Value::Undefined)
    });
    let promise = prepared(vec![]);
    assert_eq!(promise.inspect().value, Value::from(JsError::error("io")));
}

#[test]
fn deferred_resolve_adopts_thenables() {
    let (_el, scheduler) = setup();
    let deferred = Promise::deferred_in(&scheduler);
    deferred.resolve.call(Value::thenable(FnThenable::new(|on_fulfilled, _| {
        on_fulfilled.call(Value::Smi(3));
        Ok(())
    })));
    assert_eq!(deferred.promise.inspect().value, Value::Smi(3));
}

#[test]
fn deferred_resolvers_settle_once() {
    let (_el, scheduler) = setup();
    let deferred = Promise::deferred_in(&scheduler);
    deferred.reject.call(Value::from("r"));
    deferred.resolve.call(Value::from("v"));
    assert_eq!(deferred.promise.state(), PromiseState::Rejected);
}
