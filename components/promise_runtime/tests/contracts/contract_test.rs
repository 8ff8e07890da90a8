//! Contract tests for promise_runtime
//!
//! Each module pins one documented guarantee of the public promise API.

use core_types::{FnThenable, JsError, Value};
use promise_runtime::{EventLoop, Function, Promise, PromiseState, SharedScheduler, Task};
use std::cell::RefCell;
use std::rc::Rc;

fn setup() -> (EventLoop, SharedScheduler) {
    let event_loop = EventLoop::new();
    let scheduler = event_loop.scheduler();
    (event_loop, scheduler)
}

mod monotonic_settlement {
    use super::*;

    #[test]
    fn only_first_call_has_effect() {
        let (_el, scheduler) = setup();
        let sequences: Vec<Vec<(bool, i32)>> = vec![
            vec![(true, 1), (false, 2), (true, 3)],
            vec![(false, 1), (true, 2)],
            vec![(false, 1), (false, 2), (false, 3)],
            vec![(true, 1), (true, 2)],
        ];

        for calls in sequences {
            let promise = Promise::new_in(&scheduler);
            for &(fulfill, n) in &calls {
                if fulfill {
                    promise.fulfill(Value::Smi(n));
                } else {
                    promise.reject(Value::Smi(n));
                }
            }

            let (first_fulfill, first_value) = calls[0];
            let expected = if first_fulfill {
                PromiseState::Fulfilled
            } else {
                PromiseState::Rejected
            };
            let snapshot = promise.inspect();
            assert_eq!(snapshot.state, expected);
            assert_eq!(snapshot.value, Value::Smi(first_value));
        }
    }
}

mod pass_through {
    use super::*;

    #[test]
    fn rejection_skips_then_without_rejection_handler() {
        let (el, scheduler) = setup();
        let promise = Promise::new_in(&scheduler);
        let seen = Rc::new(RefCell::new(None));

        let s = seen.clone();
        promise.then(None, None).then(
            None,
            Some(Function::new(move |reason| {
                *s.borrow_mut() = Some(reason);
                Ok(Value::Undefined)
            })),
        );

        promise.reject(Value::from("R"));
        el.run_until_done().unwrap();
        assert_eq!(*seen.borrow(), Some(Value::from("R")));
    }

    #[test]
    fn fulfillment_skips_then_with_only_rejection_handler() {
        let (el, scheduler) = setup();
        let promise = Promise::resolved_in(&scheduler, Value::Smi(7));
        let chained = promise
            .then(None, Some(Function::new(|_| Ok(Value::from("wrong")))))
            .then(Some(Function::new(Ok)), None);

        el.run_until_done().unwrap();
        assert_eq!(chained.inspect().value, Value::Smi(7));
    }
}

mod thenable_assimilation {
    use super::*;

    #[test]
    fn fulfills_with_thenable_result_not_the_thenable() {
        let (_el, scheduler) = setup();
        let promise = Promise::new_in(&scheduler);
        promise.fulfill(Value::thenable(FnThenable::new(|f, _r| {
            f.call(Value::Smi(42));
            Ok(())
        })));

        assert_eq!(promise.inspect().value, Value::Smi(42));
    }

    #[test]
    fn resolver_called_twice_uses_first_call() {
        let (_el, scheduler) = setup();
        let promise = Promise::new_in(&scheduler);
        promise.fulfill(Value::thenable(FnThenable::new(|f, r| {
            f.call(Value::from("once"));
            r.call(Value::from("twice"));
            Ok(())
        })));

        let snapshot = promise.inspect();
        assert_eq!(snapshot.state, PromiseState::Fulfilled);
        assert_eq!(snapshot.value, Value::from("once"));
    }
}

mod aggregation {
    use super::*;

    #[test]
    fn order_follows_input_not_settlement() {
        let (el, scheduler) = setup();
        let p1 = Promise::new_in(&scheduler);
        let p2 = Promise::new_in(&scheduler);
        let all = Promise::all_in(&scheduler, vec![Value::from(p1.clone()), Value::from(p2.clone())]);

        p2.fulfill(Value::from("b"));
        el.run_until_done().unwrap();
        p1.fulfill(Value::from("a"));
        el.run_until_done().unwrap();

        assert_eq!(
            all.inspect().value,
            Value::Array(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn rejection_before_other_settles_wins() {
        let (el, scheduler) = setup();
        let p1 = Promise::new_in(&scheduler);
        let p2 = Promise::new_in(&scheduler);
        let all = Promise::all_in(&scheduler, vec![Value::from(p1.clone()), Value::from(p2.clone())]);

        let later = p1.clone();
        p2.reject(Value::from("err"));
        el.enqueue_task(Task::new(move || {
            later.fulfill(Value::from("a"));
            Ok(())
        }));
        el.run_until_done().unwrap();

        let snapshot = all.inspect();
        assert_eq!(snapshot.state, PromiseState::Rejected);
        assert_eq!(snapshot.value, Value::from("err"));
    }

    #[test]
    fn empty_collection_fulfills_with_empty_collection() {
        let (_el, scheduler) = setup();
        let all = Promise::all_in(&scheduler, Vec::<Value>::new());
        assert_eq!(all.inspect().value, Value::Array(vec![]));
    }
}

mod no_reentrant_callbacks {
    use super::*;

    #[test]
    fn then_on_settled_promise_stays_pending_synchronously() {
        let (el, scheduler) = setup();
        let promise = Promise::resolved_in(&scheduler, Value::Smi(1));
        let chained = promise.then(Some(Function::new(Ok)), None);

        assert_eq!(chained.inspect().state, PromiseState::Pending);
        el.run_until_done().unwrap();
        assert_eq!(chained.inspect().state, PromiseState::Fulfilled);
    }

    #[test]
    fn pass_through_is_also_deferred() {
        let (el, scheduler) = setup();
        let promise = Promise::rejected_in(&scheduler, Value::Smi(1));
        let chained = promise.then(None, None);

        assert_eq!(chained.state(), PromiseState::Pending);
        el.run_until_done().unwrap();
        assert_eq!(chained.state(), PromiseState::Rejected);
    }
}

mod callback_adapters {
    use super::*;

    #[test]
    fn promisify_success_fulfills() {
        let (_el, scheduler) = setup();
        let promise = Promise::promisify_in(
            &scheduler,
            |_, cb| cb.call(Value::Null, Value::from("x")),
            vec![],
        );
        assert_eq!(promise.inspect().value, Value::from("x"));
    }

    #[test]
    fn promisify_error_rejects() {
        let (_el, scheduler) = setup();
        let promise = Promise::promisify_in(
            &scheduler,
            |_, cb| cb.call(Value::from("boom"), Value::Undefined),
            vec![],
        );
        let snapshot = promise.inspect();
        assert_eq!(snapshot.state, PromiseState::Rejected);
        assert_eq!(snapshot.value, Value::from("boom"));
    }
}

mod handler_exceptions {
    use super::*;

    #[test]
    fn throwing_handler_rejects_downstream_with_same_error() {
        let (el, scheduler) = setup();
        let thrown = JsError::error("x");
        let promise = Promise::resolved_in(&scheduler, Value::Undefined);

        let to_throw = thrown.clone();
        let chained = promise.then(
            Some(Function::new(move |_| Err(Value::from(to_throw)))),
            None,
        );
        el.run_until_done().unwrap();

        let snapshot = chained.inspect();
        assert_eq!(snapshot.state, PromiseState::Rejected);
        assert_eq!(snapshot.value, Value::Error(thrown));
    }
}
