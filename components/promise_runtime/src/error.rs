//! Errors raised by the event loop itself.
//!
//! Promise failures never show up here; they travel down the chain as
//! rejections.

use core_types::JsError;
use thiserror::Error;

/// Failure while driving an [`EventLoop`](crate::EventLoop).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A host task returned an error.
    #[error("host task failed: {0}")]
    TaskFailed(#[from] JsError),

    /// The configured per-drain microtask budget ran out with work still
    /// queued.
    #[error("microtask budget of {budget} exhausted before the queue drained")]
    MicrotaskBudgetExceeded {
        /// The configured budget
        budget: usize,
    },
}
