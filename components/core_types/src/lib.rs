//! Core JavaScript value types and error handling.
//!
//! This crate provides the foundational types shared by promise producers and
//! consumers: the dynamic value representation, error types, and the
//! thenable interoperability trait.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`JsError`] - JavaScript errors
//! - [`ErrorKind`] - Types of JavaScript errors
//! - [`Thenable`] - Any object exposing a callable `then`
//! - [`Callback`] - Resolver function passed to a thenable
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, Value};
//!
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//!
//! let error = JsError::type_error("undefined is not a function");
//! assert_eq!(error.kind, ErrorKind::TypeError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod thenable;
mod value;

pub use error::{ErrorKind, JsError};
pub use thenable::{Callback, FnThenable, Thenable};
pub use value::Value;
