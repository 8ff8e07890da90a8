//! Dynamically typed values carried through promise chains.
//!
//! A promise's outcome can be any JavaScript value: a primitive, an ordered
//! collection, an error object, opaque host data, or a thenable that must be
//! adopted rather than stored.

use crate::{JsError, Thenable};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Represents any JavaScript value.
///
/// Objects are reference types: two `NativeObject` or `Thenable` values are
/// equal only when they point at the same allocation.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let list = Value::Array(vec![Value::from("a"), Value::from("b")]);
///
/// assert!(!undefined.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(list.as_array().map(|items| items.len()), Some(2));
/// ```
#[derive(Clone)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// JavaScript string value
    String(std::string::String),
    /// Ordered collection (an array literal)
    Array(Vec<Value>),
    /// Error object
    Error(JsError),
    /// Opaque host object; never treated as a thenable
    NativeObject(Rc<dyn Any>),
    /// Object exposing a callable `then`
    Thenable(Rc<dyn Thenable>),
}

impl Value {
    /// Wraps a [`Thenable`] implementation as a value.
    pub fn thenable<T: Thenable>(thenable: T) -> Self {
        Value::Thenable(Rc::new(thenable))
    }

    /// Returns whether this value is truthy in JavaScript semantics.
    ///
    /// `undefined`, `null`, `false`, `0`, `NaN` and `""` are falsy; every
    /// object (arrays, errors, thenables) is truthy.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert!(!Value::Undefined.is_truthy());
    /// assert!(!Value::Null.is_truthy());
    /// assert!(!Value::from("").is_truthy());
    /// assert!(!Value::Double(f64::NAN).is_truthy());
    ///
    /// assert!(Value::from("boom").is_truthy());
    /// assert!(Value::Array(vec![]).is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Smi(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Error(_) | Value::NativeObject(_) | Value::Thenable(_) => true,
        }
    }

    /// Returns true if this value exposes a callable `then`.
    pub fn is_thenable(&self) -> bool {
        matches!(self, Value::Thenable(_))
    }

    /// Returns the thenable behind this value, if any.
    pub fn as_thenable(&self) -> Option<&Rc<dyn Thenable>> {
        match self {
            Value::Thenable(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the elements of an array value.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

fn same_object<T: ?Sized, U: ?Sized>(a: &Rc<T>, b: &Rc<U>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Value::NativeObject(_) => write!(f, "NativeObject(...)"),
            Value::Thenable(_) => write!(f, "Thenable(...)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::NativeObject(a), Value::NativeObject(b)) => same_object(a, b),
            (Value::Thenable(a), Value::Thenable(b)) => same_object(a, b),
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<JsError> for Value {
    fn from(error: JsError) -> Self {
        Value::Error(error)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Smi(n) => serializer.serialize_i32(*n),
            Value::Double(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Error(e) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("name", e.kind.name())?;
                map.serialize_entry("message", &e.message)?;
                map.end()
            }
            Value::NativeObject(_) => serializer.serialize_str("[object Object]"),
            Value::Thenable(_) => serializer.serialize_str("[object Thenable]"),
        }
    }
}
