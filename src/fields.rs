//! Optional Field Access
//!
//! Missing optional fields take a typed default instead of failing.
//! A field holding the wrong JSON type counts as missing.

use serde_json::{Map, Number, Value};

/// Conversion from a JSON value into a field type, `None` on type mismatch.
pub trait FromField<'a>: Sized {
    fn from_field(value: &'a Value) -> Option<Self>;
}

impl<'a> FromField<'a> for &'a str {
    fn from_field(value: &'a Value) -> Option<Self> {
        value.as_str()
    }
}

impl<'a> FromField<'a> for u64 {
    fn from_field(value: &'a Value) -> Option<Self> {
        value.as_u64()
    }
}

impl<'a> FromField<'a> for i64 {
    fn from_field(value: &'a Value) -> Option<Self> {
        value.as_i64()
    }
}

impl<'a> FromField<'a> for &'a Number {
    fn from_field(value: &'a Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl<'a> FromField<'a> for f64 {
    fn from_field(value: &'a Value) -> Option<Self> {
        value.as_f64()
    }
}

impl<'a> FromField<'a> for &'a [Value] {
    fn from_field(value: &'a Value) -> Option<Self> {
        value.as_array().map(Vec::as_slice)
    }
}

impl<'a> FromField<'a> for &'a Map<String, Value> {
    fn from_field(value: &'a Value) -> Option<Self> {
        value.as_object()
    }
}

/// Typed reads over a JSON object.
pub trait Fields {
    /// The field converted to `T`, or `None` when absent or mistyped.
    fn field<'a, T: FromField<'a>>(&'a self, key: &str) -> Option<T>;

    /// The field converted to `T`, or `default` when absent or mistyped.
    fn field_or<'a, T: FromField<'a>>(&'a self, key: &str, default: T) -> T {
        self.field(key).unwrap_or(default)
    }
}

impl Fields for Map<String, Value> {
    fn field<'a, T: FromField<'a>>(&'a self, key: &str) -> Option<T> {
        self.get(key).and_then(T::from_field)
    }
}

impl Fields for Value {
    fn field<'a, T: FromField<'a>>(&'a self, key: &str) -> Option<T> {
        self.get(key).and_then(T::from_field)
    }
}
