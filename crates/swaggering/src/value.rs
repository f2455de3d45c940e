//! Conversions between typed field storage and untyped JSON values.
//!
//! Every field of a DTO is stored as a plain Rust value, but the field accessor
//! contract moves values around as [`Value`]s. [`FieldValue`] is the runtime
//! type check between the two: it accepts a [`Value`] only if it matches the
//! declared semantic type of the field.
use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
    ops::Deref,
};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Map, Value};
use snafu::{OptionExt, Snafu};
use strum::Display;

use crate::fielder::FieldError;

/// The kind of a JSON value, used when reporting conversion failures.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl From<&Value> for JsonKind {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

/// The error type for value conversions.
#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum ValueError {
    /// The value does not match the declared type. Reports the offending
    /// value, its JSON kind and the name of the expected type.
    #[snafu(display("value {value} ({found}) couldn't be cast to type {expected}"))]
    Mismatch {
        value: Value,
        found: JsonKind,
        expected: Cow<'static, str>,
    },

    /// A nested DTO could not be populated from the provided object.
    #[snafu(display("failed to populate nested {type_name}"))]
    Nested {
        type_name: &'static str,
        source: Box<FieldError>,
    },

    /// The schema of a DTO refers to a slot its storage doesn't have.
    #[snafu(display("{type_name} has no field slot {index}"))]
    NoSuchSlot { type_name: &'static str, index: usize },
}

/// Builds a [`ValueError::Mismatch`] for `value`, which was expected to be a
/// `T`.
pub fn mismatch<T: FieldValue>(value: Value) -> ValueError {
    MismatchSnafu {
        found: JsonKind::from(&value),
        value,
        expected: T::type_name(),
    }
    .build()
}

/// A type which can be stored in a DTO field.
///
/// Implementations exist for the semantic types used by REST DTOs: strings,
/// 32/64-bit integers, floating point numbers, booleans, [`ByteString`]s,
/// sequences, string- or integer-keyed maps, optional values and boxed values.
/// DTOs derived with [`Fielder`](derive@crate::Fielder) and enums derived with
/// [`FieldEnum`](derive@crate::FieldEnum) implement it as well, which makes
/// nesting work.
pub trait FieldValue: Sized {
    /// The name of the type, as reported in conversion errors.
    fn type_name() -> Cow<'static, str>;

    /// Converts `value` into `Self`, failing if it doesn't match the type.
    fn from_field_value(value: Value) -> Result<Self, ValueError>;

    /// Converts `self` into its JSON representation.
    fn to_field_value(&self) -> Value;
}

impl FieldValue for Value {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("any")
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }

    fn to_field_value(&self) -> Value {
        self.clone()
    }
}

impl FieldValue for String {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("string")
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::String(string) => Ok(string),
            other => Err(mismatch::<Self>(other)),
        }
    }

    fn to_field_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FieldValue for bool {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("bool")
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(boolean) => Ok(boolean),
            other => Err(mismatch::<Self>(other)),
        }
    }

    fn to_field_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! impl_integer_field_value {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn type_name() -> Cow<'static, str> {
                    Cow::Borrowed($name)
                }

                fn from_field_value(value: Value) -> Result<Self, ValueError> {
                    // Fractional and out-of-range numbers are rejected rather than truncated
                    value
                        .as_i64()
                        .and_then(|number| <$ty>::try_from(number).ok())
                        .ok_or_else(|| mismatch::<Self>(value))
                }

                fn to_field_value(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

impl_integer_field_value!(i32 => "int32", i64 => "int64");

impl FieldValue for f64 {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("float64")
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        value.as_f64().ok_or_else(|| mismatch::<Self>(value))
    }

    fn to_field_value(&self) -> Value {
        Value::from(*self)
    }
}

impl FieldValue for f32 {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("float32")
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        value
            .as_f64()
            .map(|number| number as f32)
            // Out-of-range numbers would become infinite, which JSON can't carry
            .filter(|number| number.is_finite())
            .ok_or_else(|| mismatch::<Self>(value))
    }

    fn to_field_value(&self) -> Value {
        Value::from(*self)
    }
}

/// An opaque sequence of bytes, carried over the wire as a base64 string
/// (standard alphabet, padded).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ByteString(pub Vec<u8>);

impl ByteString {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for ByteString {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl FieldValue for ByteString {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("ByteString")
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::String(encoded) => match STANDARD.decode(&encoded) {
                Ok(bytes) => Ok(Self(bytes)),
                Err(_) => Err(mismatch::<Self>(Value::String(encoded))),
            },
            other => Err(mismatch::<Self>(other)),
        }
    }

    fn to_field_value(&self) -> Value {
        Value::String(STANDARD.encode(&self.0))
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn type_name() -> Cow<'static, str> {
        Cow::Owned(format!("[]{}", T::type_name()))
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_field_value).collect(),
            other => Err(mismatch::<Self>(other)),
        }
    }

    fn to_field_value(&self) -> Value {
        Value::Array(self.iter().map(T::to_field_value).collect())
    }
}

/// `None` corresponds to JSON `null`.
impl<T: FieldValue> FieldValue for Option<T> {
    fn type_name() -> Cow<'static, str> {
        Cow::Owned(format!("*{}", T::type_name()))
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_field_value(other).map(Some),
        }
    }

    fn to_field_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, T::to_field_value)
    }
}

impl<T: FieldValue> FieldValue for Box<T> {
    fn type_name() -> Cow<'static, str> {
        T::type_name()
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        T::from_field_value(value).map(Box::new)
    }

    fn to_field_value(&self) -> Value {
        T::to_field_value(self)
    }
}

/// A type which can be used as the key of a map field.
///
/// JSON object keys are always strings, so integer keys are carried as their
/// decimal representation.
pub trait MapKey: Sized {
    fn key_type_name() -> &'static str;

    /// Parses a JSON object key, returning `None` if it is not a valid `Self`.
    fn from_key(key: &str) -> Option<Self>;

    fn to_key(&self) -> String;
}

impl MapKey for String {
    fn key_type_name() -> &'static str {
        "string"
    }

    fn from_key(key: &str) -> Option<Self> {
        Some(key.to_owned())
    }

    fn to_key(&self) -> String {
        self.clone()
    }
}

macro_rules! impl_integer_map_key {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl MapKey for $ty {
                fn key_type_name() -> &'static str {
                    $name
                }

                fn from_key(key: &str) -> Option<Self> {
                    key.parse().ok()
                }

                fn to_key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_integer_map_key!(i32 => "int32", i64 => "int64");

fn map_type_name<K: MapKey, V: FieldValue>() -> Cow<'static, str> {
    Cow::Owned(format!("map[{}]{}", K::key_type_name(), V::type_name()))
}

fn entries_from_value<M, K, V>(value: Value) -> Result<M, ValueError>
where
    M: FieldValue + FromIterator<(K, V)>,
    K: MapKey,
    V: FieldValue,
{
    match value {
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, value)| {
                let parsed = K::from_key(&key).context(MismatchSnafu {
                    value: Value::String(key.clone()),
                    found: JsonKind::String,
                    expected: K::key_type_name(),
                })?;
                Ok::<_, ValueError>((parsed, V::from_field_value(value)?))
            })
            .collect(),
        other => Err(mismatch::<M>(other)),
    }
}

fn entries_to_value<'a, K, V>(entries: impl IntoIterator<Item = (&'a K, &'a V)>) -> Value
where
    K: MapKey + 'a,
    V: FieldValue + 'a,
{
    Value::Object(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_key(), value.to_field_value()))
            .collect::<Map<_, _>>(),
    )
}

impl<K, V> FieldValue for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: FieldValue,
{
    fn type_name() -> Cow<'static, str> {
        map_type_name::<K, V>()
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        entries_from_value(value)
    }

    fn to_field_value(&self) -> Value {
        entries_to_value(self)
    }
}

impl<K, V, S> FieldValue for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: FieldValue,
    S: BuildHasher + Default,
{
    fn type_name() -> Cow<'static, str> {
        map_type_name::<K, V>()
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        entries_from_value(value)
    }

    fn to_field_value(&self) -> Value {
        entries_to_value(self)
    }
}
