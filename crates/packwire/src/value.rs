//! [`Value`] - the closed value model the codec encodes and decodes.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use malachite::Integer;

use crate::timestamp::Timestamp;

/// A MessagePack value.
///
/// Integers come in three representations: [`Value::Int`] covers the whole
/// `i64` range, [`Value::UInt`] is what the decoder produces for values above
/// `i64::MAX`, and [`Value::BigInt`] is the arbitrary-precision fallback.
/// A `BigInt` that fits the native range decodes back as `Int`/`UInt`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    /// A value with no wire representation. Encodes as nil.
    Undefined,
    Bool(bool),
    Int(i64),
    UInt(u64),
    BigInt(Integer),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<Value>),
    /// Ordered association; keys are arbitrary values.
    Map(Vec<(Value, Value)>),
    /// A raw extension, not interpreted by any registry.
    Ext(Extension),
    /// The predefined timestamp extension (type -1).
    Timestamp(Timestamp),
    /// An application object, encodable only through an
    /// [`ExtensionRegistry`](crate::ExtensionRegistry) entry.
    Custom(CustomValue),
}

impl Value {
    /// Builds a map from string keys.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::Str(k.into()), v))
                .collect(),
        )
    }

    /// Wraps an application object.
    pub fn custom<T: CustomObject>(object: T) -> Self {
        Value::Custom(CustomValue::new(object))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil | Value::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            Value::BigInt(n) => crate::int64::bigint_to_i64(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up the first entry whose key is the string `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }
}

/// Tears nested containers down with an explicit stack so dropping a deeply
/// nested value never recurses.
impl Drop for Value {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_nested(self, &mut pending);
        while let Some(mut value) = pending.pop() {
            detach_nested(&mut value, &mut pending);
        }
    }
}

fn has_children(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Map(entries) => !entries.is_empty(),
        _ => false,
    }
}

/// Moves the children of `value` onto `pending` when any of them nests further.
fn detach_nested(value: &mut Value, pending: &mut Vec<Value>) {
    match value {
        Value::Array(items) if items.iter().any(has_children) => pending.append(items),
        Value::Map(entries)
            if entries
                .iter()
                .any(|(k, v)| has_children(k) || has_children(v)) =>
        {
            for (k, v) in entries.drain(..) {
                pending.push(k);
                pending.push(v);
            }
        }
        _ => {}
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        i64::try_from(u).map_or(Value::UInt(u), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::F32(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Integer> for Value {
    fn from(n: Integer) -> Self {
        Value::BigInt(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

/// A raw MessagePack extension: a signed type id and its payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Extension {
    pub type_id: i8,
    pub data: Vec<u8>,
}

impl Extension {
    pub fn new(type_id: i8, data: Vec<u8>) -> Self {
        Self { type_id, data }
    }
}

/// Object-safe view of an application type carried by [`Value::Custom`].
///
/// Implemented for every `'static` type that is `Debug + PartialEq + Send +
/// Sync`, so application structs need no manual impl.
pub trait CustomObject: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn CustomObject) -> bool;
}

impl<T> CustomObject for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn CustomObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// Shared handle to an application object.
#[derive(Clone)]
pub struct CustomValue(Arc<dyn CustomObject>);

impl CustomValue {
    pub fn new<T: CustomObject>(object: T) -> Self {
        Self(Arc::new(object))
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomValue").field(&self.0).finish()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_ref())
    }
}
