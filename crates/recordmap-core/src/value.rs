//! In-memory values on the record side of a conversion.
//!
//! [`Value`] is a superset of JSON: every JSON value embeds into it
//! losslessly, and it adds record instances, domain values that only a
//! custom converter understands, and the `Unset` sentinel for a field that
//! exists on a record but holds nothing (which is not the same as null).

use indexmap::IndexMap;
use serde_json::Number;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::Json;

/// A domain value carried through the record side untouched.
///
/// Implemented for every `Debug + PartialEq + Send + Sync + 'static` type, so
/// dates, decimals or identifiers can live in a [`Value`] without wrapping.
pub trait OpaqueValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
    fn dyn_eq(&self, other: &dyn OpaqueValue) -> bool;
}

impl<T> OpaqueValue for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn dyn_eq(&self, other: &dyn OpaqueValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Field is present on the record but holds no value
    #[default]
    Unset,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    /// Keyed map, iterated in insertion order
    Map(IndexMap<String, Value>),
    Record(Record),
    Opaque(Arc<dyn OpaqueValue>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unset, Value::Unset) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => (**a).dyn_eq(&**b),
            _ => false,
        }
    }
}

impl Value {
    /// Wrap a domain value.
    pub fn opaque<T: OpaqueValue>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the domain value if it has type `T`.
    pub fn downcast_opaque<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(inner) => (**inner).as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Runtime shape of this value, as used in error reports.
    ///
    /// Lists render their elements: `[string,number,[boolean,null]]`.
    pub fn type_description(&self) -> String {
        match self {
            Value::Unset => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::String(_) => "string".to_string(),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::type_description).collect();
                format!("[{}]", inner.join(","))
            }
            Value::Map(_) => "object".to_string(),
            Value::Record(record) => record.type_name().to_string(),
            Value::Opaque(inner) => inner.type_name().to_string(),
        }
    }

    /// Project onto JSON without consulting any mapping.
    ///
    /// Records become objects keyed by field name, `Unset` becomes null and
    /// opaque values become their `Debug` rendering.
    pub fn to_plain_json(&self) -> Json {
        match self {
            Value::Unset | Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::String(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_plain_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_plain_json()))
                    .collect(),
            ),
            Value::Record(record) => Json::Object(
                record
                    .fields()
                    .map(|(name, value)| (name.to_string(), value.to_plain_json()))
                    .collect(),
            ),
            Value::Opaque(inner) => Json::String(format!("{:?}", inner)),
        }
    }
}

/// Runtime shape of a JSON value, as used in error reports.
pub fn json_type_description(json: &Json) -> String {
    match json {
        Json::Null => "null".to_string(),
        Json::Bool(_) => "boolean".to_string(),
        Json::Number(_) => "number".to_string(),
        Json::String(_) => "string".to_string(),
        Json::Array(items) => {
            let inner: Vec<String> = items.iter().map(json_type_description).collect();
            format!("[{}]", inner.join(","))
        }
        Json::Object(_) => "object".to_string(),
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&Json> for Value {
    fn from(json: &Json) -> Self {
        Value::from(json.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
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

macro_rules! value_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

value_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite numbers have no JSON form and become null.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// An instance of a registered record type.
///
/// Fields iterate in declaration order: inherited fields first, then the
/// type's own. Instances are normally created with
/// [`MappingRegistry::instantiate`](crate::MappingRegistry::instantiate), which
/// fills in the declared defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Record {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    pub(crate) fn with_fields(type_name: &str, fields: IndexMap<String, Value>) -> Self {
        Record {
            type_name: type_name.to_string(),
            fields,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Set a field, keeping its position if it already exists.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Mark a field as holding no value.
    pub fn unset(&mut self, field: &str) {
        if let Some(value) = self.fields.get_mut(field) {
            *value = Value::Unset;
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
