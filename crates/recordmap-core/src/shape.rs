//! Shape descriptors: the expected-type contract of a field.

use std::fmt;
use std::sync::Arc;

use crate::Json;
use crate::value::Value;

/// Primitive JSON kinds a field may be pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
        }
    }

    pub fn matches_json(&self, json: &Json) -> bool {
        matches!(
            (self, json),
            (PrimitiveKind::String, Json::String(_))
                | (PrimitiveKind::Number, Json::Number(_))
                | (PrimitiveKind::Boolean, Json::Bool(_))
        )
    }

    pub fn matches_value(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (PrimitiveKind::String, Value::String(_))
                | (PrimitiveKind::Number, Value::Number(_))
                | (PrimitiveKind::Boolean, Value::Bool(_))
        )
    }
}

/// Caller-supplied bidirectional transform for one field.
///
/// The engine calls exactly one of the two methods per field and direction.
/// Errors are reported as type mismatches carrying the converter's message.
pub trait CustomConverter: Send + Sync {
    /// Name used when describing the expected shape.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn serialize(&self, value: &Value) -> anyhow::Result<Json>;

    fn deserialize(&self, json: &Json) -> anyhow::Result<Value>;
}

/// Expected shape of a field value.
#[derive(Clone, Default)]
pub enum Shape {
    /// Accepts and produces any value unchanged
    #[default]
    Any,
    Primitive(PrimitiveKind),
    /// Reference to a registered record type, by type name
    Record(String),
    Custom(Arc<dyn CustomConverter>),
    /// Array or tuple expectation; the last element covers any overflow and
    /// an empty list means an untyped array
    List(Vec<Shape>),
}

impl Shape {
    pub fn string() -> Self {
        Shape::Primitive(PrimitiveKind::String)
    }

    pub fn number() -> Self {
        Shape::Primitive(PrimitiveKind::Number)
    }

    pub fn boolean() -> Self {
        Shape::Primitive(PrimitiveKind::Boolean)
    }

    pub fn record(type_name: impl Into<String>) -> Self {
        Shape::Record(type_name.into())
    }

    pub fn list(shapes: impl IntoIterator<Item = Shape>) -> Self {
        Shape::List(shapes.into_iter().collect())
    }

    pub fn custom<C: CustomConverter + 'static>(converter: C) -> Self {
        Shape::Custom(Arc::new(converter))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Shape::Any)
    }

    /// Human-readable form used in error reports, e.g. `[string,[boolean,number]]`.
    pub fn describe(&self) -> String {
        match self {
            Shape::Any => "any".to_string(),
            Shape::Primitive(kind) => kind.name().to_string(),
            Shape::Record(type_name) => type_name.clone(),
            Shape::Custom(converter) => format!("custom converter {}", converter.name()),
            Shape::List(shapes) => {
                let inner: Vec<String> = shapes.iter().map(Shape::describe).collect();
                format!("[{}]", inner.join(","))
            }
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any => write!(f, "Any"),
            Shape::Primitive(kind) => f.debug_tuple("Primitive").field(kind).finish(),
            Shape::Record(type_name) => f.debug_tuple("Record").field(type_name).finish(),
            Shape::Custom(converter) => f.debug_tuple("Custom").field(&converter.name()).finish(),
            Shape::List(shapes) => f.debug_tuple("List").field(shapes).finish(),
        }
    }
}

impl PartialEq for Shape {
    /// Custom converters compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Shape::Any, Shape::Any) => true,
            (Shape::Primitive(a), Shape::Primitive(b)) => a == b,
            (Shape::Record(a), Shape::Record(b)) => a == b,
            (Shape::Custom(a), Shape::Custom(b)) => Arc::ptr_eq(a, b),
            (Shape::List(a), Shape::List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Supplies a shape for fields declared without one.
///
/// Only consulted for record types registered with shape inference turned on.
pub trait ShapeInference: Send + Sync {
    fn infer(&self, default: &Value) -> Shape;
}

/// Infers primitives and record references from a field's default value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultShapeInference;

impl ShapeInference for DefaultShapeInference {
    fn infer(&self, default: &Value) -> Shape {
        match default {
            Value::String(_) => Shape::string(),
            Value::Number(_) => Shape::number(),
            Value::Bool(_) => Shape::boolean(),
            Value::Record(record) => Shape::record(record.type_name()),
            _ => Shape::Any,
        }
    }
}
