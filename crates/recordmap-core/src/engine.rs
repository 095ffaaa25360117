//! Verification/transform engine
//!
//! Walks a value against a [`Shape`] in either direction. Shape-level
//! failures are reported as [`ShapeError`] relative to the value being
//! converted; record-level conversion attributes them to the owning field.

use serde_json::Map;
use std::fmt;
use tracing::debug;

use crate::Json;
use crate::error::{Error, FieldContext, JsonPath, PathSegment, Result, ShapeError};
use crate::naming::{self, KeyIndex, Lookup};
use crate::options::{ConvertOptions, ValueCheckingMode};
use crate::registry::{FieldMapping, MappingRegistry, RecordType};
use crate::shape::{CustomConverter, Shape};
use crate::value::{Record, Value, json_type_description};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToJson,
    FromJson,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToJson => write!(f, "to JSON"),
            Direction::FromJson => write!(f, "from JSON"),
        }
    }
}

/// Shape for element `index`; the last shape covers any overflow.
///
/// `shapes` must not be empty.
fn element_shape(shapes: &[Shape], index: usize) -> &Shape {
    &shapes[index.min(shapes.len() - 1)]
}

fn type_mismatch(shape: &Shape, actual: String) -> ShapeError {
    ShapeError::TypeMismatch {
        path: JsonPath::new(),
        expected: shape.describe(),
        actual,
        reason: None,
    }
}

fn shape_mismatch(shape: &Shape, actual: String) -> ShapeError {
    ShapeError::ShapeMismatch {
        path: JsonPath::new(),
        expected: shape.describe(),
        actual,
    }
}

fn converter_failure(converter: &dyn CustomConverter, actual: String, err: anyhow::Error) -> ShapeError {
    ShapeError::TypeMismatch {
        path: JsonPath::new(),
        expected: format!("custom converter {}", converter.name()),
        actual,
        reason: Some(format!("{:#}", err)),
    }
}

fn field_context(record_type: &RecordType, field: &str, key: &str) -> FieldContext {
    let mut context = FieldContext::new(record_type.identifier(), field, key);
    context.path.prepend(PathSegment::Key(key.to_string()));
    context
}

pub(crate) struct Engine<'r> {
    registry: &'r MappingRegistry,
    options: ConvertOptions,
}

impl<'r> Engine<'r> {
    pub fn new(registry: &'r MappingRegistry, options: ConvertOptions) -> Self {
        Engine { registry, options }
    }

    fn record_type(&self, type_name: &str) -> std::result::Result<&'r RecordType, ShapeError> {
        self.registry
            .record_type(type_name)
            .ok_or_else(|| ShapeError::UnknownShape {
                path: JsonPath::new(),
                shape: type_name.to_string(),
            })
    }

    /// Null where a record is expected, reached through a list or a custom
    /// structure rather than a field.
    fn nested_null<T>(&self, type_name: &str, null: T) -> std::result::Result<T, ShapeError> {
        if self.options.value_checking_mode == ValueCheckingMode::DisallowNull {
            return Err(ShapeError::NullNotAllowed {
                path: JsonPath::new(),
                expected: type_name.to_string(),
            });
        }
        Ok(null)
    }

    /// Whether a null may stand in for the field described by `mapping`.
    pub fn null_allowed(&self, mapping: &FieldMapping) -> bool {
        match self.options.value_checking_mode {
            ValueCheckingMode::AllowNull => true,
            _ if mapping.is_nullable() || mapping.shape().is_any() => true,
            ValueCheckingMode::AllowObjectNull => matches!(mapping.shape(), Shape::Record(_)),
            ValueCheckingMode::DisallowNull => false,
        }
    }

    pub fn to_json(&self, shape: &Shape, value: &Value) -> std::result::Result<Json, ShapeError> {
        match shape {
            Shape::Any => Ok(value.to_plain_json()),
            Shape::Custom(converter) => converter
                .serialize(value)
                .map_err(|err| converter_failure(converter.as_ref(), value.type_description(), err)),
            Shape::List(shapes) => self.list_to_json(shape, shapes, value),
            _ if matches!(value, Value::List(_)) => Err(shape_mismatch(shape, value.type_description())),
            Shape::Record(type_name) => {
                self.record_type(type_name)?;
                match value {
                    Value::Record(record)
                        if self
                            .registry
                            .lineage(record.type_name())
                            .any(|ancestor| ancestor.type_name() == type_name) =>
                    {
                        self.serialize_record(record)
                            .map_err(|err| ShapeError::Record(Box::new(err)))
                    }
                    Value::Null => self.nested_null(type_name, Json::Null),
                    other => Err(type_mismatch(shape, other.type_description())),
                }
            }
            Shape::Primitive(kind) => {
                if self.options.ignore_primitive_checks || kind.matches_value(value) {
                    Ok(value.to_plain_json())
                } else {
                    Err(type_mismatch(shape, value.type_description()))
                }
            }
        }
    }

    fn list_to_json(&self, shape: &Shape, shapes: &[Shape], value: &Value) -> std::result::Result<Json, ShapeError> {
        if shapes.is_empty() {
            return match value {
                Value::List(_) | Value::Map(_) | Value::Record(_) => Ok(value.to_plain_json()),
                other => Err(shape_mismatch(shape, other.type_description())),
            };
        }

        let keyed = |index: usize, key: &str, item: &Value| {
            self.to_json(element_shape(shapes, index), item)
                .map(|json| (key.to_string(), json))
                .map_err(|err| err.at(PathSegment::Key(key.to_string())))
        };

        match value {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    self.to_json(element_shape(shapes, index), item)
                        .map_err(|err| err.at(PathSegment::Index(index)))
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Json::Array),
            Value::Map(map) => map
                .iter()
                .enumerate()
                .map(|(index, (key, item))| keyed(index, key.as_str(), item))
                .collect::<std::result::Result<Map<_, _>, _>>()
                .map(Json::Object),
            Value::Record(record) => record
                .fields()
                .enumerate()
                .map(|(index, (key, item))| keyed(index, key, item))
                .collect::<std::result::Result<Map<_, _>, _>>()
                .map(Json::Object),
            other => Err(shape_mismatch(shape, other.type_description())),
        }
    }

    pub fn from_json(&self, shape: &Shape, json: &Json) -> std::result::Result<Value, ShapeError> {
        match shape {
            Shape::Any => Ok(Value::from(json)),
            Shape::Custom(converter) => converter
                .deserialize(json)
                .map_err(|err| converter_failure(converter.as_ref(), json_type_description(json), err)),
            Shape::List(shapes) => self.list_from_json(shape, shapes, json),
            _ if json.is_array() => Err(shape_mismatch(shape, json_type_description(json))),
            Shape::Record(type_name) => {
                let record_type = self.record_type(type_name)?;
                match json {
                    Json::Object(object) => self
                        .deserialize_record(object, record_type)
                        .map(Value::Record)
                        .map_err(|err| ShapeError::Record(Box::new(err))),
                    Json::Null => self.nested_null(type_name, Value::Null),
                    other => Err(type_mismatch(shape, json_type_description(other))),
                }
            }
            Shape::Primitive(kind) => {
                if self.options.ignore_primitive_checks || kind.matches_json(json) {
                    Ok(Value::from(json))
                } else {
                    Err(type_mismatch(shape, json_type_description(json)))
                }
            }
        }
    }

    fn list_from_json(&self, shape: &Shape, shapes: &[Shape], json: &Json) -> std::result::Result<Value, ShapeError> {
        if shapes.is_empty() {
            return match json {
                Json::Array(_) | Json::Object(_) => Ok(Value::from(json)),
                other => Err(shape_mismatch(shape, json_type_description(other))),
            };
        }

        match json {
            Json::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    self.from_json(element_shape(shapes, index), item)
                        .map_err(|err| err.at(PathSegment::Index(index)))
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::List),
            Json::Object(object) => object
                .iter()
                .enumerate()
                .map(|(index, (key, item))| {
                    self.from_json(element_shape(shapes, index), item)
                        .map(|value| (key.clone(), value))
                        .map_err(|err| err.at(PathSegment::Key(key.clone())))
                })
                .collect::<std::result::Result<_, _>>()
                .map(Value::Map),
            other => Err(shape_mismatch(shape, json_type_description(other))),
        }
    }

    /// Serialize a record by its own registered type.
    ///
    /// In logging mode every record, nested ones included, is traced on the
    /// way in and out.
    pub fn serialize_record(&self, record: &Record) -> Result<Json> {
        let record_type = self
            .registry
            .record_type(record.type_name())
            .ok_or_else(|| Error::UnknownShape {
                context: FieldContext::record(record.type_name()),
                shape: record.type_name().to_string(),
            })?;
        if self.options.is_logging() {
            debug!(
                direction = %Direction::ToJson,
                record = record.type_name(),
                value = ?record,
                "Receiving record"
            );
        }

        let mut object = Map::new();
        for (field, value) in record.fields() {
            let Some(mapping) = self.registry.resolve(record_type, field) else {
                continue;
            };
            let key = naming::json_key(mapping, record_type.auto_snake_case());

            if value.is_unset() {
                if mapping.is_optional() {
                    continue;
                }
                return Err(Error::MissingProperty {
                    context: field_context(record_type, field, &key),
                    expected: mapping.shape().describe(),
                });
            }

            let json = if value.is_null() {
                if !self.null_allowed(mapping) {
                    return Err(Error::NullNotAllowed {
                        context: field_context(record_type, field, &key),
                        expected: mapping.shape().describe(),
                    });
                }
                Json::Null
            } else {
                self.to_json(mapping.shape(), value)
                    .map_err(|err| err.into_error(field_context(record_type, field, &key)))?
            };
            object.insert(key.into_owned(), json);
        }
        let json = Json::Object(object);
        if self.options.is_logging() {
            debug!(
                direction = %Direction::ToJson,
                record = record.type_name(),
                value = %json,
                "Returning JSON object"
            );
        }
        Ok(json)
    }

    /// Build a fresh instance of `record_type` from `object`.
    ///
    /// Fields missing from `object` but declared optional keep their defaults.
    pub fn deserialize_record(&self, object: &Map<String, Json>, record_type: &RecordType) -> Result<Record> {
        if self.options.is_logging() {
            debug!(
                direction = %Direction::FromJson,
                record = record_type.type_name(),
                value = ?object,
                "Receiving JSON object"
            );
        }
        let mut record = record_type.instantiate();
        let index = KeyIndex::new(object, self.options.property_matching_rule);

        for field in record_type.field_names() {
            let Some(mapping) = self.registry.resolve(record_type, field) else {
                continue;
            };

            let mut found = None;
            for key in naming::candidate_keys(mapping, record_type.auto_snake_case()) {
                match index.lookup(&key) {
                    Lookup::Found(json) => {
                        found = Some((key, json));
                        break;
                    }
                    Lookup::Missing => {}
                    Lookup::Ambiguous(candidates) => {
                        return Err(Error::AmbiguousFieldName {
                            context: field_context(record_type, field, &key),
                            expected: mapping.shape().describe(),
                            candidates,
                        });
                    }
                }
            }

            let Some((key, json)) = found else {
                if mapping.is_optional() {
                    continue;
                }
                let key = naming::json_key(mapping, record_type.auto_snake_case());
                return Err(Error::MissingProperty {
                    context: field_context(record_type, field, &key),
                    expected: mapping.shape().describe(),
                });
            };

            let value = if json.is_null() {
                if !self.null_allowed(mapping) {
                    return Err(Error::NullNotAllowed {
                        context: field_context(record_type, field, &key),
                        expected: mapping.shape().describe(),
                    });
                }
                Value::Null
            } else {
                self.from_json(mapping.shape(), json)
                    .map_err(|err| err.into_error(field_context(record_type, field, &key)))?
            };
            record.set(field, value);
        }
        if self.options.is_logging() {
            debug!(
                direction = %Direction::FromJson,
                record = record_type.type_name(),
                value = ?record,
                "Returning record"
            );
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PropertyDecl;
    use serde_json::json;

    fn registry() -> MappingRegistry {
        let mut builder = MappingRegistry::builder();
        builder
            .record("Human")
            .property("firstname", "", PropertyDecl::named("givenName").shape(Shape::string()))
            .property("lastname", "", PropertyDecl::named("lastName").shape(Shape::string()))
            .finish()
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_element_shape_autofill() {
        let shapes = [Shape::string(), Shape::number()];
        assert_eq!(element_shape(&shapes, 0), &Shape::string());
        assert_eq!(element_shape(&shapes, 1), &Shape::number());
        assert_eq!(element_shape(&shapes, 5), &Shape::number());
    }

    #[test]
    fn test_unregistered_record_shape() {
        let registry = registry();
        let engine = Engine::new(&registry, ConvertOptions::default());
        let err = engine.from_json(&Shape::record("Ghost"), &json!({})).unwrap_err();
        assert!(matches!(err, ShapeError::UnknownShape { ref shape, .. } if shape == "Ghost"));
    }

    #[test]
    fn test_record_of_unrelated_type_is_rejected() {
        let mut builder = MappingRegistry::builder();
        builder.record("Human").finish().unwrap();
        builder.record("Cat").finish().unwrap();
        let registry = builder.build().unwrap();
        let engine = Engine::new(&registry, ConvertOptions::default());

        let err = engine
            .to_json(&Shape::record("Human"), &Value::from(Record::new("Cat")))
            .unwrap_err();
        assert!(matches!(err, ShapeError::TypeMismatch { ref actual, .. } if actual == "Cat"));
    }

    #[test]
    fn test_nested_null_follows_checking_mode() {
        let registry = registry();
        let shape = Shape::list([Shape::record("Human")]);

        let lenient = Engine::new(&registry, ConvertOptions::default());
        assert_eq!(lenient.from_json(&shape, &json!([null])).unwrap(), Value::List(vec![Value::Null]));

        let strict = Engine::new(
            &registry,
            ConvertOptions::default().with_value_checking_mode(ValueCheckingMode::DisallowNull),
        );
        let err = strict.to_json(&shape, &Value::List(vec![Value::Null])).unwrap_err();
        assert!(matches!(err, ShapeError::NullNotAllowed { ref path, .. } if path.to_string() == "$[0]"));
    }

    #[test]
    fn test_primitive_checks_can_be_skipped() {
        let registry = registry();
        let engine = Engine::new(
            &registry,
            ConvertOptions::default().with_ignore_primitive_checks(true),
        );
        assert_eq!(engine.from_json(&Shape::string(), &json!(3)).unwrap(), Value::from(3));
    }
}
