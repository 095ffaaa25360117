//! Conversion entry points
//!
//! A [`Converter`] pairs a read-only [`MappingRegistry`] with a set of
//! [`ConvertOptions`]. It is cheap to create, holds no mutable state shared
//! with other converters, and may be used from several threads at once.

use tracing::debug;

use crate::Json;
use crate::engine::{Direction, Engine};
use crate::error::{Error, FieldContext, PathSegment, Result};
use crate::options::{ConvertOptions, ValueCheckingMode};
use crate::registry::{self, MappingRegistry};
use crate::shape::Shape;
use crate::value::{Record, Value, json_type_description};

#[derive(Debug, Clone, Copy)]
pub struct Converter<'r> {
    registry: &'r MappingRegistry,
    options: ConvertOptions,
}

impl Converter<'static> {
    /// Converter over the process-wide registry, if one is installed.
    pub fn global() -> Option<Self> {
        registry::global().map(Converter::new)
    }
}

impl<'r> Converter<'r> {
    pub fn new(registry: &'r MappingRegistry) -> Self {
        Converter {
            registry,
            options: ConvertOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Takes effect on the next call.
    pub fn set_options(&mut self, options: ConvertOptions) {
        self.options = options;
    }

    pub fn registry(&self) -> &'r MappingRegistry {
        self.registry
    }

    fn engine(&self) -> Engine<'r> {
        Engine::new(self.registry, self.options)
    }

    fn null_at_top_level<T>(&self, null: T) -> Result<T> {
        if self.options.value_checking_mode == ValueCheckingMode::DisallowNull {
            return Err(Error::NullNotAllowed {
                context: FieldContext::root(),
                expected: "an object or an array".to_string(),
            });
        }
        Ok(null)
    }

    /// Serialize a record, or a list of records.
    pub fn serialize(&self, value: &Value) -> Result<Json> {
        match value {
            Value::List(_) => self.serialize_array(value),
            _ => self.serialize_object(value),
        }
    }

    /// Serialize one record.
    ///
    /// A null input yields null unless nulls are disallowed.
    pub fn serialize_object(&self, value: &Value) -> Result<Json> {
        if self.options.is_disabled() {
            return Ok(value.to_plain_json());
        }
        match value {
            Value::Record(record) => self.serialize_record(record),
            Value::Null => self.null_at_top_level(Json::Null),
            other => Err(Error::InvalidTopLevelShape {
                operation: "serialize_object",
                actual: other.type_description(),
            }),
        }
    }

    pub fn serialize_record(&self, record: &Record) -> Result<Json> {
        if self.options.is_disabled() {
            return Ok(Value::Record(record.clone()).to_plain_json());
        }
        self.engine().serialize_record(record)
    }

    /// Serialize a list of records; fails on the first element that is not
    /// a record.
    ///
    /// A null input yields null unless nulls are disallowed.
    pub fn serialize_array(&self, value: &Value) -> Result<Json> {
        if self.options.is_disabled() {
            return Ok(value.to_plain_json());
        }
        let items = match value {
            Value::List(items) => items,
            Value::Null => return self.null_at_top_level(Json::Null),
            other => {
                return Err(Error::InvalidTopLevelShape {
                    operation: "serialize_array",
                    actual: other.type_description(),
                });
            }
        };
        if self.options.is_logging() {
            debug!(direction = %Direction::ToJson, len = items.len(), "Receiving array");
        }
        let array = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.serialize_object(item)
                    .map_err(|err| err.within(PathSegment::Index(index)))
            })
            .collect::<Result<Vec<_>>>()?;
        if self.options.is_logging() {
            debug!(direction = %Direction::ToJson, len = array.len(), "Returning JSON array");
        }
        Ok(Json::Array(array))
    }

    /// Deserialize an object into a `type_name` record, or an array into a
    /// list of them.
    pub fn deserialize(&self, json: &Json, type_name: &str) -> Result<Value> {
        match json {
            Json::Array(_) => self.deserialize_array(json, type_name),
            _ => self.deserialize_object(json, type_name),
        }
    }

    /// Deserialize one object into a fresh `type_name` record.
    ///
    /// A null input yields null unless nulls are disallowed.
    pub fn deserialize_object(&self, json: &Json, type_name: &str) -> Result<Value> {
        if self.options.is_disabled() {
            return Ok(Value::from(json));
        }
        let record_type = self
            .registry
            .record_type(type_name)
            .ok_or_else(|| Error::UnknownShape {
                context: FieldContext::record(type_name),
                shape: type_name.to_string(),
            })?;
        let object = match json {
            Json::Object(object) => object,
            Json::Null => return self.null_at_top_level(Value::Null),
            other => {
                return Err(Error::InvalidTopLevelShape {
                    operation: "deserialize_object",
                    actual: json_type_description(other),
                });
            }
        };
        self.engine()
            .deserialize_record(object, record_type)
            .map(Value::Record)
    }

    /// Deserialize an array of objects; fails on the first element that is
    /// not an object.
    ///
    /// A null input yields null unless nulls are disallowed.
    pub fn deserialize_array(&self, json: &Json, type_name: &str) -> Result<Value> {
        if self.options.is_disabled() {
            return Ok(Value::from(json));
        }
        let items = match json {
            Json::Array(items) => items,
            Json::Null => return self.null_at_top_level(Value::Null),
            other => {
                return Err(Error::InvalidTopLevelShape {
                    operation: "deserialize_array",
                    actual: json_type_description(other),
                });
            }
        };
        if self.options.is_logging() {
            debug!(
                direction = %Direction::FromJson,
                record = type_name,
                len = items.len(),
                "Receiving JSON array"
            );
        }
        let records = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.deserialize_object(item, type_name)
                    .map_err(|err| err.within(PathSegment::Index(index)))
            })
            .collect::<Result<Vec<_>>>()?;
        if self.options.is_logging() {
            debug!(
                direction = %Direction::FromJson,
                record = type_name,
                len = records.len(),
                "Returning records"
            );
        }
        Ok(Value::List(records))
    }

    /// Run a single value through `shape` towards JSON.
    pub fn convert_to_json(&self, shape: &Shape, value: &Value) -> Result<Json> {
        if self.options.is_disabled() {
            return Ok(value.to_plain_json());
        }
        self.engine()
            .to_json(shape, value)
            .map_err(|err| err.into_error(FieldContext::root()))
    }

    /// Run a single JSON value through `shape` towards the record side.
    pub fn convert_from_json(&self, shape: &Shape, json: &Json) -> Result<Value> {
        if self.options.is_disabled() {
            return Ok(Value::from(json));
        }
        self.engine()
            .from_json(shape, json)
            .map_err(|err| err.into_error(FieldContext::root()))
    }
}
