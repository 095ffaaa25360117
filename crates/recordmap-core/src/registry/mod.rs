//! Mapping registry
//!
//! Holds the declared record types and, per `(record identifier, field)`,
//! the [`FieldMapping`] that binds a field to its JSON names and shape
//! contract. A registry is produced once by [`RegistryBuilder`] and is
//! read-only afterwards.

mod builder;
mod global;

pub use builder::{PLACEHOLDER_IDENTIFIER, PropertyDecl, RecordBuilder, RegistryBuilder};
pub use global::{global, install};

use indexmap::{Equivalent, IndexMap};
use std::fmt;
use thiserror::Error;

use crate::shape::Shape;
use crate::value::{Record, Value};

/// Registration failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("property declarations were never attached to a record type: {fields:?}")]
    Unfinalized { fields: Vec<String> },

    #[error("record type \"{0}\" is already registered")]
    DuplicateRecord(String),

    #[error("record identifier \"{0}\" is already in use")]
    DuplicateIdentifier(String),

    #[error("record type \"{record}\" extends \"{base}\", which is not registered")]
    UnknownBase { record: String, base: String },

    #[error("\"{record}.{field}\" has no earlier declaration to add an alternate name to")]
    UnknownField { record: String, field: String },

    #[error("\"{record}.{field}\" declares an empty JSON property name")]
    EmptyJsonName { record: String, field: String },

    #[error("a process-wide registry is already installed")]
    AlreadyInstalled,
}

/// Registry key: record identifier plus field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingKey {
    pub record: String,
    pub field: String,
}

impl MappingKey {
    pub fn new(record: &str, field: &str) -> Self {
        MappingKey {
            record: record.to_string(),
            field: field.to_string(),
        }
    }
}

impl fmt::Display for MappingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.record, self.field)
    }
}

/// Borrowed form of [`MappingKey`] for allocation-free lookups.
#[derive(Hash)]
struct KeyRef<'a> {
    record: &'a str,
    field: &'a str,
}

impl Equivalent<MappingKey> for KeyRef<'_> {
    fn equivalent(&self, key: &MappingKey) -> bool {
        self.record == key.record && self.field == key.field
    }
}

/// Binding of one record field to its JSON contract.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub(crate) record: String,
    pub(crate) field: String,
    /// Most recently declared first; the first one is emitted
    pub(crate) json_names: Vec<String>,
    pub(crate) shape: Shape,
    pub(crate) optional: bool,
    pub(crate) nullable: bool,
    pub(crate) name_given: bool,
    pub(crate) shape_given: bool,
}

impl FieldMapping {
    /// Identifier of the record type that declared this mapping.
    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn json_names(&self) -> &[String] {
        &self.json_names
    }

    /// The authoritative JSON name, used when emitting.
    pub fn primary_json_name(&self) -> &str {
        self.json_names.first().map_or(&self.field, String::as_str)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether a JSON name was declared rather than defaulted to the field name.
    pub fn is_name_given(&self) -> bool {
        self.name_given
    }

    pub fn is_shape_given(&self) -> bool {
        self.shape_given
    }
}

/// A declared record type.
#[derive(Debug, Clone)]
pub struct RecordType {
    type_name: String,
    identifier: String,
    base: Option<String>,
    auto_snake_case: bool,
    /// Every field of the type, inherited ones first, with its default value
    defaults: IndexMap<String, Value>,
}

impl RecordType {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Identifier that mapping keys are filed under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn auto_snake_case(&self) -> bool {
        self.auto_snake_case
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.defaults.keys().map(String::as_str)
    }

    pub fn default_value(&self, field: &str) -> Option<&Value> {
        self.defaults.get(field)
    }

    /// A fresh instance holding the declared defaults.
    pub fn instantiate(&self) -> Record {
        Record::with_fields(&self.type_name, self.defaults.clone())
    }
}

#[derive(Debug, Default)]
pub struct MappingRegistry {
    records: IndexMap<String, RecordType>,
    mappings: IndexMap<MappingKey, FieldMapping>,
}

impl MappingRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn record_type(&self, type_name: &str) -> Option<&RecordType> {
        self.records.get(type_name)
    }

    pub fn contains_record(&self, type_name: &str) -> bool {
        self.records.contains_key(type_name)
    }

    pub fn records(&self) -> impl Iterator<Item = &RecordType> {
        self.records.values()
    }

    /// Entries in registration order.
    pub fn mappings(&self) -> impl Iterator<Item = (&MappingKey, &FieldMapping)> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Exact lookup under a record identifier.
    pub fn mapping(&self, identifier: &str, field: &str) -> Option<&FieldMapping> {
        self.mappings.get(&KeyRef {
            record: identifier,
            field,
        })
    }

    /// The type and its ancestors, nearest first.
    pub fn lineage<'a>(&'a self, type_name: &str) -> impl Iterator<Item = &'a RecordType> + use<'a> {
        std::iter::successors(self.records.get(type_name), move |record| {
            record.base().and_then(|base| self.records.get(base))
        })
    }

    /// The mapping that applies to `field` on instances of `record_type`.
    ///
    /// An entry under the type's own identifier wins; otherwise the first
    /// entry, in registration order, declared for `field` by any type in the
    /// lineage. `None` means the field is not JSON-bound.
    pub fn resolve(&self, record_type: &RecordType, field: &str) -> Option<&FieldMapping> {
        if let Some(mapping) = self.mapping(record_type.identifier(), field) {
            return Some(mapping);
        }
        let lineage: Vec<&str> = self
            .lineage(record_type.type_name())
            .map(RecordType::identifier)
            .collect();
        self.mappings
            .iter()
            .find(|(key, _)| key.field == field && lineage.contains(&key.record.as_str()))
            .map(|(_, mapping)| mapping)
    }

    /// A fresh instance of `type_name` holding its declared defaults.
    pub fn instantiate(&self, type_name: &str) -> Option<Record> {
        self.record_type(type_name).map(RecordType::instantiate)
    }
}
