//! Registration surface
//!
//! Property declarations are filed under [`PLACEHOLDER_IDENTIFIER`] as they
//! arrive, because the record's final identifier is only known once the
//! record declaration is finished. [`RecordBuilder::finish`] re-keys them.

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

use super::{FieldMapping, MappingKey, MappingRegistry, RecordType, RegistryError};
use crate::shape::{DefaultShapeInference, Shape, ShapeInference};
use crate::value::Value;

/// Identifier that pending property declarations are filed under.
pub const PLACEHOLDER_IDENTIFIER: &str = "__recordmap_pending__";

/// Declaration of a JSON-bound field.
///
/// `PropertyDecl::new()` binds the field under its own name with shape
/// [`Shape::Any`]; the builder methods narrow that down.
#[derive(Debug, Clone, Default)]
pub struct PropertyDecl {
    json_name: Option<String>,
    shape: Option<Shape>,
    optional: bool,
    nullable: bool,
}

impl PropertyDecl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(json_name: impl Into<String>) -> Self {
        Self::new().json_name(json_name)
    }

    pub fn json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = Some(json_name.into());
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// The property may be missing from the source side.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// The property may be null regardless of the value checking mode.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Collects record declarations and produces a [`MappingRegistry`].
pub struct RegistryBuilder {
    records: IndexMap<String, RecordType>,
    mappings: IndexMap<MappingKey, FieldMapping>,
    inference: Arc<dyn ShapeInference>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        RegistryBuilder {
            records: IndexMap::new(),
            mappings: IndexMap::new(),
            inference: Arc::new(DefaultShapeInference),
        }
    }

    /// Replace the table used for records declared with `infer_shapes(true)`.
    pub fn with_inference(mut self, inference: impl ShapeInference + 'static) -> Self {
        self.inference = Arc::new(inference);
        self
    }

    /// Start declaring the record type `type_name`.
    pub fn record(&mut self, type_name: &str) -> RecordBuilder<'_> {
        RecordBuilder {
            registry: self,
            type_name: type_name.to_string(),
            identifier: None,
            base: None,
            auto_snake_case: false,
            infer_shapes: false,
            defaults: IndexMap::new(),
            error: None,
        }
    }

    fn pending_fields(&self) -> Vec<String> {
        self.mappings
            .keys()
            .filter(|key| key.record == PLACEHOLDER_IDENTIFIER)
            .map(|key| key.field.clone())
            .collect()
    }

    /// Freeze the declarations.
    ///
    /// Fails if any property declaration was never attached to a finished
    /// record.
    pub fn build(self) -> Result<MappingRegistry, RegistryError> {
        let pending = self.pending_fields();
        if !pending.is_empty() {
            return Err(RegistryError::Unfinalized { fields: pending });
        }
        Ok(MappingRegistry {
            records: self.records,
            mappings: self.mappings,
        })
    }
}

/// Declares one record type; see [`RegistryBuilder::record`].
pub struct RecordBuilder<'a> {
    registry: &'a mut RegistryBuilder,
    type_name: String,
    identifier: Option<String>,
    base: Option<String>,
    auto_snake_case: bool,
    infer_shapes: bool,
    defaults: IndexMap<String, Value>,
    error: Option<RegistryError>,
}

impl<'a> RecordBuilder<'a> {
    /// File mappings under `identifier` instead of the type name.
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Derive JSON names in snake_case for properties declared without one.
    pub fn auto_snake_case(mut self, enabled: bool) -> Self {
        self.auto_snake_case = enabled;
        self
    }

    /// Inherit fields and mappings from an already registered type.
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Infer shapes from defaults for properties declared without one.
    pub fn infer_shapes(mut self, enabled: bool) -> Self {
        self.infer_shapes = enabled;
        self
    }

    /// Declare a field that is not JSON-bound.
    pub fn field(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.defaults.insert(name.to_string(), default.into());
        self
    }

    /// Declare a JSON-bound field.
    ///
    /// Declaring the same field again only adds `decl`'s JSON name in front
    /// of the earlier ones; shape and flags stay those of the first
    /// declaration.
    pub fn property(mut self, name: &str, default: impl Into<Value>, decl: PropertyDecl) -> Self {
        self.defaults.insert(name.to_string(), default.into());
        self.declare(name, decl);
        self
    }

    /// Add another declaration for a field declared earlier on this record.
    pub fn alias(mut self, name: &str, decl: PropertyDecl) -> Self {
        if self
            .registry
            .mappings
            .contains_key(&MappingKey::new(PLACEHOLDER_IDENTIFIER, name))
        {
            self.declare(name, decl);
        } else {
            self.fail(RegistryError::UnknownField {
                record: self.type_name.clone(),
                field: name.to_string(),
            });
        }
        self
    }

    fn fail(&mut self, error: RegistryError) {
        self.error.get_or_insert(error);
    }

    fn declare(&mut self, field: &str, decl: PropertyDecl) {
        let name_given = decl.json_name.is_some();
        let json_name = decl.json_name.unwrap_or_else(|| field.to_string());
        if json_name.is_empty() {
            self.fail(RegistryError::EmptyJsonName {
                record: self.type_name.clone(),
                field: field.to_string(),
            });
            return;
        }

        let key = MappingKey::new(PLACEHOLDER_IDENTIFIER, field);
        if let Some(existing) = self.registry.mappings.get_mut(&key) {
            existing.json_names.insert(0, json_name);
            return;
        }

        let shape_given = decl.shape.is_some();
        self.registry.mappings.insert(
            key,
            FieldMapping {
                record: PLACEHOLDER_IDENTIFIER.to_string(),
                field: field.to_string(),
                json_names: vec![json_name],
                shape: decl.shape.unwrap_or_default(),
                optional: decl.optional,
                nullable: decl.nullable,
                name_given,
                shape_given,
            },
        );
    }

    /// Finalize the identifier and move pending declarations under it.
    ///
    /// On failure every pending declaration is discarded.
    pub fn finish(self) -> Result<(), RegistryError> {
        let RecordBuilder {
            registry,
            type_name,
            identifier,
            base,
            auto_snake_case,
            infer_shapes,
            defaults,
            error,
        } = self;

        let result = match error {
            Some(error) => Err(error),
            None => registry.register(
                RecordType {
                    identifier: identifier.unwrap_or_else(|| type_name.clone()),
                    type_name,
                    base,
                    auto_snake_case,
                    defaults,
                },
                infer_shapes,
            ),
        };
        if result.is_err() {
            registry.discard_pending();
        }
        result
    }
}

impl RegistryBuilder {
    fn discard_pending(&mut self) {
        self.mappings
            .retain(|key, _| key.record != PLACEHOLDER_IDENTIFIER);
    }

    /// `record.defaults` holds only the type's own fields on entry.
    fn register(&mut self, mut record: RecordType, infer_shapes: bool) -> Result<(), RegistryError> {
        if self.records.contains_key(&record.type_name) {
            return Err(RegistryError::DuplicateRecord(record.type_name));
        }
        if self
            .records
            .values()
            .any(|existing| existing.identifier == record.identifier)
        {
            return Err(RegistryError::DuplicateIdentifier(record.identifier));
        }

        if let Some(base) = &record.base {
            let Some(base_type) = self.records.get(base) else {
                return Err(RegistryError::UnknownBase {
                    record: record.type_name,
                    base: base.clone(),
                });
            };
            let mut defaults = base_type.defaults.clone();
            defaults.extend(std::mem::take(&mut record.defaults));
            record.defaults = defaults;
        }

        let pending: Vec<MappingKey> = self
            .mappings
            .keys()
            .filter(|key| key.record == PLACEHOLDER_IDENTIFIER)
            .cloned()
            .collect();
        let orphans: Vec<String> = pending
            .iter()
            .filter(|key| !record.defaults.contains_key(&key.field))
            .map(|key| key.field.clone())
            .collect();
        if !orphans.is_empty() {
            return Err(RegistryError::Unfinalized { fields: orphans });
        }

        for key in pending {
            let Some(mut mapping) = self.mappings.shift_remove(&key) else {
                continue;
            };
            mapping.record = record.identifier.clone();
            if infer_shapes && !mapping.shape_given {
                if let Some(default) = record.defaults.get(&mapping.field) {
                    mapping.shape = self.inference.infer(default);
                }
            }
            self.mappings
                .insert(MappingKey::new(&record.identifier, &key.field), mapping);
        }

        debug!(
            "Registered record type '{}' as '{}' with {} fields",
            record.type_name,
            record.identifier,
            record.defaults.len()
        );
        self.records.insert(record.type_name.clone(), record);
        Ok(())
    }
}
