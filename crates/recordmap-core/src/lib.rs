//! Declarative conversion between JSON value trees and registered record types.
//!
//! Record types and their per-field JSON contracts are declared once, up front,
//! through [`registry::RegistryBuilder`]. A [`Converter`] then walks values
//! against those contracts in either direction.

pub mod converter;
pub mod engine;
pub mod error;
pub mod naming;
pub mod options;
pub mod registry;
pub mod shape;
pub mod value;

pub use converter::Converter;
pub use engine::Direction;
pub use error::{Error, FieldContext, JsonPath, PathSegment, Result, ShapeError};
pub use options::{ConvertOptions, OperationMode, PropertyMatchingRule, ValueCheckingMode};
pub use registry::{FieldMapping, MappingRegistry, PropertyDecl, RecordType, RegistryBuilder, RegistryError};
pub use shape::{CustomConverter, DefaultShapeInference, PrimitiveKind, Shape, ShapeInference};
pub use value::{OpaqueValue, Record, Value};

/// The JSON side of every conversion.
pub type Json = serde_json::Value;
