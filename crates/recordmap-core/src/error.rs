//! Error types for record conversion
//!
//! Every failure that concerns a field carries a [`FieldContext`] naming the
//! record identifier, the field, the JSON property and the location of the
//! offending value inside the converted document.

use std::fmt;
use thiserror::Error;

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// One step into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, ".{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Location of a value inside a converted document, outermost segment first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPath(Vec<PathSegment>);

impl JsonPath {
    pub fn new() -> Self {
        JsonPath(Vec::new())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Put `segment` in front of the current path.
    pub fn prepend(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Identifies the field a failure belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldContext {
    /// Record-type identifier (not necessarily the type name)
    pub record: String,
    /// Field name on the record side; empty for whole-record failures
    pub field: String,
    /// Resolved JSON property name; empty for whole-record failures
    pub json_name: String,
    /// Where the failing value sits in the converted document
    pub path: JsonPath,
}

impl FieldContext {
    pub fn new(record: &str, field: &str, json_name: &str) -> Self {
        FieldContext {
            record: record.to_string(),
            field: field.to_string(),
            json_name: json_name.to_string(),
            path: JsonPath::new(),
        }
    }

    /// Context for a failure concerning a record as a whole.
    pub fn record(record: &str) -> Self {
        Self::new(record, "", "")
    }

    /// Context for a value converted outside of any record.
    pub fn root() -> Self {
        Self::default()
    }
}

impl fmt::Display for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.record.is_empty() {
            write!(f, "value")?;
        } else if self.field.is_empty() {
            write!(f, "record \"{}\"", self.record)?;
        } else {
            write!(
                f,
                "\"{}.{}\" (JSON property \"{}\")",
                self.record, self.field, self.json_name
            )?;
        }
        if !self.path.is_empty() {
            write!(f, " at {}", self.path)?;
        }
        Ok(())
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(": {}", reason),
        None => String::new(),
    }
}

/// Conversion failures
#[derive(Error, Debug)]
pub enum Error {
    #[error("{operation} expects an object or an array, got {actual}")]
    InvalidTopLevelShape {
        operation: &'static str,
        actual: String,
    },

    #[error("null is not allowed for {context}, expected {expected}")]
    NullNotAllowed {
        context: FieldContext,
        expected: String,
    },

    #[error("missing required property for {context}, expected {expected}")]
    MissingProperty {
        context: FieldContext,
        expected: String,
    },

    #[error("type mismatch for {context}: expected {expected}, got {actual}{}", reason_suffix(.reason))]
    TypeMismatch {
        context: FieldContext,
        expected: String,
        actual: String,
        reason: Option<String>,
    },

    #[error("shape mismatch for {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: FieldContext,
        expected: String,
        actual: String,
    },

    #[error("unknown shape \"{shape}\" for {context}; the record type was never registered")]
    UnknownShape { context: FieldContext, shape: String },

    #[error("ambiguous property name for {context}: {candidates:?} all match, expected {expected}")]
    AmbiguousFieldName {
        context: FieldContext,
        expected: String,
        candidates: Vec<String>,
    },
}

impl Error {
    /// The field this error is attributed to, if any.
    pub fn context(&self) -> Option<&FieldContext> {
        match self {
            Error::InvalidTopLevelShape { .. } => None,
            Error::NullNotAllowed { context, .. }
            | Error::MissingProperty { context, .. }
            | Error::TypeMismatch { context, .. }
            | Error::ShapeMismatch { context, .. }
            | Error::UnknownShape { context, .. }
            | Error::AmbiguousFieldName { context, .. } => Some(context),
        }
    }

    fn context_mut(&mut self) -> Option<&mut FieldContext> {
        match self {
            Error::InvalidTopLevelShape { .. } => None,
            Error::NullNotAllowed { context, .. }
            | Error::MissingProperty { context, .. }
            | Error::TypeMismatch { context, .. }
            | Error::ShapeMismatch { context, .. }
            | Error::UnknownShape { context, .. }
            | Error::AmbiguousFieldName { context, .. } => Some(context),
        }
    }

    /// Record that the failing value was reached through `segment`.
    pub fn within(mut self, segment: PathSegment) -> Self {
        if let Some(context) = self.context_mut() {
            context.path.prepend(segment);
        }
        self
    }
}

/// Failure of a single shape check, before it is attributed to a field.
///
/// The engine produces these while walking a value; the record layer turns
/// them into [`Error`] once the owning field is known.
#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("expected {expected}, got {actual}{}", reason_suffix(.reason))]
    TypeMismatch {
        path: JsonPath,
        expected: String,
        actual: String,
        reason: Option<String>,
    },

    #[error("expected {expected}, got {actual}")]
    ShapeMismatch {
        path: JsonPath,
        expected: String,
        actual: String,
    },

    #[error("unknown shape \"{shape}\"")]
    UnknownShape { path: JsonPath, shape: String },

    #[error("null is not allowed, expected {expected}")]
    NullNotAllowed { path: JsonPath, expected: String },

    /// A nested record failed; the inner error is already attributed.
    #[error(transparent)]
    Record(Box<Error>),
}

impl ShapeError {
    /// Record that the failing value was reached through `segment`.
    pub fn at(self, segment: PathSegment) -> Self {
        match self {
            ShapeError::Record(inner) => ShapeError::Record(Box::new(inner.within(segment))),
            mut other => {
                match &mut other {
                    ShapeError::TypeMismatch { path, .. }
                    | ShapeError::ShapeMismatch { path, .. }
                    | ShapeError::UnknownShape { path, .. }
                    | ShapeError::NullNotAllowed { path, .. } => path.prepend(segment),
                    ShapeError::Record(_) => {}
                }
                other
            }
        }
    }

    /// Attribute the failure to the field described by `context`.
    ///
    /// The path of `context` is the location of the field itself; the
    /// relative path gathered by the engine is appended to it.
    pub fn into_error(self, context: FieldContext) -> Error {
        let attach = |relative: JsonPath| {
            let mut context = context.clone();
            context.path.0.extend(relative.0);
            context
        };
        match self {
            ShapeError::TypeMismatch {
                path,
                expected,
                actual,
                reason,
            } => Error::TypeMismatch {
                context: attach(path),
                expected,
                actual,
                reason,
            },
            ShapeError::ShapeMismatch {
                path,
                expected,
                actual,
            } => Error::ShapeMismatch {
                context: attach(path),
                expected,
                actual,
            },
            ShapeError::UnknownShape { path, shape } => Error::UnknownShape {
                context: attach(path),
                shape,
            },
            ShapeError::NullNotAllowed { path, expected } => Error::NullNotAllowed {
                context: attach(path),
                expected,
            },
            ShapeError::Record(inner) => {
                let mut inner = *inner;
                for segment in context.path.0.iter().rev() {
                    inner = inner.within(segment.clone());
                }
                inner
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        let mut path = JsonPath::new();
        path.prepend(PathSegment::Index(2));
        path.prepend(PathSegment::Key("friends".into()));
        assert_eq!(path.to_string(), "$.friends[2]");
        assert_eq!(JsonPath::new().to_string(), "$");
    }

    #[test]
    fn test_shape_error_attribution() {
        let err = ShapeError::TypeMismatch {
            path: JsonPath::new(),
            expected: "number".into(),
            actual: "string".into(),
            reason: None,
        }
        .at(PathSegment::Index(1));

        let mut context = FieldContext::new("Kitty", "scores", "scores");
        context.path.prepend(PathSegment::Key("scores".into()));
        let err = err.into_error(context).within(PathSegment::Index(0));

        let context = err.context().unwrap();
        assert_eq!(context.record, "Kitty");
        assert_eq!(context.path.to_string(), "$[0].scores[1]");
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_nested_record_error_keeps_inner_context() {
        let inner = Error::MissingProperty {
            context: FieldContext::new("Human", "lastname", "lastName"),
            expected: "string".into(),
        };
        let mut outer = FieldContext::new("Kitty", "owner", "owner");
        outer.path.prepend(PathSegment::Key("owner".into()));

        let err = ShapeError::Record(Box::new(inner)).into_error(outer);
        let context = err.context().unwrap();
        assert_eq!(context.record, "Human");
        assert_eq!(context.json_name, "lastName");
        assert_eq!(context.path.to_string(), "$.owner");
    }
}
