//! Conversion options
//!
//! Options are plain values handed to each [`Converter`](crate::Converter);
//! nothing here is process-global.

use serde::{Deserialize, Serialize};

/// How a converter operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// No mapping and no checks; input is handed back as-is
    Disable,
    /// Mapping with checks
    #[default]
    Enable,
    /// Mapping with checks, plus debug events for every top-level call
    Logging,
}

/// Which values may be null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueCheckingMode {
    /// Every value may be null
    AllowNull,
    /// Record-typed values may be null, primitives may not
    #[default]
    AllowObjectNull,
    /// Only fields declared nullable (or untyped) may be null
    DisallowNull,
}

/// How JSON property names are matched during deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyMatchingRule {
    #[default]
    CaseStrict,
    CaseInsensitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub operation_mode: OperationMode,
    pub value_checking_mode: ValueCheckingMode,
    /// Let any primitive pass where another primitive is expected
    pub ignore_primitive_checks: bool,
    pub property_matching_rule: PropertyMatchingRule,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation_mode(mut self, mode: OperationMode) -> Self {
        self.operation_mode = mode;
        self
    }

    pub fn with_value_checking_mode(mut self, mode: ValueCheckingMode) -> Self {
        self.value_checking_mode = mode;
        self
    }

    pub fn with_ignore_primitive_checks(mut self, ignore: bool) -> Self {
        self.ignore_primitive_checks = ignore;
        self
    }

    pub fn with_property_matching_rule(mut self, rule: PropertyMatchingRule) -> Self {
        self.property_matching_rule = rule;
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.operation_mode == OperationMode::Disable
    }

    pub fn is_logging(&self) -> bool {
        self.operation_mode == OperationMode::Logging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert_eq!(options.operation_mode, OperationMode::Enable);
        assert_eq!(options.value_checking_mode, ValueCheckingMode::AllowObjectNull);
        assert!(!options.ignore_primitive_checks);
        assert_eq!(options.property_matching_rule, PropertyMatchingRule::CaseStrict);
    }

    #[test]
    fn test_partial_deserialization_keeps_defaults() -> anyhow::Result<()> {
        let options: ConvertOptions = serde_json::from_str(
            r#"{"operation_mode": "logging", "property_matching_rule": "case_insensitive"}"#,
        )?;
        assert!(options.is_logging());
        assert_eq!(options.property_matching_rule, PropertyMatchingRule::CaseInsensitive);
        assert_eq!(options.value_checking_mode, ValueCheckingMode::AllowObjectNull);
        Ok(())
    }
}
