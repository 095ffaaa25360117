use anyhow::bail;
use recordmap_core::{ConvertOptions, OperationMode, PropertyMatchingRule, ValueCheckingMode};
use serde::{Deserialize, Serialize};

use super::model::RecordmapConfig;

/// An enum setting as written by older tooling: either its numeric code or
/// its upper-case name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacySetting {
    Code(u8),
    Name(String),
}

impl LegacySetting {
    fn matches(&self, code: u8, name: &str) -> bool {
        match self {
            LegacySetting::Code(value) => *value == code,
            LegacySetting::Name(value) => value.eq_ignore_ascii_case(name),
        }
    }
}

/// Legacy `json2typescript.json` configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOptions {
    #[serde(default)]
    pub operation_mode: Option<LegacySetting>,
    #[serde(default)]
    pub value_checking_mode: Option<LegacySetting>,
    #[serde(default)]
    pub ignore_primitive_checks: Option<bool>,
    #[serde(default)]
    pub property_matching_rule: Option<LegacySetting>,
}

fn operation_mode(setting: &LegacySetting) -> crate::Result<OperationMode> {
    Ok(match setting {
        s if s.matches(0, "DISABLE") => OperationMode::Disable,
        s if s.matches(1, "ENABLE") => OperationMode::Enable,
        s if s.matches(2, "LOGGING") => OperationMode::Logging,
        other => bail!("unknown operationMode {:?}", other),
    })
}

fn value_checking_mode(setting: &LegacySetting) -> crate::Result<ValueCheckingMode> {
    Ok(match setting {
        s if s.matches(1, "ALLOW_NULL") => ValueCheckingMode::AllowNull,
        s if s.matches(2, "ALLOW_OBJECT_NULL") => ValueCheckingMode::AllowObjectNull,
        s if s.matches(3, "DISALLOW_NULL") => ValueCheckingMode::DisallowNull,
        other => bail!("unknown valueCheckingMode {:?}", other),
    })
}

fn property_matching_rule(setting: &LegacySetting) -> crate::Result<PropertyMatchingRule> {
    Ok(match setting {
        s if s.matches(1, "CASE_STRICT") => PropertyMatchingRule::CaseStrict,
        s if s.matches(2, "CASE_INSENSITIVE") => PropertyMatchingRule::CaseInsensitive,
        other => bail!("unknown propertyMatchingRule {:?}", other),
    })
}

impl TryFrom<LegacyOptions> for RecordmapConfig {
    type Error = anyhow::Error;

    fn try_from(legacy: LegacyOptions) -> crate::Result<Self> {
        let mut convert = ConvertOptions::default();
        if let Some(setting) = &legacy.operation_mode {
            convert.operation_mode = operation_mode(setting)?;
        }
        if let Some(setting) = &legacy.value_checking_mode {
            convert.value_checking_mode = value_checking_mode(setting)?;
        }
        if let Some(ignore) = legacy.ignore_primitive_checks {
            convert.ignore_primitive_checks = ignore;
        }
        if let Some(setting) = &legacy.property_matching_rule {
            convert.property_matching_rule = property_matching_rule(setting)?;
        }
        Ok(RecordmapConfig { convert })
    }
}
