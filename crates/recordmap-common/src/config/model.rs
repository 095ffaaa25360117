use recordmap_core::{ConvertOptions, Converter, MappingRegistry};
use serde::{Deserialize, Serialize};

/// Root configuration from recordmap.toml
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordmapConfig {
    /// Options handed to every converter built from this configuration
    #[serde(default)]
    pub convert: ConvertOptions,
}

impl RecordmapConfig {
    pub fn convert_options(&self) -> ConvertOptions {
        self.convert
    }

    /// A converter over `registry` using the configured options.
    pub fn converter<'r>(&self, registry: &'r MappingRegistry) -> Converter<'r> {
        Converter::new(registry).with_options(self.convert)
    }
}
