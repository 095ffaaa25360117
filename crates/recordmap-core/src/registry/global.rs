//! Process-wide registry
//!
//! Declarations are collected once at startup and installed here; after
//! that the registry is shared read-only by every [`Converter`](crate::Converter)
//! created through [`Converter::global`](crate::Converter::global).

use std::sync::OnceLock;
use tracing::info;

use super::{MappingRegistry, RegistryError};

static REGISTRY: OnceLock<MappingRegistry> = OnceLock::new();

/// Install `registry` as the process-wide registry.
///
/// Only the first call succeeds.
pub fn install(registry: MappingRegistry) -> Result<&'static MappingRegistry, RegistryError> {
    let mut installed = false;
    let stored = REGISTRY.get_or_init(|| {
        installed = true;
        registry
    });
    if !installed {
        return Err(RegistryError::AlreadyInstalled);
    }
    info!(
        "Installed mapping registry with {} record types and {} mappings",
        stored.records().count(),
        stored.len()
    );
    Ok(stored)
}

/// The installed registry, if any.
pub fn global() -> Option<&'static MappingRegistry> {
    REGISTRY.get()
}
