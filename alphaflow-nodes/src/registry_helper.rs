// alphaflow-nodes/src/registry_helper.rs

use crate::registry::{ComponentRegistry, RegistryError};
use crate::zylon;

/// Register every built-in node and credential in one go.
pub fn register_all_components(registry: &mut ComponentRegistry) -> Result<(), RegistryError> {
    zylon::register_node(registry)?;
    Ok(())
}
