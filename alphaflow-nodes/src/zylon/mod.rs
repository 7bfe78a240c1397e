// src/zylon/mod.rs
//! The Zylon chat model node and its API-key credential.

pub mod zylon_credential;
pub mod zylon_handler;
pub mod zylon_params;

use std::sync::Arc;

use crate::registry::{Component, ComponentRegistry, RegistryError};

pub use zylon_credential::ZylonApiCredential;
pub use zylon_handler::ChatZylonNode;

/// Credential factory exported to the host.
pub fn cred_class() -> Component {
    Component::Credential(ZylonApiCredential::descriptor())
}

/// Node factory exported to the host.
pub fn node_class() -> Component {
    Component::Node(Arc::new(ChatZylonNode::new()))
}

/// Register the Zylon node and credential
pub fn register_node(registry: &mut ComponentRegistry) -> Result<(), RegistryError> {
    registry.register(zylon_credential::ZYLON_API_CREDENTIAL, cred_class)?;
    registry.register(zylon_handler::CHAT_ZYLON, node_class)?;
    Ok(())
}
