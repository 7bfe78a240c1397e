//! registry.rs
//!
//! `ComponentRegistry` maps a stable component key (e.g. "chatZylon",
//! "zylonApi") to a factory producing the node or credential behind it.
//! Everything is registered once at startup; lookups afterwards are read-only.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::credential::CredentialDescriptor;
use crate::node_type::{NodeError, NodeType};

/// A loadable component: either a node or a credential schema.
#[derive(Clone)]
pub enum Component {
    Node(Arc<dyn NodeType>),
    Credential(CredentialDescriptor),
}

impl Component {
    pub fn name(&self) -> &str {
        match self {
            Component::Node(node) => node.name(),
            Component::Credential(descriptor) => &descriptor.name,
        }
    }

    fn validate(&self) -> Result<(), NodeError> {
        match self {
            Component::Node(node) => node.description().validate(),
            Component::Credential(descriptor) => descriptor.validate(),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Node(node) => f.debug_tuple("Node").field(&node.name()).finish(),
            Component::Credential(descriptor) => {
                f.debug_tuple("Credential").field(descriptor).finish()
            }
        }
    }
}

pub type ComponentFactory = fn() -> Component;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Component '{0}' is already registered")]
    Duplicate(String),

    #[error("Component registered as '{key}' is named '{name}'")]
    KeyMismatch { key: String, name: String },

    #[error("Component '{key}' has an invalid descriptor: {source}")]
    InvalidDescriptor {
        key: String,
        #[source]
        source: NodeError,
    },
}

#[derive(Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register `factory` under `key`. The factory is run once here so that a
    /// broken descriptor is caught at load time instead of at first use.
    pub fn register(&mut self, key: &str, factory: ComponentFactory) -> Result<(), RegistryError> {
        if self.factories.contains_key(key) {
            return Err(RegistryError::Duplicate(key.to_string()));
        }

        let component = factory();
        if component.name() != key {
            return Err(RegistryError::KeyMismatch {
                key: key.to_string(),
                name: component.name().to_string(),
            });
        }
        component
            .validate()
            .map_err(|source| RegistryError::InvalidDescriptor {
                key: key.to_string(),
                source,
            })?;

        self.factories.insert(key.to_owned(), factory);
        Ok(())
    }

    /// Instantiate the component registered under `key`.
    pub fn create(&self, key: &str) -> Option<Component> {
        self.factories.get(key).map(|factory| factory())
    }

    pub fn node(&self, key: &str) -> Option<Arc<dyn NodeType>> {
        match self.create(key)? {
            Component::Node(node) => Some(node),
            Component::Credential(_) => None,
        }
    }

    pub fn credential(&self, key: &str) -> Option<CredentialDescriptor> {
        match self.create(key)? {
            Component::Credential(descriptor) => Some(descriptor),
            Component::Node(_) => None,
        }
    }

    /// All registered keys, sorted.
    pub fn list_components(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.factories.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn list_nodes(&self) -> Vec<String> {
        self.list_kind(|c| matches!(c, Component::Node(_)))
    }

    pub fn list_credentials(&self) -> Vec<String> {
        self.list_kind(|c| matches!(c, Component::Credential(_)))
    }

    fn list_kind(&self, keep: impl Fn(&Component) -> bool) -> Vec<String> {
        self.list_components()
            .into_iter()
            .filter(|key| self.create(key).map(|c| keep(&c)).unwrap_or(false))
            .collect()
    }
}
