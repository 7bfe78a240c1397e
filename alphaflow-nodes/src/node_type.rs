//! node_type.rs
//!
//! The core interface every component node implements (`NodeType`), plus the
//! descriptor, output and error types used while instantiating a node.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chat_models::{BaseChatModel, ClientError};
use crate::credential::CredentialError;
use crate::node::{NodeData, NodeInitContext};
use crate::params::{ensure_unique_names, InputParam};

/// Errors surfaced while instantiating a node:
/// - `InvalidConfig`: the descriptor or the configured values are unusable;
/// - `Credential`: credential resolution failed, passed through unchanged;
/// - `Client`: the wrapped client refused the assembled options.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Static metadata the host uses to render a node and check connections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    pub label: String,
    pub name: String,
    /// Bumped whenever saved workflows need migrating.
    pub version: f32,
    /// Logical output type tag.
    #[serde(rename = "type")]
    pub type_: String,
    pub icon: String,
    pub category: String,
    pub description: String,
    /// Capability tags the output satisfies: own type first, then the wrapped client's.
    pub base_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<InputParam>,
    pub inputs: Vec<InputParam>,
}

impl NodeDescription {
    pub fn validate(&self) -> Result<(), NodeError> {
        ensure_unique_names(&self.inputs)
    }

    pub fn input(&self, name: &str) -> Option<&InputParam> {
        self.inputs.iter().find(|p| p.name == name)
    }
}

/// `[own_type, ...delegated]`, order preserved and nothing de-duplicated.
pub fn base_classes(own_type: &str, delegated: &[&str]) -> Vec<String> {
    std::iter::once(own_type)
        .chain(delegated.iter().copied())
        .map(str::to_string)
        .collect()
}

/// What a node hands back to the host after `init`.
#[derive(Clone)]
pub enum NodeOutput {
    ChatModel(Arc<dyn BaseChatModel>),
}

impl NodeOutput {
    pub fn into_chat_model(self) -> Option<Arc<dyn BaseChatModel>> {
        match self {
            NodeOutput::ChatModel(model) => Some(model),
        }
    }
}

impl fmt::Debug for NodeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeOutput::ChatModel(model) => f.debug_tuple("ChatModel").field(model).finish(),
        }
    }
}

/// The trait all component nodes implement.
#[async_trait]
pub trait NodeType: Send + Sync {
    /// Registry key, e.g. "chatZylon".
    fn name(&self) -> &str;

    /// Name shown in the node palette.
    fn display_name(&self) -> &str;

    /// Full static metadata. Must be deterministic: two calls compare equal.
    fn description(&self) -> NodeDescription;

    /// Build the node's runtime object from the configured values.
    ///
    /// `input` is the upstream text input, unused by nodes that only
    /// construct clients.
    async fn init(
        &self,
        node_data: &NodeData,
        input: &str,
        ctx: &NodeInitContext<'_>,
    ) -> Result<NodeOutput, NodeError>;
}
