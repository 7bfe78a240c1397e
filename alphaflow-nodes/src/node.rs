use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::credential::CredentialResolver;

/// Input values as the host stored them, keyed by the declared input name.
pub type NodeInputs = Map<String, Value>;

/// A node instance as configured in a workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Unique id of this node inside the workflow, e.g. "chatZylon_0"
    pub id: String,
    /// Component key used to find the `NodeType` in the registry, e.g. "chatZylon"
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    /// User-configured values; optional fields may be missing entirely.
    #[serde(default)]
    pub inputs: NodeInputs,
    /// Opaque reference to a stored credential, empty when none is attached.
    #[serde(default)]
    pub credential: String,
}

impl NodeData {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            label: None,
            inputs: NodeInputs::new(),
            credential: String::new(),
        }
    }

    /// Replace all inputs. Non-object values leave the inputs empty.
    pub fn with_inputs(mut self, inputs: Value) -> Self {
        self.inputs = match inputs {
            Value::Object(map) => map,
            _ => NodeInputs::new(),
        };
        self
    }

    pub fn with_input(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.to_string(), value.into());
        self
    }

    pub fn with_credential(mut self, credential_id: &str) -> Self {
        self.credential = credential_id.to_string();
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// Execution context forwarded untouched to credential resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chatflow_id: Option<String>,
    /// Scopes credential lookups to one workspace when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(mut self, workspace_id: &str) -> Self {
        self.workspace_id = Some(workspace_id.to_string());
        self
    }
}

/// Everything `NodeType::init` needs besides the node's own data.
pub struct NodeInitContext<'a> {
    pub options: &'a ExecutionOptions,
    pub credentials: &'a dyn CredentialResolver,
}

impl<'a> NodeInitContext<'a> {
    pub fn new(options: &'a ExecutionOptions, credentials: &'a dyn CredentialResolver) -> Self {
        Self {
            options,
            credentials,
        }
    }
}
