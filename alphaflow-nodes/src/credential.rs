//! credential.rs
//!
//! Credential descriptors (the schema of a stored secret) and the contract used
//! to resolve a stored credential at execution time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::node::{ExecutionOptions, NodeData};
use crate::node_type::NodeError;
use crate::params::{ensure_unique_names, InputParam};

/// Decrypted fields of a stored credential, keyed by input name.
pub type CredentialData = Map<String, Value>;

/// Errors raised by a `CredentialResolver`. Nodes pass them on unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CredentialError {
    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Credential storage unavailable: {0}")]
    Unavailable(String),
}

/// Schema for a reusable stored secret, e.g. an API key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialDescriptor {
    /// Stable key nodes reference through `credentialNames`.
    pub name: String,
    pub label: String,
    pub version: f32,
    /// Help text; may contain markup.
    pub description: String,
    pub inputs: Vec<InputParam>,
}

impl CredentialDescriptor {
    pub fn validate(&self) -> Result<(), NodeError> {
        ensure_unique_names(&self.inputs)
    }
}

/// Host-side lookup of stored credentials.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn credential_data(
        &self,
        credential_id: &str,
        options: &ExecutionOptions,
    ) -> Result<CredentialData, CredentialError>;
}

/// Resolve `credential_id`, treating an empty reference as "nothing attached".
pub async fn get_credential_data(
    resolver: &dyn CredentialResolver,
    credential_id: &str,
    options: &ExecutionOptions,
) -> Result<CredentialData, CredentialError> {
    if credential_id.is_empty() {
        return Ok(CredentialData::new());
    }
    resolver.credential_data(credential_id, options).await
}

/// Look up a secret field: a node input of the same name takes precedence over
/// the credential record. Null counts as absent.
pub fn credential_param(
    name: &str,
    credential_data: &CredentialData,
    node_data: &NodeData,
) -> Option<String> {
    node_data
        .inputs
        .get(name)
        .and_then(scalar_to_string)
        .or_else(|| credential_data.get(name).and_then(scalar_to_string))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
