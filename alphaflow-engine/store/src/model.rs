use std::fmt;

use alphaflow_nodes::CredentialData;
use serde::{Deserialize, Serialize};

pub type CredentialId = String;

/// A credential record as the host keeps it: which descriptor it fills in,
/// which workspace owns it, and the decrypted field values.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    /// Descriptor name, e.g. "zylonApi".
    pub credential_name: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub data: CredentialData,
}

impl StoredCredential {
    pub fn new(credential_name: &str, data: CredentialData) -> Self {
        Self {
            credential_name: credential_name.to_owned(),
            workspace_id: None,
            data,
        }
    }

    pub fn in_workspace(mut self, workspace_id: &str) -> Self {
        self.workspace_id = Some(workspace_id.to_owned());
        self
    }

    /// Records without a workspace are visible everywhere.
    pub fn visible_in(&self, workspace_id: Option<&str>) -> bool {
        match (self.workspace_id.as_deref(), workspace_id) {
            (Some(owner), Some(requested)) => owner == requested,
            _ => true,
        }
    }
}

/// Prints field names only, never the secret values.
impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("credential_name", &self.credential_name)
            .field("workspace_id", &self.workspace_id)
            .field("fields", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}
