use std::collections::HashMap;

use alphaflow_nodes::{CredentialData, CredentialError, CredentialResolver, ExecutionOptions};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;
use uuid::Uuid;

use crate::model::{CredentialId, StoredCredential};

/// In-memory credential storage, shared between concurrent node inits.
#[derive(Default)]
pub struct CredentialStore {
    credentials: RwLock<HashMap<CredentialId, StoredCredential>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record under a fresh id and return the id.
    pub async fn insert(&self, credential: StoredCredential) -> CredentialId {
        let id = Uuid::new_v4().to_string();
        trace!(id = %id, credential = %credential.credential_name, "credential stored");
        self.credentials.write().await.insert(id.clone(), credential);
        id
    }

    pub async fn get(&self, id: &str) -> Option<StoredCredential> {
        self.credentials.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<StoredCredential> {
        self.credentials.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.credentials.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.credentials.write().await.clear();
    }
}

#[async_trait]
impl CredentialResolver for CredentialStore {
    async fn credential_data(
        &self,
        credential_id: &str,
        options: &ExecutionOptions,
    ) -> Result<CredentialData, CredentialError> {
        let credentials = self.credentials.read().await;
        match credentials.get(credential_id) {
            Some(record) if record.visible_in(options.workspace_id.as_deref()) => {
                Ok(record.data.clone())
            }
            // a record owned by another workspace must look exactly like a missing one
            _ => Err(CredentialError::NotFound(credential_id.to_owned())),
        }
    }
}
