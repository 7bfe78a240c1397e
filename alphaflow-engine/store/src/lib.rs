pub mod credential_store;
pub mod model;

pub use credential_store::CredentialStore;
pub use model::{CredentialId, StoredCredential};
