//! The operations a view needs from whatever holds the inventory.
//!
//! `LocalBackend` serves them from in-process stores; `client::ApiClient`
//! serves them from a running server.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::CredentialStore;
use crate::client::ClientError;
use crate::inventory::{InventoryError, InventoryStore, Material, MaterialFormData};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("material not found: {0}")]
    NotFound(String),
    #[error("not authorized")]
    Unauthorized,
    #[error("{0}")]
    Remote(String),
}

impl From<InventoryError> for BackendError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::NotFound(id) => BackendError::NotFound(id),
        }
    }
}

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(what) => BackendError::NotFound(what),
            ClientError::Unauthorized => BackendError::Unauthorized,
            other => BackendError::Remote(other.to_string()),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait InventoryBackend: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> BackendResult<bool>;

    async fn list(&self) -> BackendResult<Vec<Material>>;

    async fn insert(&self, data: MaterialFormData) -> BackendResult<Material>;

    async fn replace(&self, id: &str, data: MaterialFormData) -> BackendResult<Material>;

    async fn adjust_quantity(&self, id: &str, quantity: i64) -> BackendResult<Material>;

    async fn remove(&self, id: &str) -> BackendResult<()>;

    /// Forget any credentials held for the current session
    fn sign_out(&self) {}
}

/// In-process backend over shared stores
#[derive(Debug, Clone)]
pub struct LocalBackend {
    inventory: Arc<InventoryStore>,
    credentials: Arc<CredentialStore>,
}

impl LocalBackend {
    pub fn new(inventory: Arc<InventoryStore>, credentials: Arc<CredentialStore>) -> Self {
        Self {
            inventory,
            credentials,
        }
    }

    pub fn inventory(&self) -> &Arc<InventoryStore> {
        &self.inventory
    }
}

#[async_trait]
impl InventoryBackend for LocalBackend {
    async fn authenticate(&self, username: &str, password: &str) -> BackendResult<bool> {
        Ok(self.credentials.authenticate(username, password))
    }

    async fn list(&self) -> BackendResult<Vec<Material>> {
        Ok(self.inventory.list())
    }

    async fn insert(&self, data: MaterialFormData) -> BackendResult<Material> {
        Ok(self.inventory.insert(data))
    }

    async fn replace(&self, id: &str, data: MaterialFormData) -> BackendResult<Material> {
        Ok(self.inventory.replace(id, data)?)
    }

    async fn adjust_quantity(&self, id: &str, quantity: i64) -> BackendResult<Material> {
        Ok(self.inventory.adjust_quantity(id, quantity)?)
    }

    async fn remove(&self, id: &str) -> BackendResult<()> {
        self.inventory.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> LocalBackend {
        LocalBackend::new(
            Arc::new(InventoryStore::seeded()),
            Arc::new(CredentialStore::default()),
        )
    }

    #[test]
    fn test_local_backend_authenticate() {
        let backend = backend();
        assert!(tokio_test::block_on(backend.authenticate("admin", "admin123")).unwrap());
        assert!(!tokio_test::block_on(backend.authenticate("admin", "nope")).unwrap());
    }

    #[test]
    fn test_local_backend_maps_not_found() {
        let backend = backend();
        let err = tokio_test::block_on(backend.adjust_quantity("42", 1)).unwrap_err();
        assert!(matches!(err, BackendError::NotFound(id) if id == "42"));

        let err = tokio_test::block_on(backend.replace("42", MaterialFormData::default()))
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_local_backend_remove_twice() {
        let backend = backend();
        backend.remove("1").await.unwrap();
        backend.remove("1").await.unwrap();
        assert_eq!(backend.list().await.unwrap().len(), 1);
    }
}
