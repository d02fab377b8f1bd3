//! HTTP client for a running stockroom server.
//!
//! Credentials are held here, on the caller's side, and sent as HTTP Basic
//! auth with every protected request.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::api::error::ErrorResponse;
use crate::api::LoginRequest;
use crate::backend::{BackendResult, InventoryBackend};
use crate::inventory::{AdjustQuantityRequest, Material, MaterialFormData};
use crate::search::SearchField;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication required or credentials rejected")]
    Unauthorized,
    #[error("material not found: {0}")]
    NotFound(String),
    #[error("server returned error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: RwLock<Option<Credentials>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: RwLock::new(None),
        })
    }

    pub fn with_credentials(self, username: &str, password: &str) -> Self {
        self.set_credentials(username, password);
        self
    }

    pub fn set_credentials(&self, username: &str, password: &str) {
        *self.credentials.write() = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    pub fn clear_credentials(&self) {
        *self.credentials.write() = None;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));

        match self.credentials.read().as_ref() {
            Some(c) => builder.basic_auth(&c.username, Some(&c.password)),
            None => builder,
        }
    }

    /// GET /health
    pub async fn health(&self) -> Result<String, ClientError> {
        let response = self.request(Method::GET, "/health").send().await?;
        let response = check(response, None).await?;
        Ok(response.text().await?)
    }

    /// POST /api/auth/login. A rejected pair is `Ok(false)`, not an error.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        match check(response, None).await {
            Ok(_) => Ok(true),
            Err(ClientError::Unauthorized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// GET /api/materials, optionally filtered server-side
    pub async fn list_materials(
        &self,
        search: Option<(&str, SearchField)>,
    ) -> Result<Vec<Material>, ClientError> {
        let mut builder = self.request(Method::GET, "/api/materials");
        if let Some((query, field)) = search {
            builder = builder.query(&[("q", query), ("field", field.as_str())]);
        }
        decode(builder.send().await?, None).await
    }

    pub async fn get_material(&self, id: &str) -> Result<Material, ClientError> {
        let response = self
            .request(Method::GET, &format!("/api/materials/{}", id))
            .send()
            .await?;
        decode(response, Some(id)).await
    }

    pub async fn create_material(&self, data: &MaterialFormData) -> Result<Material, ClientError> {
        let response = self
            .request(Method::POST, "/api/materials")
            .json(data)
            .send()
            .await?;
        decode(response, None).await
    }

    pub async fn update_material(
        &self,
        id: &str,
        data: &MaterialFormData,
    ) -> Result<Material, ClientError> {
        let response = self
            .request(Method::PUT, &format!("/api/materials/{}", id))
            .json(data)
            .send()
            .await?;
        decode(response, Some(id)).await
    }

    pub async fn set_quantity(&self, id: &str, quantity: i64) -> Result<Material, ClientError> {
        let response = self
            .request(Method::PATCH, &format!("/api/materials/{}/quantity", id))
            .json(&AdjustQuantityRequest { quantity })
            .send()
            .await?;
        decode(response, Some(id)).await
    }

    pub async fn delete_material(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/api/materials/{}", id))
            .send()
            .await?;
        check(response, Some(id)).await?;
        Ok(())
    }
}

async fn check(response: Response, id: Option<&str>) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(
            id.map(str::to_string).unwrap_or(message),
        ));
    }

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(
    response: Response,
    id: Option<&str>,
) -> Result<T, ClientError> {
    let response = check(response, id).await?;
    Ok(response.json().await?)
}

#[async_trait]
impl InventoryBackend for ApiClient {
    async fn authenticate(&self, username: &str, password: &str) -> BackendResult<bool> {
        let ok = self.login(username, password).await?;
        if ok {
            self.set_credentials(username, password);
        }
        Ok(ok)
    }

    async fn list(&self) -> BackendResult<Vec<Material>> {
        Ok(self.list_materials(None).await?)
    }

    async fn insert(&self, data: MaterialFormData) -> BackendResult<Material> {
        Ok(self.create_material(&data).await?)
    }

    async fn replace(&self, id: &str, data: MaterialFormData) -> BackendResult<Material> {
        Ok(self.update_material(id, &data).await?)
    }

    async fn adjust_quantity(&self, id: &str, quantity: i64) -> BackendResult<Material> {
        Ok(self.set_quantity(id, quantity).await?)
    }

    async fn remove(&self, id: &str) -> BackendResult<()> {
        Ok(self.delete_material(id).await?)
    }

    fn sign_out(&self) {
        self.clear_credentials();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::CredentialStore;
    use crate::config::Config;
    use crate::inventory::InventoryStore;
    use crate::AppState;

    /// Serve the real router on an ephemeral port
    async fn spawn_server() -> String {
        let state = Arc::new(AppState::new(
            Config::default(),
            Arc::new(InventoryStore::seeded()),
            Arc::new(CredentialStore::default()),
        ));
        let app = crate::api::create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_client_round_trip_against_router() {
        let base = spawn_server().await;
        let client = ApiClient::new(&base).unwrap();

        assert_eq!(client.health().await.unwrap(), "OK");
        assert!(matches!(
            client.list_materials(None).await,
            Err(ClientError::Unauthorized)
        ));

        assert!(!client.authenticate("admin", "wrong").await.unwrap());
        assert!(client.authenticate("admin", "admin123").await.unwrap());

        let listed = client.list_materials(None).await.unwrap();
        assert_eq!(listed.len(), 2);

        let created = client
            .create_material(&MaterialFormData {
                name: "Bolts".to_string(),
                quantity: 50,
                unit: "box".to_string(),
                category: "Metal".to_string(),
                reorder_point: 10,
                image_url: None,
            })
            .await
            .unwrap();

        let metal = client
            .list_materials(Some(("metal", SearchField::Category)))
            .await
            .unwrap();
        assert_eq!(metal.len(), 2);

        let adjusted = client.set_quantity(&created.id, 45).await.unwrap();
        assert_eq!(adjusted.quantity, 45);

        client.delete_material(&created.id).await.unwrap();
        assert!(matches!(
            client.get_material(&created.id).await,
            Err(ClientError::NotFound(id)) if id == created.id
        ));
        assert!(matches!(
            client.set_quantity(&created.id, 1).await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_out_drops_credentials() {
        let base = spawn_server().await;
        let client = ApiClient::new(&base).unwrap().with_credentials("admin", "admin123");

        assert!(client.list().await.is_ok());
        client.sign_out();
        assert!(matches!(
            client.list().await,
            Err(crate::backend::BackendError::Unauthorized)
        ));
    }
}
