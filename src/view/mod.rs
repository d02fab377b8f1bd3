//! View state for an inventory screen.
//!
//! Holds the session, the loaded collection, the search text and field, and
//! the one open modal. Every action goes through an [`InventoryBackend`];
//! mutations reload the collection only after the backend has answered, so
//! the view never shows data older than a write it made.

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::INVALID_CREDENTIALS;
use crate::backend::{BackendError, InventoryBackend};
use crate::inventory::{Material, MaterialFormData};
use crate::search::{self, SearchField};

pub const MATERIAL_NOT_FOUND: &str = "Material not found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    LoggedOut { error: Option<String> },
    LoggedIn { username: String },
}

/// The open overlay. A single field, so two can never be open together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Modal {
    #[default]
    None,
    Add,
    Edit(Material),
    Adjust(Material),
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("not logged in")]
    NotAuthenticated,
    #[error("no matching form is open")]
    NoModal,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type ViewResult = Result<(), ViewError>;

pub struct ViewController<B> {
    backend: B,
    session: Session,
    materials: Vec<Material>,
    query: String,
    field: SearchField,
    modal: Modal,
    notice: Option<String>,
}

impl<B: InventoryBackend> ViewController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            session: Session::LoggedOut { error: None },
            materials: Vec::new(),
            query: String::new(),
            field: SearchField::default(),
            modal: Modal::None,
            notice: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.session, Session::LoggedIn { .. })
    }

    /// Message from the last failed login, if any
    pub fn login_error(&self) -> Option<&str> {
        match &self.session {
            Session::LoggedOut { error } => error.as_deref(),
            Session::LoggedIn { .. } => None,
        }
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    /// Recoverable failure message from the last action
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn search_field(&self) -> SearchField {
        self.field
    }

    /// Everything loaded, unfiltered
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// The loaded collection after the current search
    pub fn visible(&self) -> Vec<Material> {
        search::filter(&self.materials, &self.query, self.field)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> ViewResult {
        if !self.backend.authenticate(username, password).await? {
            warn!(username = %username, "Login failed");
            self.session = Session::LoggedOut {
                error: Some(INVALID_CREDENTIALS.to_string()),
            };
            return Ok(());
        }

        info!(username = %username, "Logged in");
        self.session = Session::LoggedIn {
            username: username.to_string(),
        };
        self.reload().await
    }

    pub fn logout(&mut self) {
        self.backend.sign_out();
        self.session = Session::LoggedOut { error: None };
        self.materials.clear();
        self.query.clear();
        self.field = SearchField::default();
        self.modal = Modal::None;
        self.notice = None;
    }

    /// Fetch the full collection
    pub async fn reload(&mut self) -> ViewResult {
        self.require_login()?;
        self.materials = self.backend.list().await?;
        Ok(())
    }

    pub fn open_add(&mut self) -> ViewResult {
        self.require_login()?;
        self.modal = Modal::Add;
        Ok(())
    }

    pub fn open_edit(&mut self, id: &str) -> ViewResult {
        self.open_for(id, Modal::Edit)
    }

    pub fn open_adjust(&mut self, id: &str) -> ViewResult {
        self.open_for(id, Modal::Adjust)
    }

    pub fn close_modal(&mut self) {
        self.modal = Modal::None;
    }

    pub async fn submit_add(&mut self, data: MaterialFormData) -> ViewResult {
        self.require_login()?;
        if self.modal != Modal::Add {
            return Err(ViewError::NoModal);
        }

        let result = self.backend.insert(data).await.map(|_| ());
        self.finish_mutation(result).await
    }

    pub async fn submit_edit(&mut self, data: MaterialFormData) -> ViewResult {
        self.require_login()?;
        let id = match &self.modal {
            Modal::Edit(material) => material.id.clone(),
            _ => return Err(ViewError::NoModal),
        };

        let result = self.backend.replace(&id, data).await.map(|_| ());
        self.finish_mutation(result).await
    }

    /// Apply a signed change to the quantity shown in the adjust modal
    pub async fn submit_adjust(&mut self, adjustment: i64) -> ViewResult {
        self.require_login()?;
        let (id, quantity) = match &self.modal {
            Modal::Adjust(material) => (
                material.id.clone(),
                material.quantity.saturating_add(adjustment),
            ),
            _ => return Err(ViewError::NoModal),
        };

        let result = self
            .backend
            .adjust_quantity(&id, quantity)
            .await
            .map(|_| ());
        self.finish_mutation(result).await
    }

    pub async fn delete(&mut self, id: &str) -> ViewResult {
        self.require_login()?;
        let result = self.backend.remove(id).await;
        self.finish_mutation(result).await
    }

    pub fn search(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn set_search_field(&mut self, field: SearchField) {
        self.field = field;
    }

    /// Open a modal on a loaded material. An id missing from the loaded
    /// collection leaves no modal open and shows the not-found notice.
    fn open_for(&mut self, id: &str, modal: fn(Material) -> Modal) -> ViewResult {
        self.require_login()?;
        match self.materials.iter().find(|m| m.id == id) {
            Some(material) => {
                self.modal = modal(material.clone());
            }
            None => {
                warn!(id = %id, "Cannot open form for unknown material");
                self.modal = Modal::None;
                self.notice = Some(MATERIAL_NOT_FOUND.to_string());
            }
        }
        Ok(())
    }

    fn require_login(&self) -> ViewResult {
        if self.is_logged_in() {
            Ok(())
        } else {
            Err(ViewError::NotAuthenticated)
        }
    }

    /// Close the modal and reload once a mutation has completed. A missing
    /// material becomes a notice instead of an error.
    async fn finish_mutation(&mut self, result: Result<(), BackendError>) -> ViewResult {
        match result {
            Ok(()) => {
                self.notice = None;
            }
            Err(BackendError::NotFound(id)) => {
                warn!(id = %id, "Mutation target no longer exists");
                self.notice = Some(MATERIAL_NOT_FOUND.to_string());
            }
            Err(e) => {
                self.notice = Some(e.to_string());
                return Err(e.into());
            }
        }

        self.modal = Modal::None;
        self.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::CredentialStore;
    use crate::backend::LocalBackend;
    use crate::inventory::InventoryStore;

    fn controller() -> ViewController<LocalBackend> {
        ViewController::new(LocalBackend::new(
            Arc::new(InventoryStore::seeded()),
            Arc::new(CredentialStore::default()),
        ))
    }

    async fn logged_in() -> ViewController<LocalBackend> {
        let mut view = controller();
        view.login("admin", "admin123").await.unwrap();
        view
    }

    fn bolts() -> MaterialFormData {
        MaterialFormData {
            name: "Bolts".to_string(),
            quantity: 50,
            unit: "box".to_string(),
            category: "Metal".to_string(),
            reorder_point: 10,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_failed_login_sets_message() {
        let mut view = controller();
        view.login("admin", "nope").await.unwrap();

        assert!(!view.is_logged_in());
        assert_eq!(view.login_error(), Some(INVALID_CREDENTIALS));
        assert!(view.materials().is_empty());
    }

    #[tokio::test]
    async fn test_login_loads_collection() {
        let mut view = controller();
        view.login("admin", "nope").await.unwrap();
        view.login("admin", "admin123").await.unwrap();

        assert_eq!(
            view.session(),
            &Session::LoggedIn {
                username: "admin".to_string()
            }
        );
        assert_eq!(view.login_error(), None);
        assert_eq!(view.materials().len(), 2);
    }

    #[tokio::test]
    async fn test_actions_require_login() {
        let mut view = controller();
        assert!(matches!(view.open_add(), Err(ViewError::NotAuthenticated)));
        assert!(matches!(
            view.delete("1").await,
            Err(ViewError::NotAuthenticated)
        ));
        assert_eq!(view.backend().inventory().len(), 2);
    }

    #[tokio::test]
    async fn test_modals_replace_each_other() {
        let mut view = logged_in().await;
        let steel = view.materials()[0].clone();

        view.open_add().unwrap();
        view.open_edit(&steel.id).unwrap();
        assert_eq!(view.modal(), &Modal::Edit(steel.clone()));

        view.open_adjust(&steel.id).unwrap();
        assert_eq!(view.modal(), &Modal::Adjust(steel));

        view.close_modal();
        assert_eq!(view.modal(), &Modal::None);
    }

    #[tokio::test]
    async fn test_submit_add_closes_modal_and_reloads() {
        let mut view = logged_in().await;
        view.open_add().unwrap();
        view.submit_add(bolts()).await.unwrap();

        assert_eq!(view.modal(), &Modal::None);
        assert_eq!(view.materials().len(), 3);
        assert_eq!(view.materials()[2].name, "Bolts");
    }

    #[tokio::test]
    async fn test_submit_without_modal_is_rejected() {
        let mut view = logged_in().await;
        assert!(matches!(
            view.submit_add(bolts()).await,
            Err(ViewError::NoModal)
        ));
        assert!(matches!(
            view.submit_adjust(1).await,
            Err(ViewError::NoModal)
        ));
        assert_eq!(view.materials().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_edit_replaces_fields() {
        let mut view = logged_in().await;
        let lumber = view.materials()[1].clone();

        view.open_edit(&lumber.id).unwrap();
        let mut data = lumber.form_data();
        data.unit = "boards".to_string();
        view.submit_edit(data).await.unwrap();

        let reloaded = &view.materials()[1];
        assert_eq!(reloaded.id, lumber.id);
        assert_eq!(reloaded.unit, "boards");
        assert_eq!(view.modal(), &Modal::None);
    }

    #[tokio::test]
    async fn test_submit_adjust_adds_to_current_quantity() {
        let mut view = logged_in().await;
        let steel = view.materials()[0].clone();

        view.open_adjust(&steel.id).unwrap();
        view.submit_adjust(-520).await.unwrap();

        assert_eq!(view.materials()[0].quantity, -20);
        assert_eq!(view.modal(), &Modal::None);
    }

    #[tokio::test]
    async fn test_adjust_on_deleted_material_is_recoverable() {
        let mut view = logged_in().await;
        let steel = view.materials()[0].clone();

        view.open_adjust(&steel.id).unwrap();
        view.backend().inventory().remove(&steel.id);
        view.submit_adjust(5).await.unwrap();

        assert_eq!(view.notice(), Some(MATERIAL_NOT_FOUND));
        assert_eq!(view.modal(), &Modal::None);
        assert_eq!(view.materials().len(), 1);

        view.dismiss_notice();
        assert_eq!(view.notice(), None);
    }

    #[tokio::test]
    async fn test_edit_on_deleted_material_is_recoverable() {
        let mut view = logged_in().await;
        let lumber = view.materials()[1].clone();

        view.open_edit(&lumber.id).unwrap();
        view.backend().inventory().remove(&lumber.id);
        view.submit_edit(bolts()).await.unwrap();

        assert_eq!(view.notice(), Some(MATERIAL_NOT_FOUND));
        assert!(view.materials().iter().all(|m| m.name != "Bolts"));
    }

    #[tokio::test]
    async fn test_open_unknown_id_shows_notice() {
        let mut view = logged_in().await;
        view.open_add().unwrap();

        view.open_edit("42").unwrap();
        assert_eq!(view.modal(), &Modal::None);
        assert_eq!(view.notice(), Some(MATERIAL_NOT_FOUND));

        view.dismiss_notice();
        view.open_adjust("2").unwrap();
        assert_eq!(view.modal(), &Modal::Adjust(view.materials()[1].clone()));
        assert_eq!(view.notice(), None);
    }

    #[tokio::test]
    async fn test_delete_reloads() {
        let mut view = logged_in().await;
        view.delete("1").await.unwrap();
        view.delete("1").await.unwrap();

        assert_eq!(view.materials().len(), 1);
        assert_eq!(view.notice(), None);
    }

    #[tokio::test]
    async fn test_search_filters_loaded_collection() {
        let mut view = logged_in().await;

        view.set_search_field(SearchField::Category);
        view.search("wood");
        let visible = view.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Lumber 2x4");

        view.search("");
        assert_eq!(view.visible().len(), 2);
    }

    #[tokio::test]
    async fn test_logout_clears_state() {
        let mut view = logged_in().await;
        view.search("steel");
        view.open_add().unwrap();

        view.logout();

        assert!(!view.is_logged_in());
        assert_eq!(view.login_error(), None);
        assert!(view.materials().is_empty());
        assert_eq!(view.query(), "");
        assert_eq!(view.modal(), &Modal::None);
    }
}
