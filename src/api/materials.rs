//! Material CRUD endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::auth::AuthenticatedUser;
use super::error::ApiError;
use super::metrics::record_material_mutation;
use crate::inventory::{AdjustQuantityRequest, Material, MaterialFormData};
use crate::search::{self, SearchField};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListMaterialsQuery {
    /// Case-insensitive substring to match
    pub q: Option<String>,
    /// name, category or lastUpdated (default name)
    pub field: Option<String>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// List all materials, filtered when `q` is non-empty
///
/// GET /api/materials
pub async fn list_materials(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListMaterialsQuery>,
) -> Result<Json<Vec<Material>>, ApiError> {
    let field = match params.field.as_deref() {
        Some(f) => f
            .parse::<SearchField>()
            .map_err(|e| ApiError::validation_field("field", e))?,
        None => SearchField::default(),
    };

    let materials = state.inventory.list();
    let materials = match params.q.as_deref() {
        Some(q) if !q.is_empty() => search::filter(&materials, q, field),
        _ => materials,
    };

    Ok(Json(materials))
}

/// GET /api/materials/:id
pub async fn get_material(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Material>, ApiError> {
    state
        .inventory
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Material not found"))
}

/// POST /api/materials
pub async fn create_material(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<MaterialFormData>, JsonRejection>,
) -> Result<(StatusCode, Json<Material>), ApiError> {
    let data = json_body(payload)?;
    let material = state.inventory.insert(data);

    record_material_mutation("create");
    info!(id = %material.id, user = %user.username, "Material created via API");

    Ok((StatusCode::CREATED, Json(material)))
}

/// Full replacement of the editable fields
///
/// PUT /api/materials/:id
pub async fn update_material(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    payload: Result<Json<MaterialFormData>, JsonRejection>,
) -> Result<Json<Material>, ApiError> {
    let data = json_body(payload)?;
    let material = state.inventory.replace(&id, data)?;

    record_material_mutation("update");
    info!(id = %id, user = %user.username, "Material updated via API");

    Ok(Json(material))
}

/// PATCH /api/materials/:id/quantity
pub async fn adjust_quantity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    payload: Result<Json<AdjustQuantityRequest>, JsonRejection>,
) -> Result<Json<Material>, ApiError> {
    let req = json_body(payload)?;
    let material = state.inventory.adjust_quantity(&id, req.quantity)?;

    record_material_mutation("adjust_quantity");
    info!(id = %id, quantity = req.quantity, user = %user.username, "Quantity set via API");

    Ok(Json(material))
}

/// Idempotent: deleting an unknown id still answers 204
///
/// DELETE /api/materials/:id
pub async fn delete_material(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.inventory.remove(&id) {
        record_material_mutation("delete");
        info!(id = %id, user = %user.username, "Material deleted via API");
    }

    StatusCode::NO_CONTENT
}
