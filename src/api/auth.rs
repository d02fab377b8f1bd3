use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::auth::INVALID_CREDENTIALS;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub authenticated: bool,
    pub username: String,
}

/// The user whose Basic credentials were accepted for this request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Login endpoint. Issues nothing: the caller keeps its credentials and sends
/// them as Basic auth on later requests.
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    if !state
        .credentials
        .authenticate(&request.username, &request.password)
    {
        tracing::warn!(username = %request.username, "Login rejected");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    tracing::info!(username = %request.username, "Login accepted");
    Ok(Json(LoginResponse {
        authenticated: true,
        username: request.username,
    }))
}

/// Decode `Authorization: Basic <base64(user:pass)>`
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Auth middleware that checks Basic credentials against the credential store
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (username, password) = basic_credentials(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !state.credentials.authenticate(&username, &password) {
        tracing::debug!(username = %username, "Rejected request credentials");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    request
        .extensions_mut()
        .insert(AuthenticatedUser { username });
    Ok(next.run(request).await)
}
