use axum::{
    Json,
    body::Body,
    extract::{RawQuery, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde_json::{Value, json};
use tracing::info;

use crate::db::{Credential, CredentialPatch, NewCredential, merge, validate_credential};
use crate::error::ApiError;
use crate::middleware::{IdParam, JsonBody, read_json, single_query_param};
use crate::router::ApiState;
use crate::validator::Validator;

fn ensure_valid(credential: &Credential) -> Result<(), ApiError> {
    let mut v = Validator::new();
    validate_credential(&mut v, credential);
    if v.is_empty() {
        Ok(())
    } else {
        Err(ApiError::FailedValidation(v.into_errors()))
    }
}

/// POST /v1/signin
pub async fn create_credential(
    State(state): State<ApiState>,
    JsonBody(input): JsonBody<NewCredential>,
) -> Result<impl IntoResponse, ApiError> {
    let mut credential = Credential::from(input);
    ensure_valid(&credential)?;

    state.storage.insert(&mut credential).await?;
    info!(id = credential.id, "credential created");

    let mut headers = HeaderMap::new();
    let location = format!("/v1/comments/{}", credential.id);
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(json!({ "credential": credential })),
    ))
}

async fn fetch_credential(state: &ApiState, id: i64) -> Result<Credential, ApiError> {
    Ok(state.storage.get(id).await?)
}

/// GET /v1/signin/{id}
pub async fn show_credential(
    State(state): State<ApiState>,
    IdParam(id): IdParam,
) -> Result<Json<Value>, ApiError> {
    let credential = fetch_credential(&state, id).await?;
    Ok(Json(json!({ "credential": credential })))
}

/// PATCH /v1/signin/{id}
///
/// The record is looked up before the body is decoded, so an unknown id is a
/// 404 even when the body is malformed.
pub async fn update_credential(
    State(state): State<ApiState>,
    IdParam(id): IdParam,
    body: Body,
) -> Result<Json<Value>, ApiError> {
    let existing = fetch_credential(&state, id).await?;
    let patch: CredentialPatch = read_json(body).await?;

    let mut credential = merge(existing, patch);
    ensure_valid(&credential)?;

    state.storage.update(&mut credential).await?;
    info!(id, version = credential.version, "credential updated");

    Ok(Json(json!({ "credential": credential })))
}

/// DELETE /v1/signin/{id}
pub async fn delete_credential(
    State(state): State<ApiState>,
    IdParam(id): IdParam,
) -> Result<Json<Value>, ApiError> {
    state.storage.delete(id).await?;
    info!(id, "credential deleted");
    Ok(Json(
        json!({ "message": "signup credentials deleted successfully" }),
    ))
}

/// GET /v1/signin?content=..&author=..
///
/// `content` filters on the email address and `author` on the name.
pub async fn list_credentials(
    State(state): State<ApiState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, ApiError> {
    let content = single_query_param(query.as_deref(), "content", "");
    let author = single_query_param(query.as_deref(), "author", "");

    let credentials = state.storage.get_all(&content, &author).await?;
    Ok(Json(json!({ "credentials": credentials })))
}
