use std::any::Any;
use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::db::CredentialsStorage;
use crate::error::{ApiError, server_error_body};
use crate::handlers::credentials::{
    create_credential, delete_credential, list_credentials, show_credential, update_credential,
};
use crate::handlers::healthcheck::healthcheck;

#[derive(Clone)]
pub struct ApiState {
    pub storage: CredentialsStorage,
    pub environment: Arc<str>,
}

impl ApiState {
    pub fn new(storage: CredentialsStorage, environment: impl Into<Arc<str>>) -> Self {
        Self {
            storage,
            environment: environment.into(),
        }
    }
}

pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/v1/healthcheck", get(healthcheck))
        .route(
            "/v1/signin",
            get(list_credentials).post(create_credential),
        )
        .route(
            "/v1/signin/{id}",
            get(show_credential)
                .patch(update_credential)
                .delete(delete_credential),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string panic payload>".to_string());
    error!(panic = %detail, "handler panicked");

    let mut resp = (StatusCode::INTERNAL_SERVER_ERROR, Json(server_error_body())).into_response();
    resp.headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    resp
}
