use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::router::ApiState;

/// GET /v1/healthcheck
pub async fn healthcheck(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "available",
        "system_info": {
            "environment": state.environment.as_ref(),
            "version": env!("CARGO_PKG_VERSION"),
        }
    }))
}
