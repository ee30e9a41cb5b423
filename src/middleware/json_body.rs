use axum::{
    body::{Body, to_bytes},
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::ApiError;

pub const MAX_BODY_BYTES: usize = 1_048_576;

/// JSON request body that rejects with a descriptive 400 instead of axum's
/// plain-text rejection.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        read_json(req.into_body()).await.map(JsonBody)
    }
}

/// Read at most `MAX_BODY_BYTES` from `body` and decode exactly one JSON value.
pub async fn read_json<T: DeserializeOwned>(body: Body) -> Result<T, ApiError> {
    let bytes = to_bytes(body, MAX_BODY_BYTES).await.map_err(|_| {
        ApiError::BadRequest(format!(
            "body must not be larger than {MAX_BODY_BYTES} bytes"
        ))
    })?;
    decode_json(&bytes)
}

pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("body must not be empty".to_string()));
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de).map_err(describe)?;
    de.end().map_err(|_| {
        ApiError::BadRequest("body must only contain a single JSON value".to_string())
    })?;
    Ok(value)
}

fn describe(err: serde_json::Error) -> ApiError {
    let msg = match err.classify() {
        Category::Eof => "body contains badly-formed JSON".to_string(),
        Category::Syntax => format!(
            "body contains badly-formed JSON (at line {}, column {})",
            err.line(),
            err.column()
        ),
        Category::Data => match unknown_field(&err.to_string()) {
            Some(key) => format!("body contains unknown key `{key}`"),
            None => format!(
                "body contains incorrect JSON type (at line {}, column {})",
                err.line(),
                err.column()
            ),
        },
        Category::Io => "body could not be read".to_string(),
    };
    ApiError::BadRequest(msg)
}

// serde phrases it as "unknown field `key`, expected ..."
fn unknown_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("unknown field `")?;
    rest.split_once('`').map(|(key, _)| key)
}
