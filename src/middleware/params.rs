use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::error::ApiError;

/// The `{id}` path segment as a positive integer; anything else is a 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdParam(pub i64);

impl<S> FromRequestParts<S> for IdParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;
        parse_id(&raw).map(IdParam).ok_or(ApiError::NotFound)
    }
}

pub fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id >= 1)
}

/// First value of `key` in the raw query string, or `default` when absent.
pub fn single_query_param(query: Option<&str>, key: &str, default: &str) -> String {
    query
        .and_then(|qs| {
            url::form_urlencoded::parse(qs.as_bytes())
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("1.5"), None);
    }

    #[test]
    fn query_params_take_first_value_or_default() {
        assert_eq!(single_query_param(None, "content", ""), "");
        assert_eq!(
            single_query_param(Some("author=Ann+Lee&author=Bo"), "author", ""),
            "Ann Lee"
        );
        assert_eq!(
            single_query_param(Some("content=a%40b.com"), "content", ""),
            "a@b.com"
        );
        assert_eq!(single_query_param(Some("x=1"), "author", "none"), "none");
    }
}
