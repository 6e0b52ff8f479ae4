// src/extractors.rs
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::validation::{Payload, ValidationErrors};

/// A request body parsed as a JSON object and validated into `T`.
pub struct Validated<T>(pub T);

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: Payload,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::MalformedBody(e.body_text()))?;

        let object = parse_object(&body)?;
        Ok(Self(T::validate(&object)?))
    }
}

/// An absent body or any falsy JSON value (`null`, `false`, `0`, `""`, `{}`,
/// `[]`) counts as "no body".
fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::MissingBody);
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;

    match value {
        Value::Object(map) if !map.is_empty() => Ok(map),
        Value::Object(_) | Value::Null | Value::Bool(false) => Err(ApiError::MissingBody),
        Value::Number(n) if n.as_f64() == Some(0.0) => Err(ApiError::MissingBody),
        Value::String(s) if s.is_empty() => Err(ApiError::MissingBody),
        Value::Array(items) if items.is_empty() => Err(ApiError::MissingBody),
        _ => Err(ValidationErrors::not_an_object().into()),
    }
}

/// Integer id of a poll from the path. Anything else names no poll.
pub struct PollId(pub i64);

/// Integer id of a category from the path.
pub struct CategoryId(pub i64);

async fn path_id<S: Send + Sync>(
    parts: &mut Parts,
    state: &S,
    resource: &'static str,
) -> Result<i64, ApiError> {
    let Path(raw): Path<String> = Path::from_request_parts(parts, state)
        .await
        .map_err(|e| ApiError::Unexpected(e.body_text()))?;

    raw.parse()
        .map_err(|_| ApiError::NotFound { resource, id: raw })
}

impl<S> FromRequestParts<S> for PollId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_id(parts, state, "Poll").await.map(Self)
    }
}

impl<S> FromRequestParts<S> for CategoryId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_id(parts, state, "Category").await.map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bodies_are_missing() {
        for body in ["", "  \n", "null", "{}", "[]", "false", "0", "0.0", "\"\""] {
            assert!(
                matches!(parse_object(body.as_bytes()), Err(ApiError::MissingBody)),
                "{body:?}"
            );
        }
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            parse_object(b"{\"title\":"),
            Err(ApiError::MalformedBody(_))
        ));
    }

    #[test]
    fn non_objects_fail_validation() {
        assert!(matches!(parse_object(b"[1, 2]"), Err(ApiError::Validation(_))));
        assert!(matches!(parse_object(b"\"poll\""), Err(ApiError::Validation(_))));
        assert!(matches!(parse_object(b"true"), Err(ApiError::Validation(_))));
        assert!(matches!(parse_object(b"3"), Err(ApiError::Validation(_))));
    }

    #[test]
    fn objects_pass_through() {
        let map = parse_object(br#"{"is_active": false}"#).unwrap();
        assert_eq!(map["is_active"], Value::Bool(false));
    }
}
