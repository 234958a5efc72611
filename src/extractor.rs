//! Caller identity for tenant-scoped routes.
//!
//! Authentication happens upstream; the gateway forwards the signed-in
//! professional's id in the `x-user-id` header.

use axum::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The professional a request acts for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Professional {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for Professional
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing user id".to_string()))?;
        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| AppError::Unauthorized("Invalid user id".to_string()))?;
        Ok(Professional { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder();
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        builder.body(axum::body::Body::empty()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_user_id_parsed_from_header() {
        let id = Uuid::from_u128(42);
        let mut parts = parts(Some(&id.to_string()));
        let caller = Professional::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(caller.user_id, id);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let mut parts = parts(None);
        let err = Professional::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_malformed_header_is_unauthorized() {
        let mut parts = parts(Some("not-a-uuid"));
        let err = Professional::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
