//! JSON body extractor with structured rejections.
//!
//! axum's `Json<T>` rejects malformed bodies with plain text. `JsonBody<T>`
//! wraps it and reports every rejection as an `INVALID_INPUT` error.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Extractor for JSON request bodies.
///
/// # Example
///
/// ```rust,ignore
/// async fn create_name(JsonBody(payload): JsonBody<PersonPayload>) -> ApiResult<StatusCode> {
///     // payload is a PersonPayload
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`".to_string()
        }
        JsonRejection::JsonSyntaxError(e) => format!("Malformed JSON body: {}", e.body_text()),
        JsonRejection::JsonDataError(e) => format!("Invalid JSON body: {}", e.body_text()),
        other => format!("Failed to read request body: {}", other.body_text()),
    };
    ApiError::invalid_input(message)
}

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;
        Ok(JsonBody(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;

    #[derive(Debug, serde::Deserialize)]
    struct Probe {
        #[allow(dead_code)]
        name: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_input() {
        let req = request(Some("application/json"), "{");
        let err = JsonBody::<Probe>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(err.message.starts_with("Malformed JSON body"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_invalid_input() {
        let req = request(None, r#"{"name":"x"}"#);
        let err = JsonBody::<Probe>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_valid_body_extracts() {
        let req = request(Some("application/json"), r#"{"name":"x"}"#);
        assert!(JsonBody::<Probe>::from_request(req, &()).await.is_ok());
    }
}
