//! JSON body extractors whose rejections use the API error bodies.
//!
//! `axum::Json` answers a bad body with 400/415/422 and plain text. Clients
//! of this service expect JSON errors, so malformed bodies become a
//! validation failure instead.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;

use crate::domain::subscription::SubscriptionError;

use super::error::{ApiError, VerificationError};

/// `Json<T>` that rejects with [`ApiError`]: `{ "error", "code" }`, 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

/// `Json<T>` that rejects with [`VerificationError`]: `{ "valid": false, "error" }`, 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(body_error(&rejection).into()),
        }
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for VerifyJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = VerificationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(body_error(&rejection).into()),
        }
    }
}

fn body_error(rejection: &JsonRejection) -> SubscriptionError {
    tracing::debug!(error = %rejection.body_text(), "rejected request body");
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
        JsonRejection::JsonSyntaxError(_) => "Malformed JSON body",
        JsonRejection::JsonDataError(_) => "Invalid request body",
        _ => "Could not read request body",
    };
    SubscriptionError::validation("body", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        license_key: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let req = request(Some("application/json"), r#"{"license_key":"LKRP-AAAA-BBBB-CCCC"}"#);

        let ApiJson(payload) = ApiJson::<Payload>::from_request(req, &()).await.unwrap();

        assert_eq!(payload.license_key, "LKRP-AAAA-BBBB-CCCC");
    }

    #[tokio::test]
    async fn syntax_error_is_a_json_400() {
        let req = request(Some("application/json"), r#"{"license_key": 42"#);

        let err = ApiJson::<Payload>::from_request(req, &()).await.unwrap_err();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Malformed JSON body");
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn missing_content_type_is_a_json_400() {
        let req = request(None, r#"{"license_key":"x"}"#);

        let err = ApiJson::<Payload>::from_request(req, &()).await.unwrap_err();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Expected a JSON request body");
    }

    #[tokio::test]
    async fn verification_body_errors_use_valid_false() {
        let req = request(Some("application/json"), r#"{"license_key": 42}"#);

        let err = VerifyJson::<Payload>::from_request(req, &()).await.unwrap_err();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["error"], "Invalid request body");
    }
}
