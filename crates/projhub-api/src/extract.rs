//! Request extraction with validation

use crate::error::AppError;
use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has been deserialized and passed its `validator` rules.
///
/// Malformed JSON, a wrong content type, unknown or missing fields and
/// failed validation all become `400 VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(Self(value))
    }
}

/// Path parameters whose parse failures become `400 VALIDATION_ERROR`
/// instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| AppError::Validation(rejection.body_text()))?;

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(deny_unknown_fields)]
    struct Payload {
        #[validate(length(min = 1))]
        name: String,
    }

    async fn echo(ValidatedJson(payload): ValidatedJson<Payload>) -> impl IntoResponse {
        payload.name
    }

    async fn send(body: &str, content_type: &str) -> StatusCode {
        let app = Router::new().route("/", post(echo));
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/")
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_valid_body_is_accepted() {
        assert_eq!(send(r#"{"name": "x"}"#, "application/json").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejections_become_bad_request() {
        assert_eq!(send(r#"{"name": ""}"#, "application/json").await, StatusCode::BAD_REQUEST);
        assert_eq!(
            send(r#"{"name": "x", "extra": 1}"#, "application/json").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(send(r#"{}"#, "application/json").await, StatusCode::BAD_REQUEST);
        assert_eq!(send("not json", "application/json").await, StatusCode::BAD_REQUEST);
        assert_eq!(send(r#"{"name": "x"}"#, "text/plain").await, StatusCode::BAD_REQUEST);
    }

    async fn item(ValidatedPath(id): ValidatedPath<i64>) -> String {
        id.to_string()
    }

    #[tokio::test]
    async fn test_path_parse_failure_is_json_validation_error() {
        let app = Router::new().route("/items/:id", get(item));

        let ok = app
            .clone()
            .oneshot(HttpRequest::builder().uri("/items/7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let response = app
            .oneshot(HttpRequest::builder().uri("/items/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }
}
