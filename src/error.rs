use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, warn};

/// Failure taxonomy raised by services and mapped to HTTP at the boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("You do not have permission to perform this action.")]
    Forbidden,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "Not Found",
            ApiError::Validation(_) => "Bad Request",
            ApiError::Unauthorized => "Unauthorized",
            ApiError::Forbidden => "Forbidden",
            ApiError::Internal(_) => "Internal Server Error",
        }
    }
}

/// Wire shape of every non-2xx, non-401 response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Bad credentials reveal nothing, not even a body.
        if matches!(self, ApiError::Unauthorized) {
            warn!("unauthorized request rejected");
            return StatusCode::UNAUTHORIZED.into_response();
        }

        let status = self.status();
        match &self {
            ApiError::Internal(e) => error!(error = %e, "unexpected error"),
            other => warn!(status = %status, message = %other, "request failed"),
        }

        let body = ErrorBody {
            timestamp: OffsetDateTime::now_utc(),
            status: status.as_u16(),
            error: self.reason().to_string(),
            message: self.to_string(),
            path: String::new(),
        };

        let mut res = (status, Json(body.clone())).into_response();
        // The path is only known to the middleware below; stash the body so it
        // can be rewritten with the request URI filled in.
        res.extensions_mut().insert(body);
        res
    }
}

/// Completes error bodies with the request path before they leave the server.
pub async fn attach_request_path(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut res = next.run(req).await;

    if let Some(mut body) = res.extensions_mut().remove::<ErrorBody>() {
        let status = res.status();
        body.path = path;
        return (status, Json(body)).into_response();
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, middleware, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(
            ApiError::NotFound("Movie not found: x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Validation("title must not be blank".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    fn test_app() -> Router {
        Router::new()
            .route(
                "/missing",
                get(|| async { Err::<(), _>(ApiError::NotFound("Movie not found: 42".into())) }),
            )
            .route(
                "/locked",
                get(|| async { Err::<(), _>(ApiError::Unauthorized) }),
            )
            .route(
                "/denied",
                get(|| async { Err::<(), _>(ApiError::Forbidden) }),
            )
            .layer(middleware::from_fn(attach_request_path))
    }

    fn get_request(uri: &str) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(axum::body::Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn error_body_carries_request_path() {
        let res = test_app()
            .oneshot(get_request("/missing"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], 404);
        assert_eq!(json["error"], "Not Found");
        assert_eq!(json["message"], "Movie not found: 42");
        assert_eq!(json["path"], "/missing");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unauthorized_has_empty_body() {
        let res = test_app()
            .oneshot(get_request("/locked"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn forbidden_message_is_generic() {
        let res = test_app()
            .oneshot(get_request("/denied"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let bytes = to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json["message"],
            "You do not have permission to perform this action."
        );
    }
}
