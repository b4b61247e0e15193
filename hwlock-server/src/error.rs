//! Mapping of license errors onto HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hwlock_license::api::{ActionResponse, ClientErrorResponse};
use hwlock_license::LicenseError;
use tracing::error;

/// Error returned by admin handlers.
#[derive(Debug)]
pub struct ApiError(pub LicenseError);

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(LicenseError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            LicenseError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, r#"Basic realm="hwlock admin""#)],
                Json(ActionResponse::failed("Unauthorized")),
            )
                .into_response(),
            LicenseError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(ActionResponse::failed(msg))).into_response()
            }
            LicenseError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(ActionResponse::failed("license not found")),
            )
                .into_response(),
            other => {
                error!("admin request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ActionResponse::failed("internal error")),
                )
                    .into_response()
            }
        }
    }
}

/// Error returned by the client verify/activate handlers. Keeps the
/// `{status, message}` shape clients parse.
#[derive(Debug)]
pub struct ClientError(pub LicenseError);

impl From<LicenseError> for ClientError {
    fn from(err: LicenseError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ClientError {
    fn from(rejection: JsonRejection) -> Self {
        Self(LicenseError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            LicenseError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ClientErrorResponse {
                    status: "invalid_request".into(),
                    message,
                },
            ),
            other => {
                error!("client request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ClientErrorResponse {
                        status: "error".into(),
                        message: "internal error".into(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
