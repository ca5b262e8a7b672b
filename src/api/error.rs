//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crate::authorization::AccessError;
use crate::core_state::CoreError;
use crate::crypto::TokenError;
use crate::pipeline::InstructionError;
use crate::records::RecordError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid token")]
    TokenInvalid,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid session")]
    InvalidSession,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Instruction generation failed")]
    GenerationFailed,
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid token".to_string(),
            ),
            ApiError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Token expired, re-authenticate".to_string(),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            ApiError::InvalidSession => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Invalid session".to_string(),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail.clone()),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::EmailTaken => (
                StatusCode::BAD_REQUEST,
                "EMAIL_TAKEN",
                "Email already registered".to_string(),
            ),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::GenerationFailed => (
                StatusCode::BAD_GATEWAY,
                "GENERATION_FAILED",
                "Erro ao gerar orientações. Tente novamente.".to_string(),
            ),
            ApiError::UpstreamFailure(detail) => {
                tracing::warn!(detail, "Upstream service failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_FAILURE",
                    "Identity provider unavailable".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<crate::db::DatabaseError> for ApiError {
    fn from(err: crate::db::DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {err}"))
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => ApiError::TokenInvalid,
            TokenError::Expired => ApiError::TokenExpired,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput(msg) => ApiError::BadRequest(msg),
            AuthError::EmailTaken => ApiError::EmailTaken,
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Token(e) => e.into(),
            AuthError::UnknownUser => ApiError::Unauthorized,
            AuthError::SessionRejected => ApiError::InvalidSession,
            AuthError::IdentityUnavailable(msg) => ApiError::UpstreamFailure(msg),
            AuthError::Database(e) => e.into(),
            AuthError::Crypto(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Forbidden(msg) => ApiError::Forbidden(msg.to_string()),
            AccessError::Database(e) => e.into(),
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NotFound { entity, .. } => ApiError::NotFound(format!("{entity} not found")),
            RecordError::InvalidInput(msg) => ApiError::BadRequest(msg),
            RecordError::Access(e) => e.into(),
            RecordError::Database(e) => e.into(),
        }
    }
}

impl From<InstructionError> for ApiError {
    fn from(err: InstructionError) -> Self {
        match err {
            InstructionError::NotFound { entity, .. } => {
                ApiError::NotFound(format!("{entity} not found"))
            }
            InstructionError::Access(e) => e.into(),
            InstructionError::Generation(_) => ApiError::GenerationFailed,
            InstructionError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn token_errors_map_to_distinct_codes() {
        let expired: ApiError = TokenError::Expired.into();
        let response = expired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "TOKEN_EXPIRED");

        let invalid: ApiError = TokenError::Invalid.into();
        assert_eq!(
            body_json(invalid.into_response()).await["error"]["code"],
            "TOKEN_INVALID"
        );
    }

    #[tokio::test]
    async fn email_taken_returns_400() {
        let api_err: ApiError = AuthError::EmailTaken.into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn forbidden_returns_403() {
        let api_err: ApiError = AccessError::Forbidden("Staff access required").into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert_eq!(json["error"]["message"], "Staff access required");
    }

    #[tokio::test]
    async fn record_not_found_returns_404_without_id() {
        let api_err: ApiError = RecordError::not_found("Appointment", "apt_1").into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Appointment not found"
        );
    }

    #[tokio::test]
    async fn generation_failure_returns_502() {
        let api_err: ApiError =
            InstructionError::Generation(crate::pipeline::GenerationError::EmptyResponse).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "GENERATION_FAILED"
        );
    }

    #[tokio::test]
    async fn upstream_failure_returns_502() {
        let api_err: ApiError = AuthError::IdentityUnavailable("timeout".into()).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"]["code"], "UPSTREAM_FAILURE");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let response = ApiError::Internal("something broke".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "An internal error occurred"
        );
    }
}
