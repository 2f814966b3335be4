//! Error types for the signing API

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sigstamp_core::{PersistenceError, SignError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required fields: pdfId, fields, signatureImageBase64 ({0})")]
    MissingInput(String),

    #[error("Invalid request body: {message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("PDF not found: {0}")]
    PdfNotFound(String),

    #[error("Invalid image format. Only PNG and JPG are supported. ({0})")]
    UnsupportedAsset(String),

    #[error("{0}")]
    NothingToSign(String),

    #[error("Audit log not found: {0}")]
    AuditNotFound(String),

    #[error("Audit logging is unavailable")]
    AuditUnavailable,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SignError> for ApiError {
    fn from(err: SignError) -> Self {
        match err {
            SignError::MissingInput(what) => ApiError::MissingInput(what.to_string()),
            SignError::DocumentNotFound(id) => ApiError::PdfNotFound(id),
            SignError::UnsupportedAssetFormat(detail) => ApiError::UnsupportedAsset(detail),
            e @ (SignError::Geometry { .. } | SignError::PageOutOfRange { .. }) => {
                ApiError::NothingToSign(e.to_string())
            }
            e @ (SignError::Source(_) | SignError::CompositingFailed(_)) => {
                ApiError::Signing(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // oversized bodies keep their 413, everything else is the client's 400
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::InvalidBody {
            status,
            message: rejection.body_text(),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Unavailable => ApiError::AuditUnavailable,
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingInput(_) | ApiError::UnsupportedAsset(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody { status, .. } => *status,
            ApiError::PdfNotFound(_) | ApiError::AuditNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NothingToSign(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::AuditUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Signing(_) | ApiError::Io(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            ApiError::Signing(e) => {
                tracing::error!("Error signing PDF: {}", e);
                "Internal server error while signing PDF".to_string()
            }
            ApiError::Io(e) => {
                tracing::error!("Storage error: {}", e);
                "Internal server error".to_string()
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigstamp_core::{EngineError, GeometryError};

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn sign_errors_map_to_statuses() {
        assert_eq!(
            status_of(SignError::MissingInput("asset").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(SignError::DocumentNotFound("x".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(SignError::UnsupportedAssetFormat("gif".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                SignError::Geometry {
                    field_id: "f".into(),
                    source: GeometryError::EmptyBox {
                        width: 0.0,
                        height: 1.0
                    },
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(SignError::CompositingFailed(EngineError::Save("x".into())).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unavailable_store_is_503() {
        assert_eq!(
            status_of(PersistenceError::Unavailable.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
