use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use placehub_common::{AuthError, HubError, StorageError, ValidationError};
use placehub_protocol::ErrorBody;

/// Erro da camada HTTP: status + mensagem no corpo `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        match err {
            HubError::Validation(e) => ApiError::new(StatusCode::BAD_REQUEST, e.to_string()),
            HubError::Protocol(e) => ApiError::new(StatusCode::BAD_REQUEST, e.to_string()),
            HubError::Auth(_) => ApiError::new(StatusCode::UNAUTHORIZED, "no auth"),
            HubError::Storage(StorageError::Closed) => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "server is shutting down")
            }
            other => {
                tracing::error!(error = %other, "erro interno");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        HubError::from(err).into()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        HubError::from(err).into()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        HubError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err: ApiError = ValidationError::MissingPlaceId.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "placeId is required");
    }

    #[test]
    fn auth_maps_to_unauthorized() {
        let err: ApiError = AuthError::TokenMismatch.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn poisoned_store_hides_details() {
        let err: ApiError = StorageError::Poisoned("pending_scripts").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal error");
    }
}
