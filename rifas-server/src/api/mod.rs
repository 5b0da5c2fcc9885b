//! HTTP API of the rifas server.
//!
//! - `/administrador/...` – administrator API, bearer token required
//! - `/publico/...` – read-only public API, no authentication
//!
//! Every non-2xx response carries an [`ErrorBody`].

pub mod admin;
pub mod extractors;
pub mod public;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rifas_core::store::StoreError;
use rifas_core::{ErrorKind, RaffleError};
use rifas_sdk::objects::{ErrorBody, ErrorCategory};

/// Errors returned by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Raffle(#[from] RaffleError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Raffle(err.into())
    }
}

impl ApiError {
    fn category(&self) -> (StatusCode, ErrorCategory) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorCategory::InvalidArgument),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, ErrorCategory::Unauthorized),
            ApiError::Raffle(err) => match err.kind() {
                ErrorKind::InvalidArgument => {
                    (StatusCode::BAD_REQUEST, ErrorCategory::InvalidArgument)
                }
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, ErrorCategory::NotFound),
                ErrorKind::Conflict => (StatusCode::CONFLICT, ErrorCategory::Conflict),
                ErrorKind::AllPrizesDrawn => (StatusCode::CONFLICT, ErrorCategory::AllPrizesDrawn),
                ErrorKind::Storage => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCategory::StorageError,
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.category();
        let message = if error == ErrorCategory::StorageError {
            tracing::error!("Storage error: {}", self);
            "internal storage error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rifas_core::Resource;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(RaffleError::invalid("bad").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RaffleError::NotFound(Resource::Raffle).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RaffleError::AlreadyDrawn { raffle_id: 1 }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                RaffleError::AllPrizesDrawn {
                    raffle_id: 1,
                    prize_count: 2
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RaffleError::Storage(StoreError::Poisoned).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ApiError::Unauthorized("missing token")),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_all_prizes_drawn_has_its_own_category() {
        let err: ApiError = RaffleError::AllPrizesDrawn {
            raffle_id: 1,
            prize_count: 2,
        }
        .into();
        assert_eq!(err.category().1, ErrorCategory::AllPrizesDrawn);
    }
}
