use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::heating_bill::BillingError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Dependency(String),
    #[error("{0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Dependency(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail = %self, "Request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<BillingError> for AppError {
    fn from(error: BillingError) -> Self {
        let message = error.to_string();
        match error {
            BillingError::InvalidDocumentId(_) => AppError::BadRequest(message),
            BillingError::NotFound { .. } => AppError::NotFound(message),
            BillingError::IncompleteData { .. }
            | BillingError::InvalidPeriod { .. }
            | BillingError::NoData { .. } => AppError::UnprocessableEntity(message),
            BillingError::DataSourceUnavailable(_) => AppError::ServiceUnavailable(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::AppError;
    use crate::services::heating_bill::BillingError;

    #[test]
    fn billing_errors_map_to_statuses() {
        let cases = [
            (
                BillingError::InvalidDocumentId("abc".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                BillingError::NotFound {
                    entity: "unit",
                    id: "u1".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                BillingError::incomplete("living_space"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                BillingError::InvalidPeriod {
                    start: "2024-12-31".to_string(),
                    end: "2024-01-01".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                BillingError::DataSourceUnavailable("timeout".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(AppError::from(error).status_code(), status);
        }
    }

    #[test]
    fn keeps_billing_message_as_detail() {
        let error = AppError::from(BillingError::incomplete("end_date"));
        assert_eq!(
            error.to_string(),
            "Incomplete billing data: missing end_date."
        );
    }
}
