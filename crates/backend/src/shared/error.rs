use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::domain::a004_period::PeriodTransitionError;
use serde_json::json;

/// Ошибка слоя сервисов, отображается в HTTP-статус
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(what.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<PeriodTransitionError> for ServiceError {
    fn from(e: PeriodTransitionError) -> Self {
        match e {
            PeriodTransitionError::NotFound(id) => ServiceError::NotFound(format!("Period {}", id)),
            other => ServiceError::Conflict(other.to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        // Детали ошибок БД наружу не отдаются
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a004_period::PeriodStatus;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceError::not_found("KPI x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServiceError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_period_errors_map_to_conflict() {
        let err: ServiceError = PeriodTransitionError::NotAllowed {
            from: PeriodStatus::Closed,
            to: PeriodStatus::Active,
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ServiceError = PeriodTransitionError::NotFound("p".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_into_response_status() {
        let response = ServiceError::Forbidden("role staff".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
