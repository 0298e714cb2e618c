use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::db::StoreError;
use crate::reconcile::services::ReconcileError;
use crate::tenants::schema::SchemaError;

/// Errors returned by HTTP handlers, translated into a status and a JSON body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SchemaError> for AppError {
    fn from(e: SchemaError) -> Self {
        match e {
            SchemaError::Malformed(_) => AppError::BadRequest(e.to_string()),
            SchemaError::Unknown(_) => AppError::NotFound(e.to_string()),
        }
    }
}

/// Postgres SQLSTATE to HTTP status.
pub fn status_for_sqlstate(code: &str) -> StatusCode {
    match code {
        "23505" => StatusCode::CONFLICT,
        "23502" | "23503" | "22P02" => StatusCode::BAD_REQUEST,
        "3F000" | "42P01" => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn status_for_store(e: &StoreError) -> StatusCode {
    match e {
        StoreError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
        StoreError::Database(_) => e
            .sqlstate()
            .map(|code| status_for_sqlstate(&code))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        StoreError::Schema(SchemaError::Malformed(_)) => StatusCode::BAD_REQUEST,
        StoreError::Schema(SchemaError::Unknown(_)) => StatusCode::NOT_FOUND,
        StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Reconcile(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(e) => status_for_store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // server-side details stay in the log
        let message = if status.is_server_error() {
            error!(error = %self, %status, "request failed");
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            warn!(error = %self, %status, "request rejected");
            self.to_string()
        };
        (
            status,
            Json(json!({ "error": message, "code": status.as_u16() })),
        )
            .into_response()
    }
}
