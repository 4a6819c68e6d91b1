//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del motor de reservas
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Vehicle busy: {0}")]
    VehicleBusy(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Código estable expuesto a los clientes
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::ResourceUnavailable(_) => "NO_VEHICLE_AVAILABLE",
            AppError::VehicleBusy(_) => "VEHICLE_BUSY",
            AppError::Database(_) => "DB_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ResourceUnavailable(_) => StatusCode::NOT_FOUND,
            AppError::VehicleBusy(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let error_response = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "❌ Database error");
                ErrorResponse {
                    error: "Database Error".to_string(),
                    message: "An error occurred while accessing the database".to_string(),
                    details: Some(json!({ "sql_error": e.to_string() })),
                    code,
                }
            }

            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "❌ Internal error");
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "An unexpected error occurred".to_string(),
                    details: Some(json!({ "internal_error": msg })),
                    code,
                }
            }

            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidState(msg)
            | AppError::PermissionDenied(msg)
            | AppError::Unauthorized(msg)
            | AppError::ResourceUnavailable(msg)
            | AppError::VehicleBusy(msg) => {
                tracing::debug!(code, message = %msg, "request rejected");
                ErrorResponse {
                    error: status.canonical_reason().unwrap_or("Error").to_string(),
                    message: msg,
                    details: None,
                    code,
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(message: &str) -> AppError {
    AppError::Validation(message.to_string())
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de transición inválida
pub fn invalid_state_error(message: &str) -> AppError {
    AppError::InvalidState(message.to_string())
}

/// Función helper para crear errores de acceso prohibido
pub fn permission_denied_error(operation: &str, reason: &str) -> AppError {
    AppError::PermissionDenied(format!("Cannot {}: {}", operation, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(not_found_error("Dispatch", "abc").status(), StatusCode::NOT_FOUND);
        assert_eq!(invalid_state_error("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            permission_denied_error("accept", "not your vehicle").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::VehicleBusy("busy".into()).code(),
            "VEHICLE_BUSY"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = not_found_error("Reservation", "42");
        assert_eq!(err.to_string(), "Not found: Reservation with id '42' not found");
    }
}
