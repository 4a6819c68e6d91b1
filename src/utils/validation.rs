//! Utilidades de validación
//!
//! Funciones helper para validar ventanas de tiempo, campos obligatorios
//! y coordenadas antes de tocar el almacén de entidades.

use chrono::{DateTime, Utc};
use validator::ValidationError;

use crate::utils::errors::{validation_error, AppResult};

/// Validar que una ventana `[start, end)` no esté vacía ni invertida
pub fn validate_time_window(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end <= start {
        return Err(validation_error("end_time must be after start_time"));
    }
    Ok(())
}

/// Validar que el inicio no esté en el pasado
pub fn validate_not_in_past(start: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<()> {
    if start < now {
        return Err(validation_error("cannot create reservation in the past"));
    }
    Ok(())
}

/// Validar que un campo obligatorio no esté vacío
pub fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(validation_error(&format!("{} is required", field)));
    }
    Ok(())
}

/// Validador custom para DTOs: string no vacío tras trim
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_time_window() {
        let now = Utc::now();
        assert!(validate_time_window(now, now + Duration::minutes(1)).is_ok());
        assert!(validate_time_window(now, now).is_err());
        assert!(validate_time_window(now, now - Duration::minutes(1)).is_err());
    }

    #[test]
    fn test_not_in_past() {
        let now = Utc::now();
        assert!(validate_not_in_past(now, now).is_ok());
        assert!(validate_not_in_past(now - Duration::seconds(1), now).is_err());
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("reason", "   ").is_err());
        assert!(require_non_empty("reason", "vip").is_ok());
        assert!(validate_not_blank("").is_err());
    }
}
