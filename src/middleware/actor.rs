//! Identidad del llamante
//!
//! La autenticación la hace la capa anterior (gateway); aquí sólo se leen
//! las cabeceras que deja: `x-actor-id` (obligatoria) y
//! `x-actor-priority` (opcional, 0 por defecto).

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::utils::errors::AppError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_PRIORITY_HEADER: &str = "x-actor-priority";

/// Usuario que origina la request
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub priority_level: i32,
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", ACTOR_ID_HEADER)))?;
        let id = Uuid::parse_str(id.trim())
            .map_err(|_| AppError::Unauthorized(format!("invalid {} header", ACTOR_ID_HEADER)))?;

        let priority_level = match parts.headers.get(ACTOR_PRIORITY_HEADER) {
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .ok_or_else(|| {
                    AppError::Validation(format!("{} must be an integer", ACTOR_PRIORITY_HEADER))
                })?,
            None => 0,
        };

        Ok(Actor { id, priority_level })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(builder: axum::http::request::Builder) -> Result<Actor, AppError> {
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Actor::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_headers() {
        let id = Uuid::new_v4();
        let actor = extract(
            Request::builder()
                .header(ACTOR_ID_HEADER, id.to_string())
                .header(ACTOR_PRIORITY_HEADER, "7"),
        )
        .await
        .unwrap();
        assert_eq!(actor.id, id);
        assert_eq!(actor.priority_level, 7);
    }

    #[tokio::test]
    async fn test_priority_defaults_to_zero() {
        let actor = extract(Request::builder().header(ACTOR_ID_HEADER, Uuid::new_v4().to_string()))
            .await
            .unwrap();
        assert_eq!(actor.priority_level, 0);
    }

    #[tokio::test]
    async fn test_missing_or_bad_headers() {
        let err = extract(Request::builder()).await.unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");

        let err = extract(
            Request::builder()
                .header(ACTOR_ID_HEADER, Uuid::new_v4().to_string())
                .header(ACTOR_PRIORITY_HEADER, "high"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
