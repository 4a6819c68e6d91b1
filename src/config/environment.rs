//! Configuración de variables de entorno
//!
//! Todas las variables tienen valor por defecto; un número mal formado es
//! un error de configuración.

use std::env;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

use crate::models::GeoPoint;
use crate::services::eta_service::EtaConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },

    #[error("{name} has an invalid value: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Almacén de entidades
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub store: StoreBackend,
    pub notify_webhook_url: Option<String>,
    pub eta: EtaConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 8080,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            store: StoreBackend::Postgres,
            notify_webhook_url: None,
            eta: EtaConfig::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Lee la configuración de las variables de entorno
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let eta_defaults = defaults.eta.clone();
        let eta = EtaConfig {
            reference: GeoPoint::new(
                parse_or(&var, "ETA_REFERENCE_LAT", eta_defaults.reference.lat)?,
                parse_or(&var, "ETA_REFERENCE_LNG", eta_defaults.reference.lng)?,
            ),
            min_speed_kmh: parse_or(&var, "ETA_MIN_SPEED_KMH", eta_defaults.min_speed_kmh)?,
            max_speed_kmh: parse_or(&var, "ETA_MAX_SPEED_KMH", eta_defaults.max_speed_kmh)?,
            min_duration_sec: parse_or(&var, "ETA_MIN_DURATION_SEC", eta_defaults.min_duration_sec)?,
            location_stale_after: Duration::seconds(parse_or(
                &var,
                "LOCATION_STALE_SECS",
                eta_defaults.location_stale_after.num_seconds(),
            )?),
            seed: parse_opt(&var, "ETA_SEED")?,
        };
        // Forma positiva: NaN no cumple ninguna comparación
        let speeds_valid = eta.min_speed_kmh > 0.0
            && eta.max_speed_kmh >= eta.min_speed_kmh
            && eta.max_speed_kmh.is_finite();
        if !speeds_valid {
            return Err(ConfigError::Invalid {
                name: "ETA_MAX_SPEED_KMH",
                value: format!("{}..{}", eta.min_speed_kmh, eta.max_speed_kmh),
            });
        }

        let store = match var("STORE") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "STORE", value })?,
            None => defaults.store,
        };

        Ok(Self {
            environment: var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_or(&var, "PORT", defaults.port)?,
            host: var("HOST").unwrap_or(defaults.host),
            cors_origins: var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            store,
            notify_webhook_url: var("NOTIFY_WEBHOOK_URL"),
            eta,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    parse_opt(var, name).map(|value| value.unwrap_or(default))
}

fn parse_opt<T, F>(var: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<EnvironmentConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvironmentConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.server_url(), "0.0.0.0:8080");
        assert!(cfg.is_development());
        assert_eq!(cfg.store, StoreBackend::Postgres);
        assert_eq!(cfg.eta.min_duration_sec, 60);
        assert_eq!(cfg.eta.reference, GeoPoint::new(14.5547, 121.0244));
        assert!(cfg.eta.seed.is_none());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("PORT", "9000"),
            ("STORE", "memory"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("ETA_SEED", "42"),
            ("ETA_MIN_SPEED_KMH", "10"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(cfg.eta.seed, Some(42));
        assert_eq!(cfg.eta.min_speed_kmh, 10.0);
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "PORT has an invalid value: 'eighty'");

        assert!(config(&[("ETA_MIN_SPEED_KMH", "30")]).is_err());
        assert!(config(&[("STORE", "redis")]).is_err());
    }

    #[test]
    fn test_speed_range_rejects_nan_and_infinity() {
        assert!(config(&[("ETA_MIN_SPEED_KMH", "NaN")]).is_err());
        assert!(config(&[("ETA_MAX_SPEED_KMH", "NaN")]).is_err());
        assert!(config(&[("ETA_MAX_SPEED_KMH", "inf")]).is_err());
        assert!(config(&[("ETA_MIN_SPEED_KMH", "10"), ("ETA_MAX_SPEED_KMH", "10")]).is_ok());
    }
}
