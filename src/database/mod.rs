//! Conexión a PostgreSQL y migraciones del schema de reservas

pub mod connection;

pub use connection::DatabaseConnection;
