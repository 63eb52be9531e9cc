//! treffpunkt-db – Persistenz-Abstraktion
//!
//! Das Repository-Pattern entkoppelt Signaling und HTTP-Schicht von der
//! konkreten Datenbank. Die Standard-Implementierung ist SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use models::{BenutzerRecord, EinladungRecord, RaumRecord};
pub use repository::{
    BenutzerRepository, DatabaseConfig, DbResult, EinladungRepository, RaumRepository,
};
pub use sqlite::SqliteDb;
