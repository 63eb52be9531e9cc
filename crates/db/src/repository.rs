//! Repository-Trait-Definitionen
//!
//! Die Traits verwenden `async_trait`, damit die Futures `Send` sind und
//! aus Axum-Handlern und Verbindungs-Tasks heraus aufgerufen werden koennen.

use async_trait::async_trait;
use treffpunkt_core::{RoomId, UserId};

use crate::error::DbError;
use crate::models::{BenutzerRecord, EinladungRecord, RaumRecord};

/// Result-Alias fuer Repository-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://treffpunkt.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://treffpunkt.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer Benutzer
#[async_trait]
pub trait BenutzerRepository: Send + Sync {
    /// Legt einen Benutzer an und erzeugt `user_id` und `secret_key`
    async fn erstellen(&self, name: &str) -> DbResult<BenutzerRecord>;

    async fn laden(&self, user_id: &UserId) -> DbResult<Option<BenutzerRecord>>;

    /// Sucht den Benutzer zu einem Login-Secret
    async fn laden_nach_secret(&self, secret_key: &str) -> DbResult<Option<BenutzerRecord>>;

    async fn existiert(&self, user_id: &UserId) -> DbResult<bool>;

    /// Setzt den Zeitpunkt des letzten Logins auf jetzt
    async fn login_vermerken(&self, user_id: &UserId) -> DbResult<()>;
}

/// Repository fuer Raeume und deren persistierte Peer-Menge
#[async_trait]
pub trait RaumRepository: Send + Sync {
    async fn erstellen(&self, name: &str, owner: &UserId) -> DbResult<RaumRecord>;

    async fn laden(&self, room_id: &RoomId) -> DbResult<Option<RaumRecord>>;

    async fn alle(&self) -> DbResult<Vec<RaumRecord>>;

    /// Prueft ob der Raum existiert und fuegt den Benutzer idempotent hinzu
    ///
    /// Gibt `false` zurueck wenn der Raum nicht existiert.
    async fn peer_hinzufuegen(&self, room_id: &RoomId, user_id: &UserId) -> DbResult<bool>;

    /// Entfernt den Benutzer aus der Peer-Menge (kein Fehler wenn nicht enthalten)
    async fn peer_entfernen(&self, room_id: &RoomId, user_id: &UserId) -> DbResult<()>;
}

/// Repository fuer Einladungen
#[async_trait]
pub trait EinladungRepository: Send + Sync {
    /// Speichert eine Einladung; `DbError::NichtGefunden` wenn Empfaenger oder Raum fehlen
    async fn erstellen(
        &self,
        from: &UserId,
        to: &UserId,
        room_id: &RoomId,
    ) -> DbResult<EinladungRecord>;

    /// Alle Einladungen an einen Benutzer, neueste zuerst
    async fn fuer_benutzer(&self, to: &UserId) -> DbResult<Vec<EinladungRecord>>;
}
