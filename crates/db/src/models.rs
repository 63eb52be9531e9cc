//! Datenbankmodelle fuer Treffpunkt
//!
//! Reine Datenuebertragungsobjekte; die JSON-Feldnamen folgen dem
//! bestehenden Browser-Client (`userID`, `roomID`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use treffpunkt_core::{RoomId, UserId};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub name: String,
    #[serde(rename = "secretKey")]
    pub secret_key: String,
    pub created: DateTime<Utc>,
    #[serde(rename = "lastTime", skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Oeffentliche Sicht auf einen Benutzer (ohne Secret)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OeffentlicherBenutzer {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub name: String,
    pub created: DateTime<Utc>,
    #[serde(rename = "lastTime", skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<BenutzerRecord> for OeffentlicherBenutzer {
    fn from(b: BenutzerRecord) -> Self {
        Self {
            user_id: b.user_id,
            name: b.name,
            created: b.created,
            last_login_at: b.last_login_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Raeume
// ---------------------------------------------------------------------------

/// Raum-Datensatz inklusive persistierter Peer-Menge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaumRecord {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
    pub name: String,
    pub owner: UserId,
    pub peers: Vec<UserId>,
    pub created: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Einladungen
// ---------------------------------------------------------------------------

/// Einladung eines Benutzers in einen Raum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EinladungRecord {
    pub id: Uuid,
    pub from: UserId,
    pub to: UserId,
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
    pub created: DateTime<Utc>,
}
