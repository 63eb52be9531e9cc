//! Gemeinsame Identifikationstypen fuer Treffpunkt
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Benutzer- und Raum-IDs zur Compilezeit auszuschliessen. Beide sind
//! opake Strings: Benutzer-IDs sind SHA-256-Hex-Werte, Raum-IDs UUIDs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TreffpunktError};

/// Maximale Laenge einer ID in Bytes
const MAX_ID_LAENGE: usize = 128;

fn id_pruefen(wert: &str) -> Result<()> {
    if wert.is_empty() {
        return Err(TreffpunktError::ungueltige_id("ID darf nicht leer sein"));
    }
    if wert.len() > MAX_ID_LAENGE {
        return Err(TreffpunktError::ungueltige_id(format!(
            "ID laenger als {MAX_ID_LAENGE} Bytes"
        )));
    }
    if wert.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(TreffpunktError::ungueltige_id(
            "ID enthaelt Leer- oder Steuerzeichen",
        ));
    }
    Ok(())
}

/// Eindeutige Benutzer-ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Uebernimmt einen bereits vertrauenswuerdigen Wert (z.B. aus der Datenbank)
    pub fn neu(wert: impl Into<String>) -> Self {
        Self(wert.into())
    }

    /// Prueft einen vom Client gelieferten Wert
    pub fn parsen(wert: &str) -> Result<Self> {
        id_pruefen(wert)?;
        Ok(Self(wert.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Eindeutige Raum-ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Erstellt eine neue zufaellige RoomId
    pub fn generieren() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Uebernimmt einen bereits vertrauenswuerdigen Wert
    pub fn neu(wert: impl Into<String>) -> Self {
        Self(wert.into())
    }

    /// Prueft einen vom Client gelieferten Wert
    pub fn parsen(wert: &str) -> Result<Self> {
        id_pruefen(wert)?;
        Ok(Self(wert.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_id_eindeutig() {
        let a = RoomId::generieren();
        let b = RoomId::generieren();
        assert_ne!(a, b, "Zwei neue RoomIds muessen verschieden sein");
    }

    #[test]
    fn user_id_parsen_lehnt_leere_werte_ab() {
        assert!(UserId::parsen("").is_err());
        assert!(UserId::parsen("mit leerzeichen").is_err());
        assert!(UserId::parsen(&"a".repeat(129)).is_err());
        assert_eq!(UserId::parsen("abc123").unwrap().as_str(), "abc123");
    }

    #[test]
    fn ids_serialisieren_als_string() {
        let uid = UserId::neu("deadbeef");
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, "\"deadbeef\"");
        let uid2: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(uid, uid2);
    }
}
