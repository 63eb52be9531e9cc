//! Fehlertypen fuer Treffpunkt
//!
//! Untermodule definieren eigene Fehler; hier liegen nur die Fehler der
//! gemeinsamen Typen.

use thiserror::Error;

/// Globaler Result-Alias fuer Treffpunkt
pub type Result<T> = std::result::Result<T, TreffpunktError>;

/// Fehler der gemeinsamen Typen
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreffpunktError {
    #[error("Ungueltige ID: {0}")]
    UngueltigeId(String),
}

impl TreffpunktError {
    /// Erstellt einen ID-Fehler aus einer beliebigen Nachricht
    pub fn ungueltige_id(msg: impl Into<String>) -> Self {
        Self::UngueltigeId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = TreffpunktError::ungueltige_id("leer");
        assert_eq!(e.to_string(), "Ungueltige ID: leer");
    }
}
