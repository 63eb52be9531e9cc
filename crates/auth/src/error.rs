//! Fehlertypen fuer den Auth-Service

use thiserror::Error;

/// Alle moeglichen Fehler im Auth-Service
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    // --- Header ---
    #[error("no credentials supplied")]
    KeineAnmeldedaten,

    // --- Session ---
    #[error("Session nicht gefunden")]
    SessionUngueltig,

    #[error("Session abgelaufen")]
    SessionAbgelaufen,
}

impl AuthError {
    /// Nach aussen sichtbarer Fehlertext
    ///
    /// Unbekannte und abgelaufene Tokens sind fuer den Client nicht
    /// unterscheidbar.
    pub fn oeffentliche_meldung(&self) -> &'static str {
        match self {
            Self::KeineAnmeldedaten => "no credentials supplied",
            Self::SessionUngueltig | Self::SessionAbgelaufen => "unauthorized",
        }
    }
}

/// Result-Alias fuer den Auth-Service
pub type AuthResult<T> = Result<T, AuthError>;
