//! Fehlertypen fuer das Signaling

use thiserror::Error;
use treffpunkt_core::UserId;

/// Fehlertyp fuer das Signaling
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Kein Peer unter dieser ID registriert
    #[error("peer not found: {0}")]
    PeerNichtGefunden(UserId),

    /// Senden fehlgeschlagen (Queue voll oder Verbindung geschlossen)
    #[error("Senden fehlgeschlagen")]
    SendFehler,

    /// Nachricht konnte nicht serialisiert werden
    #[error("Serialisierung fehlgeschlagen: {0}")]
    Serialisierung(#[from] serde_json::Error),
}

/// Result-Typ fuer das Signaling
pub type SignalingResult<T> = Result<T, SignalingError>;
