//! Signaling-Protokoll – Nachrichtentypen fuer Hub und Raum
//!
//! Eingehende Raum-Nachrichten werden nur soweit gelesen, wie es fuer das
//! Routing noetig ist (`event`, `peerID`, `requester`). Der eigentliche
//! SDP-Inhalt wird nie interpretiert; weitergeleitet wird der empfangene Text.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use treffpunkt_core::UserId;

/// Standard-STUN-Server
pub const STANDARD_ICE_SERVER: &str = "stun:stun.l.google.com:19302";

// ---------------------------------------------------------------------------
// RTC-Konfiguration
// ---------------------------------------------------------------------------

/// Ein Eintrag in `iceServers` (Form von `RTCIceServer`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub urls: Vec<String>,
}

/// WebRTC-Konfiguration, die an Clients weitergegeben wird
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtcKonfig {
    #[serde(rename = "iceServers")]
    pub ice_servers: Vec<IceServer>,
}

impl RtcKonfig {
    /// Eine Konfiguration mit genau einem ICE-Server-Eintrag fuer alle URLs
    pub fn aus_urls(urls: Vec<String>) -> Self {
        if urls.is_empty() {
            return Self {
                ice_servers: Vec::new(),
            };
        }
        Self {
            ice_servers: vec![IceServer { urls }],
        }
    }
}

impl Default for RtcKonfig {
    fn default() -> Self {
        Self::aus_urls(vec![STANDARD_ICE_SERVER.to_string()])
    }
}

// ---------------------------------------------------------------------------
// Raum-Protokoll
// ---------------------------------------------------------------------------

/// Vom Client empfangene Raum-Nachricht
///
/// Fehlende Ziel-Felder sind `None`; die Nachricht wird dann verworfen.
/// Unbekannte Events und ungueltiges JSON landen in `Unbekannt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EingehendeNachricht {
    Offer {
        #[serde(rename = "peerID", default)]
        peer_id: Option<UserId>,
    },
    Answer {
        #[serde(default)]
        requester: Option<UserId>,
    },
    #[serde(other)]
    Unbekannt,
}

impl EingehendeNachricht {
    pub fn parsen(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or(Self::Unbekannt)
    }

    /// Event-Name fuer Logs
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Unbekannt => "unbekannt",
        }
    }

    /// Peer, an den die Nachricht weitergeleitet werden soll
    pub fn ziel(&self) -> Option<&UserId> {
        match self {
            Self::Offer { peer_id } => peer_id.as_ref(),
            Self::Answer { requester } => requester.as_ref(),
            Self::Unbekannt => None,
        }
    }
}

/// Vom Server erzeugte Raum-Nachricht
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AusgehendeNachricht {
    /// Fordert den Neuankoemmling auf, ein Offer an `peer_id` zu erstellen
    CreateOffer {
        requester: UserId,
        #[serde(rename = "peerID")]
        peer_id: UserId,
        config: RtcKonfig,
    },
}

// ---------------------------------------------------------------------------
// Hub-Protokoll
// ---------------------------------------------------------------------------

/// Umschlag fuer Hub-Zustellungen: `{ "event": .., "message": .. }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEreignis {
    pub event: String,
    pub message: Value,
}

impl HubEreignis {
    pub fn neu(event: impl Into<String>, message: Value) -> Self {
        Self {
            event: event.into(),
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
