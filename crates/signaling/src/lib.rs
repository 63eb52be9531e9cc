//! treffpunkt-signaling – WebSocket-Signaling fuer WebRTC-Raeume
//!
//! Dieser Crate vermittelt Offer/Answer-Nachrichten zwischen Browser-Peers
//! und stellt einen Benachrichtigungskanal je Benutzer bereit.
//!
//! ## Architektur
//!
//! ```text
//! WebSocket (axum)
//!     |
//!     +-- hub_sitzung   -> PeerHub      (UserId -> PeerVerbindung)
//!     |
//!     +-- raum_sitzung  -> RoomRegistry (RoomId -> Room)
//!                              |
//!                              +-- Room (UserId -> PeerVerbindung)
//!
//! PeerVerbindung – klonbares Handle, ein Schreiber-Task je Socket
//! ```
//!
//! Persistenz (Raum-Existenz, Peer-Liste) laeuft ueber
//! `treffpunkt_db::RaumRepository`.

pub mod connection;
pub mod error;
pub mod hub;
pub mod metrics;
pub mod protocol;
pub mod room;
pub mod session;
pub mod state;

// Bequeme Re-Exporte
pub use connection::{schreiber_starten, PeerVerbindung};
pub use error::{SignalingError, SignalingResult};
pub use hub::PeerHub;
pub use metrics::{KeineMetriken, SignalingMetriken};
pub use protocol::{AusgehendeNachricht, EingehendeNachricht, HubEreignis, RtcKonfig};
pub use room::{Room, RoomRegistry};
pub use session::{hub_sitzung, raum_sitzung, SitzungsEnde};
pub use state::{SignalingKonfig, SignalingState};
