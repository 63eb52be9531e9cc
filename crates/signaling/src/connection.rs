//! Peer-Verbindung – Handle auf eine lebende WebSocket-Verbindung
//!
//! Eine Verbindung wird von mehreren Stellen gleichzeitig referenziert
//! (Peer-Hub, Raum, eigene Lese-Schleife). Geschrieben wird trotzdem nur
//! von genau einem Task: dem Schreiber, der die Send-Queue leert.
//!
//! ```text
//! Hub::senden_an ─┐
//! Raum-Relay ─────┼──> mpsc (begrenzt) ──> Schreiber-Task ──> WebSocket-Sink
//! Lese-Schleife ──┘
//! ```
//!
//! Endet der Schreiber (Transportfehler, Close-Frame, Abbruch), wird das
//! Verbindungs-Token abgebrochen; die Lese-Schleife beendet sich darueber.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::{CloseFrame, Message};
use futures_util::{Sink, SinkExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use treffpunkt_core::UserId;

use crate::error::{SignalingError, SignalingResult};

/// Close-Code: normales Ende
pub const CLOSE_NORMAL: u16 = 1000;
/// Close-Code: Server faehrt herunter
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// Close-Code: interner Fehler (z.B. Raum existiert nicht)
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

static NAECHSTE_VERBINDUNGS_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// PeerVerbindung
// ---------------------------------------------------------------------------

/// Klonbares Handle auf die Send-Queue einer Verbindung
#[derive(Clone)]
pub struct PeerVerbindung {
    verbindungs_id: u64,
    user_id: UserId,
    tx: mpsc::Sender<Message>,
    token: CancellationToken,
}

impl fmt::Debug for PeerVerbindung {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerVerbindung")
            .field("verbindungs_id", &self.verbindungs_id)
            .field("user_id", &self.user_id)
            .field("geschlossen", &self.ist_geschlossen())
            .finish()
    }
}

impl PeerVerbindung {
    /// Erstellt ein neues Handle und die Empfangsseite fuer den Schreiber
    pub fn neu(user_id: UserId, queue_groesse: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(queue_groesse.max(1));
        let verbindung = Self {
            verbindungs_id: NAECHSTE_VERBINDUNGS_ID.fetch_add(1, Ordering::Relaxed),
            user_id,
            tx,
            token: CancellationToken::new(),
        };
        (verbindung, rx)
    }

    /// Prozessweit eindeutige ID dieser Verbindung
    pub fn verbindungs_id(&self) -> u64 {
        self.verbindungs_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Token, das beim Ende der Verbindung abgebrochen wird
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn ist_geschlossen(&self) -> bool {
        self.token.is_cancelled() || self.tx.is_closed()
    }

    /// Reiht eine Nachricht nicht-blockierend ein
    pub fn senden(&self, nachricht: Message) -> SignalingResult<()> {
        if self.token.is_cancelled() {
            return Err(SignalingError::SendFehler);
        }
        match self.tx.try_send(nachricht) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    verbindung = self.verbindungs_id,
                    "Send-Queue voll, Nachricht verworfen"
                );
                Err(SignalingError::SendFehler)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    user_id = %self.user_id,
                    verbindung = self.verbindungs_id,
                    "Send-Queue geschlossen"
                );
                Err(SignalingError::SendFehler)
            }
        }
    }

    /// Reiht einen Text-Frame ein
    pub fn text_senden(&self, text: impl Into<String>) -> SignalingResult<()> {
        self.senden(Message::Text(text.into()))
    }

    /// Serialisiert `wert` als JSON und reiht ihn als Text-Frame ein
    pub fn json_senden<T: Serialize>(&self, wert: &T) -> SignalingResult<()> {
        let text = serde_json::to_string(wert)?;
        self.text_senden(text)
    }

    /// Reiht einen Close-Frame ein
    ///
    /// Der Schreiber bricht das Token ab, sobald der Frame geschrieben ist.
    /// Ist die Queue voll, wird sofort abgebrochen.
    pub fn schliessen(&self, code: u16, grund: &str) {
        let frame = Message::Close(Some(CloseFrame {
            code,
            reason: Cow::Owned(grund.to_string()),
        }));
        if self.senden(frame).is_err() {
            self.token.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Schreiber-Task
// ---------------------------------------------------------------------------

/// Startet den einzigen Schreiber einer Verbindung
///
/// Der Task endet bei Abbruch des Tokens, wenn alle Handles weg sind, nach
/// einem Close-Frame oder bei einem Transportfehler. In jedem Fall wird das
/// Token danach abgebrochen.
pub fn schreiber_starten<S>(
    sink: S,
    mut rx: mpsc::Receiver<Message>,
    token: CancellationToken,
) -> JoinHandle<()>
where
    S: Sink<Message> + Send + 'static,
    S::Error: fmt::Display,
{
    tokio::spawn(async move {
        tokio::pin!(sink);

        loop {
            let nachricht = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                n = rx.recv() => match n {
                    Some(n) => n,
                    None => break,
                },
            };

            let ist_close = matches!(nachricht, Message::Close(_));

            let ergebnis = tokio::select! {
                r = sink.send(nachricht) => r,
                // Haengender Send darf den Abbau nicht blockieren
                _ = token.cancelled() => break,
            };

            if let Err(e) = ergebnis {
                tracing::debug!(fehler = %e, "WebSocket-Schreiben fehlgeschlagen");
                break;
            }
            if ist_close {
                break;
            }
        }

        token.cancel();
        let _ = sink.close().await;
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
