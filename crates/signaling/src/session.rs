//! Signaling-Sitzungen – Lese-Schleifen fuer Hub- und Raum-Verbindungen
//!
//! ## Raum-Sitzung
//! ```text
//! joining ──> negotiating ──> relaying ──> closed
//!   |            |               |
//!   |            |               +-- offer  (peerID)    -> an Ziel im Raum
//!   |            |               +-- answer (requester) -> an Ziel im Raum
//!   |            +-- create_offer je anwesendem Peer an den Neuankoemmling
//!   +-- persistierter Beitritt, Live-Raum holen oder anlegen
//! ```
//!
//! Der Neuankoemmling wird erst nach dem Fan-out eingetragen. Wer waehrend
//! des Fan-outs beitritt, bekommt selbst ein `create_offer` fuer uns, sobald
//! wir eingetragen sind, oder wird von uns verpasst. Doppelte Offers sind
//! ueber die expliziten IDs fuer Clients unschaedlich.
//!
//! ## Hub-Sitzung
//! Die erste Nachricht wird verworfen (Alt-Handshake), danach ist der
//! Benutzer im Hub erreichbar. Weitere Nachrichten werden ignoriert.

use std::fmt;
use std::time::Duration;

use axum::extract::ws::Message;
use futures_util::{Sink, Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use treffpunkt_core::{RoomId, UserId};

use crate::connection::{
    schreiber_starten, PeerVerbindung, CLOSE_GOING_AWAY, CLOSE_INTERNAL_ERROR, CLOSE_NORMAL,
};
use crate::protocol::{AusgehendeNachricht, EingehendeNachricht};
use crate::room::Room;
use crate::state::SignalingState;

/// Wie lange auf den Schreiber gewartet wird, bis der Close-Frame raus ist
const ABBAU_TIMEOUT: Duration = Duration::from_secs(2);

/// Grund fuer das Ende einer Sitzung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitzungsEnde {
    /// Client hat getrennt oder der Transport ist abgebrochen
    Getrennt,
    /// Zu lange nichts empfangen
    Zeitueberschreitung,
    /// Server faehrt herunter
    Shutdown,
    /// Persistierter Raum existiert nicht
    RaumFehlt,
    /// Persistenz-Fehler beim Beitritt
    Fehler,
}

impl SitzungsEnde {
    /// Close-Code und Grund fuer den Close-Frame
    pub fn close_frame(self) -> (u16, &'static str) {
        match self {
            Self::Getrennt => (CLOSE_NORMAL, "Verbindung geschlossen"),
            Self::Zeitueberschreitung => (CLOSE_NORMAL, "Zeitueberschreitung"),
            Self::Shutdown => (CLOSE_GOING_AWAY, "Server wird heruntergefahren"),
            Self::RaumFehlt => (CLOSE_INTERNAL_ERROR, "Raum existiert nicht"),
            Self::Fehler => (CLOSE_INTERNAL_ERROR, "Interner Fehler"),
        }
    }
}

impl fmt::Display for SitzungsEnde {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.close_frame().1)
    }
}

// ---------------------------------------------------------------------------
// Hub-Sitzung
// ---------------------------------------------------------------------------

/// Betreibt eine Hub-Verbindung bis zu ihrem Ende
pub async fn hub_sitzung<S, R, E>(
    state: &SignalingState,
    user_id: UserId,
    sink: S,
    mut stream: R,
) -> SitzungsEnde
where
    S: Sink<Message> + Send + 'static,
    S::Error: fmt::Display,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: fmt::Display,
{
    let (verbindung, rx) = PeerVerbindung::neu(user_id.clone(), state.konfig.queue_groesse);
    let schreiber = schreiber_starten(sink, rx, verbindung.token().clone());

    tracing::debug!(user_id = %user_id, verbindung = verbindung.verbindungs_id(), "Hub-Verbindung geoeffnet");

    let mut registriert = false;
    let ende = lese_schleife(state, &verbindung, &mut stream, |_| {
        if !registriert {
            registriert = true;
            state.hub.hinzufuegen(verbindung.clone());
            tracing::info!(user_id = %user_id, "Hub beigetreten");
        }
    })
    .await;

    if registriert && state.hub.entfernen_wenn_aktuell(&user_id, verbindung.verbindungs_id()) {
        tracing::info!(user_id = %user_id, ende = %ende, "Hub verlassen");
    }

    abbauen(&verbindung, schreiber, ende).await;
    ende
}

// ---------------------------------------------------------------------------
// Raum-Sitzung
// ---------------------------------------------------------------------------

/// Betreibt eine Raum-Verbindung vom Beitritt bis zum Verlassen
///
/// Der Benutzer ist bereits authentifiziert.
pub async fn raum_sitzung<S, R, E>(
    state: &SignalingState,
    room_id: RoomId,
    user_id: UserId,
    sink: S,
    mut stream: R,
) -> SitzungsEnde
where
    S: Sink<Message> + Send + 'static,
    S::Error: fmt::Display,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: fmt::Display,
{
    let (verbindung, rx) = PeerVerbindung::neu(user_id.clone(), state.konfig.queue_groesse);
    let schreiber = schreiber_starten(sink, rx, verbindung.token().clone());

    // joining
    match state.raeume.peer_hinzufuegen(&room_id, &user_id).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(room_id = %room_id, user_id = %user_id, "Beitritt zu unbekanntem Raum");
            abbauen(&verbindung, schreiber, SitzungsEnde::RaumFehlt).await;
            return SitzungsEnde::RaumFehlt;
        }
        Err(e) => {
            tracing::error!(room_id = %room_id, user_id = %user_id, fehler = %e, "Persistierter Beitritt fehlgeschlagen");
            abbauen(&verbindung, schreiber, SitzungsEnde::Fehler).await;
            return SitzungsEnde::Fehler;
        }
    }
    let raum = state.registry.speichern(&room_id);

    // negotiating
    if !angebote_anfordern(state, &raum, &verbindung).await {
        tracing::debug!(room_id = %room_id, user_id = %user_id, "Neuankoemmling waehrend Fan-out getrennt");
        // Nie live eingetragen, nur der persistierte Beitritt ist rueckgaengig zu machen
        if let Err(e) = state.raeume.peer_entfernen(&room_id, &user_id).await {
            tracing::warn!(room_id = %room_id, user_id = %user_id, fehler = %e, "Persistierte Peer-Liste nicht aktualisiert");
        }
        abbauen(&verbindung, schreiber, SitzungsEnde::Getrennt).await;
        return SitzungsEnde::Getrennt;
    }

    if raum.speichern(verbindung.clone()).is_none() {
        state.metriken.raum_peer_betreten();
    }
    tracing::info!(room_id = %room_id, user_id = %user_id, peers = raum.anzahl(), "Raum beigetreten");

    // relaying
    let ende = lese_schleife(state, &verbindung, &mut stream, |nachricht| {
        if let Message::Text(text) = nachricht {
            weiterleiten(state, &raum, &user_id, text);
        }
    })
    .await;

    // closed
    if raum.loeschen_wenn_aktuell(&user_id, verbindung.verbindungs_id()) {
        state.metriken.raum_peer_verlassen();
        if let Err(e) = state.raeume.peer_entfernen(&room_id, &user_id).await {
            tracing::warn!(room_id = %room_id, user_id = %user_id, fehler = %e, "Persistierte Peer-Liste nicht aktualisiert");
        }
    }
    tracing::info!(room_id = %room_id, user_id = %user_id, ende = %ende, "Raum verlassen");

    abbauen(&verbindung, schreiber, ende).await;
    ende
}

/// Schickt dem Neuankoemmling ein `create_offer` je anwesendem Peer
///
/// Scheitert die Zustellung an einem Peer, wird dieser Peer aus dem Raum
/// und der persistierten Liste entfernt; der Fan-out laeuft weiter. Gibt
/// `false` zurueck, wenn die Verbindung des Neuankoemmlings selbst weg ist.
async fn angebote_anfordern(
    state: &SignalingState,
    raum: &Room,
    neu: &PeerVerbindung,
) -> bool {
    let mut verdraengt: Vec<(UserId, u64)> = Vec::new();

    raum.durchlaufen(|peer_id, peer| {
        if peer_id == neu.user_id() || neu.ist_geschlossen() {
            return;
        }
        let anfrage = AusgehendeNachricht::CreateOffer {
            requester: neu.user_id().clone(),
            peer_id: peer_id.clone(),
            config: state.konfig.rtc.clone(),
        };
        if let Err(e) = neu.json_senden(&anfrage) {
            tracing::warn!(
                room_id = %raum.room_id(),
                user_id = %neu.user_id(),
                peer = %peer_id,
                fehler = %e,
                "create_offer nicht zustellbar"
            );
            verdraengt.push((peer_id.clone(), peer.verbindungs_id()));
        }
    });

    if neu.ist_geschlossen() {
        return false;
    }

    for (peer_id, verbindungs_id) in verdraengt {
        if raum.loeschen_wenn_aktuell(&peer_id, verbindungs_id) {
            state.metriken.raum_peer_verlassen();
            if let Err(e) = state.raeume.peer_entfernen(raum.room_id(), &peer_id).await {
                tracing::warn!(room_id = %raum.room_id(), peer = %peer_id, fehler = %e, "Verdraengter Peer nicht aus Peer-Liste entfernt");
            }
        }
    }
    true
}

/// Leitet eine Raum-Nachricht unveraendert an ihr Ziel weiter
fn weiterleiten(state: &SignalingState, raum: &Room, absender: &UserId, text: String) {
    let nachricht = EingehendeNachricht::parsen(&text);

    let Some(ziel) = nachricht.ziel() else {
        tracing::trace!(user_id = %absender, event = nachricht.event_name(), "Nachricht ohne Ziel ignoriert");
        state.metriken.nachricht_verworfen();
        return;
    };

    let Some(peer) = raum.laden(ziel) else {
        // Ziel hat den Raum schon verlassen
        tracing::debug!(user_id = %absender, ziel = %ziel, event = nachricht.event_name(), "Ziel nicht im Raum");
        state.metriken.nachricht_verworfen();
        return;
    };

    match peer.text_senden(text) {
        Ok(()) => {
            tracing::trace!(user_id = %absender, ziel = %ziel, event = nachricht.event_name(), "Weitergeleitet");
            state.metriken.nachricht_weitergeleitet();
        }
        Err(e) => {
            tracing::debug!(user_id = %absender, ziel = %ziel, fehler = %e, "Weiterleitung fehlgeschlagen");
            state.metriken.nachricht_verworfen();
        }
    }
}

// ---------------------------------------------------------------------------
// Gemeinsame Lese-Schleife
// ---------------------------------------------------------------------------

/// Liest bis Trennung, Leerlauf-Timeout oder Shutdown
///
/// `bei_nachricht` bekommt Text- und Binaer-Frames. Pings werden im
/// Abstand `keepalive` ueber die Send-Queue verschickt.
async fn lese_schleife<R, E, F>(
    state: &SignalingState,
    verbindung: &PeerVerbindung,
    stream: &mut R,
    mut bei_nachricht: F,
) -> SitzungsEnde
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
    F: FnMut(Message),
{
    let keepalive = state.konfig.keepalive;
    let timeout = state.konfig.leerlauf_timeout;

    let mut ping_takt = tokio::time::interval_at(Instant::now() + keepalive, keepalive);
    let leerlauf = tokio::time::sleep(timeout);
    tokio::pin!(leerlauf);

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => return SitzungsEnde::Shutdown,

            // Schreiber beendet (Transportfehler oder Close)
            _ = verbindung.token().cancelled() => return SitzungsEnde::Getrennt,

            _ = &mut leerlauf => {
                tracing::debug!(user_id = %verbindung.user_id(), "Leerlauf-Timeout");
                return SitzungsEnde::Zeitueberschreitung;
            }

            _ = ping_takt.tick() => {
                if let Err(e) = verbindung.senden(Message::Ping(Vec::new())) {
                    tracing::trace!(user_id = %verbindung.user_id(), fehler = %e, "Ping nicht eingereiht");
                }
            }

            eingang = stream.next() => match eingang {
                None => return SitzungsEnde::Getrennt,
                Some(Err(e)) => {
                    tracing::debug!(user_id = %verbindung.user_id(), fehler = %e, "WebSocket-Lesefehler");
                    return SitzungsEnde::Getrennt;
                }
                Some(Ok(nachricht)) => {
                    leerlauf.as_mut().reset(Instant::now() + timeout);
                    match nachricht {
                        Message::Close(_) => return SitzungsEnde::Getrennt,
                        Message::Text(_) | Message::Binary(_) => bei_nachricht(nachricht),
                        Message::Ping(_) | Message::Pong(_) => {}
                    }
                }
            },
        }
    }
}

/// Schickt den Close-Frame und wartet kurz auf den Schreiber
async fn abbauen(verbindung: &PeerVerbindung, mut schreiber: JoinHandle<()>, ende: SitzungsEnde) {
    let (code, grund) = ende.close_frame();
    verbindung.schliessen(code, grund);
    if tokio::time::timeout(ABBAU_TIMEOUT, &mut schreiber).await.is_err() {
        verbindung.token().cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
