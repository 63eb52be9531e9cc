//! Peer-Hub – Benachrichtigungskanal je Benutzer
//!
//! Prozessweites Verzeichnis `UserId -> PeerVerbindung`, unabhaengig von
//! Raum-Mitgliedschaften. Pro Benutzer gibt es hoechstens einen Eintrag;
//! ein spaeterer Beitritt ueberschreibt den frueheren.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use treffpunkt_core::UserId;

use crate::connection::PeerVerbindung;
use crate::error::{SignalingError, SignalingResult};
use crate::metrics::{self, SignalingMetriken};
use crate::protocol::HubEreignis;

/// Verzeichnis der Hub-Verbindungen
///
/// Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct PeerHub {
    inner: Arc<PeerHubInner>,
}

struct PeerHubInner {
    peers: DashMap<UserId, PeerVerbindung>,
    metriken: Arc<dyn SignalingMetriken>,
}

impl PeerHub {
    pub fn neu(metriken: Arc<dyn SignalingMetriken>) -> Self {
        Self {
            inner: Arc::new(PeerHubInner {
                peers: DashMap::new(),
                metriken,
            }),
        }
    }

    /// Registriert die Verbindung, eine aeltere fuer denselben Benutzer faellt raus
    pub fn hinzufuegen(&self, verbindung: PeerVerbindung) -> Option<PeerVerbindung> {
        let user_id = verbindung.user_id().clone();
        let vorher = self.inner.peers.insert(user_id.clone(), verbindung);
        if vorher.is_some() {
            tracing::debug!(user_id = %user_id, "Hub-Eintrag ersetzt");
        }
        self.anzahl_melden();
        vorher
    }

    /// Entfernt den Eintrag; ein fehlender Eintrag ist kein Fehler
    pub fn entfernen(&self, user_id: &UserId) -> Option<PeerVerbindung> {
        let entfernt = self.inner.peers.remove(user_id).map(|(_, v)| v);
        self.anzahl_melden();
        entfernt
    }

    /// Entfernt den Eintrag nur, wenn er noch zu dieser Verbindung gehoert
    pub fn entfernen_wenn_aktuell(&self, user_id: &UserId, verbindungs_id: u64) -> bool {
        let entfernt = self
            .inner
            .peers
            .remove_if(user_id, |_, v| v.verbindungs_id() == verbindungs_id)
            .is_some();
        self.anzahl_melden();
        entfernt
    }

    pub fn laden(&self, user_id: &UserId) -> Option<PeerVerbindung> {
        self.inner.peers.get(user_id).map(|v| v.value().clone())
    }

    /// Sendet ein Ereignis an einen Benutzer
    ///
    /// `PeerNichtGefunden` wenn kein Eintrag existiert, `SendFehler` wenn
    /// die Zustellung scheitert.
    pub fn senden_an(&self, user_id: &UserId, event: &str, message: Value) -> SignalingResult<()> {
        let verbindung = self
            .laden(user_id)
            .ok_or_else(|| SignalingError::PeerNichtGefunden(user_id.clone()))?;
        verbindung.json_senden(&HubEreignis::neu(event, message))
    }

    /// Sendet ein Ereignis an alle Hub-Peers
    ///
    /// Einzelne Fehlschlaege werden geloggt und brechen nicht ab. Gibt die
    /// Anzahl erfolgreicher Zustellungen zurueck.
    pub fn broadcast(&self, event: &str, message: Value) -> usize {
        let text = match serde_json::to_string(&HubEreignis::neu(event, message)) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(fehler = %e, event, "Hub-Ereignis nicht serialisierbar");
                return 0;
            }
        };

        let mut gesendet = 0;
        self.inner.peers.iter().for_each(|eintrag| {
            match eintrag.value().text_senden(text.clone()) {
                Ok(()) => gesendet += 1,
                Err(e) => {
                    tracing::debug!(user_id = %eintrag.key(), fehler = %e, event, "Broadcast an Peer fehlgeschlagen");
                }
            }
        });
        gesendet
    }

    pub fn anzahl(&self) -> usize {
        self.inner.peers.len()
    }

    fn anzahl_melden(&self) {
        self.inner.metriken.hub_peers_setzen(self.inner.peers.len());
    }
}

impl Default for PeerHub {
    fn default() -> Self {
        Self::neu(metrics::keine())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Message;
    use serde_json::json;

    fn verbindung(name: &str) -> (PeerVerbindung, tokio::sync::mpsc::Receiver<Message>) {
        PeerVerbindung::neu(UserId::neu(name), 16)
    }

    fn text(rx: &mut tokio::sync::mpsc::Receiver<Message>) -> Value {
        match rx.try_recv().expect("Nachricht erwartet") {
            Message::Text(t) => serde_json::from_str(&t).unwrap(),
            andere => panic!("Text-Frame erwartet, bekam {andere:?}"),
        }
    }

    #[tokio::test]
    async fn senden_an_registrierten_peer() {
        let hub = PeerHub::default();
        let (v, mut rx) = verbindung("alice");
        hub.hinzufuegen(v);

        hub.senden_an(&UserId::neu("alice"), "invite", json!({ "roomID": "r1" }))
            .unwrap();
        assert_eq!(
            text(&mut rx),
            json!({ "event": "invite", "message": { "roomID": "r1" } })
        );
    }

    #[tokio::test]
    async fn senden_an_unbekannten_peer() {
        let hub = PeerHub::default();
        let (v, mut rx) = verbindung("alice");
        hub.hinzufuegen(v);

        let ergebnis = hub.senden_an(&UserId::neu("bob"), "invite", json!({}));
        assert!(matches!(ergebnis, Err(SignalingError::PeerNichtGefunden(u)) if u.as_str() == "bob"));
        assert_eq!(hub.anzahl(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn letzter_beitritt_gewinnt() {
        let hub = PeerHub::default();
        let (v1, mut rx1) = verbindung("alice");
        let (v2, mut rx2) = verbindung("alice");
        let id2 = v2.verbindungs_id();

        hub.hinzufuegen(v1);
        let vorher = hub.hinzufuegen(v2);
        assert!(vorher.is_some());
        assert_eq!(hub.anzahl(), 1);
        assert_eq!(hub.laden(&UserId::neu("alice")).unwrap().verbindungs_id(), id2);

        hub.senden_an(&UserId::neu("alice"), "ping", Value::Null).unwrap();
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());

        assert!(hub.entfernen(&UserId::neu("alice")).is_some());
        assert!(hub.laden(&UserId::neu("alice")).is_none());
        // Doppeltes Entfernen ist ein No-op
        assert!(hub.entfernen(&UserId::neu("alice")).is_none());
    }

    #[tokio::test]
    async fn alte_verbindung_entfernt_neuere_nicht() {
        let hub = PeerHub::default();
        let (alt, _rx1) = verbindung("alice");
        let (neu, _rx2) = verbindung("alice");
        let alt_id = alt.verbindungs_id();

        hub.hinzufuegen(alt);
        hub.hinzufuegen(neu);

        assert!(!hub.entfernen_wenn_aktuell(&UserId::neu("alice"), alt_id));
        assert_eq!(hub.anzahl(), 1);
    }

    #[tokio::test]
    async fn broadcast_ueberspringt_tote_peers() {
        let hub = PeerHub::default();
        let (a, mut rx_a) = verbindung("a");
        let (b, rx_b) = verbindung("b");
        let (c, mut rx_c) = verbindung("c");
        hub.hinzufuegen(a);
        hub.hinzufuegen(b);
        hub.hinzufuegen(c);
        drop(rx_b);

        let gesendet = hub.broadcast("hallo", json!("welt"));
        assert_eq!(gesendet, 2);
        assert_eq!(text(&mut rx_a)["message"], "welt");
        assert_eq!(text(&mut rx_c)["event"], "hallo");
    }

    #[tokio::test]
    async fn broadcast_an_leeren_hub() {
        let hub = PeerHub::default();
        assert_eq!(hub.broadcast("hallo", Value::Null), 0);
    }
}
