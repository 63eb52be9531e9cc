//! Raeume – Peer-Verzeichnis je Raum und Raum-Registry
//!
//! Jeder Raum schuetzt seine eigene Peer-Map mit einem RwLock. Die Registry
//! legt Raeume beim ersten Beitritt an; leere Raeume bleiben bestehen und
//! verhalten sich wie frisch angelegte.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use treffpunkt_core::{RoomId, UserId};

use crate::connection::PeerVerbindung;

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// Live-Zustand eines Raums
#[derive(Debug)]
pub struct Room {
    room_id: RoomId,
    peers: RwLock<HashMap<UserId, PeerVerbindung>>,
}

impl Room {
    pub fn neu(room_id: RoomId) -> Self {
        Self {
            room_id,
            peers: RwLock::new(HashMap::new()),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Speichert die Verbindung unter ihrer User-ID (ueberschreibt)
    pub fn speichern(&self, verbindung: PeerVerbindung) -> Option<PeerVerbindung> {
        self.peers
            .write()
            .insert(verbindung.user_id().clone(), verbindung)
    }

    pub fn laden(&self, user_id: &UserId) -> Option<PeerVerbindung> {
        self.peers.read().get(user_id).cloned()
    }

    pub fn loeschen(&self, user_id: &UserId) -> Option<PeerVerbindung> {
        self.peers.write().remove(user_id)
    }

    /// Loescht den Eintrag nur, wenn er zu dieser Verbindung gehoert
    pub fn loeschen_wenn_aktuell(&self, user_id: &UserId, verbindungs_id: u64) -> bool {
        let mut peers = self.peers.write();
        match peers.get(user_id) {
            Some(v) if v.verbindungs_id() == verbindungs_id => {
                peers.remove(user_id);
                true
            }
            _ => false,
        }
    }

    /// Ruft `f` fuer jeden Peer auf, waehrend die Lese-Sperre gehalten wird
    ///
    /// `f` darf den Raum nicht veraendern.
    pub fn durchlaufen<F>(&self, mut f: F)
    where
        F: FnMut(&UserId, &PeerVerbindung),
    {
        let peers = self.peers.read();
        for (user_id, verbindung) in peers.iter() {
            f(user_id, verbindung);
        }
    }

    pub fn anzahl(&self) -> usize {
        self.peers.read().len()
    }

    pub fn ist_leer(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Momentaufnahme der anwesenden User-IDs
    pub fn user_ids(&self) -> Vec<UserId> {
        self.peers.read().keys().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// RoomRegistry
// ---------------------------------------------------------------------------

/// Verzeichnis `RoomId -> Room`
///
/// Clone teilt den inneren Zustand.
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    raeume: Arc<DashMap<RoomId, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Liefert den Raum, legt ihn beim ersten Aufruf an
    ///
    /// Nebenlaeufige Aufrufe fuer dieselbe ID liefern dasselbe Objekt.
    pub fn speichern(&self, room_id: &RoomId) -> Arc<Room> {
        Arc::clone(
            self.raeume
                .entry(room_id.clone())
                .or_insert_with(|| {
                    tracing::debug!(room_id = %room_id, "Live-Raum angelegt");
                    Arc::new(Room::neu(room_id.clone()))
                })
                .value(),
        )
    }

    pub fn laden(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        self.raeume.get(room_id).map(|r| Arc::clone(r.value()))
    }

    pub fn anzahl(&self) -> usize {
        self.raeume.len()
    }

    /// Summe der Peers ueber alle Raeume
    pub fn peer_anzahl(&self) -> usize {
        self.raeume.iter().map(|r| r.value().anzahl()).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
