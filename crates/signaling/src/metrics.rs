//! Metrik-Schnittstelle des Signalings
//!
//! Das Signaling kennt keine konkrete Metrik-Bibliothek. Der Server reicht
//! eine Implementierung hinein (Prometheus im Observability-Crate).

use std::sync::Arc;

/// Ereignisse, die das Signaling meldet
pub trait SignalingMetriken: Send + Sync {
    /// Aktuelle Anzahl registrierter Hub-Peers
    fn hub_peers_setzen(&self, _anzahl: usize) {}

    /// Ein Peer ist einem Raum beigetreten
    fn raum_peer_betreten(&self) {}

    /// Ein Peer hat einen Raum verlassen
    fn raum_peer_verlassen(&self) {}

    /// Eine Raum-Nachricht wurde an ihr Ziel weitergeleitet
    fn nachricht_weitergeleitet(&self) {}

    /// Eine Raum-Nachricht wurde verworfen (Ziel fehlt, unbekanntes Event)
    fn nachricht_verworfen(&self) {}
}

/// Metriken ohne Wirkung
#[derive(Debug, Default, Clone, Copy)]
pub struct KeineMetriken;

impl SignalingMetriken for KeineMetriken {}

pub(crate) fn keine() -> Arc<dyn SignalingMetriken> {
    Arc::new(KeineMetriken)
}
