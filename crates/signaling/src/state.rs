//! Gemeinsamer Zustand aller Signaling-Sitzungen

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use treffpunkt_db::RaumRepository;

use crate::hub::PeerHub;
use crate::metrics::SignalingMetriken;
use crate::protocol::RtcKonfig;
use crate::room::RoomRegistry;

/// Laufzeit-Parameter der Sitzungen
#[derive(Debug, Clone)]
pub struct SignalingKonfig {
    /// Groesse der Send-Queue je Verbindung
    pub queue_groesse: usize,
    /// Abstand der Keepalive-Pings
    pub keepalive: Duration,
    /// Verbindung wird geschlossen, wenn so lange nichts empfangen wurde
    pub leerlauf_timeout: Duration,
    /// Wird in `create_offer` mitgeschickt
    pub rtc: RtcKonfig,
}

impl Default for SignalingKonfig {
    fn default() -> Self {
        Self {
            queue_groesse: 256,
            keepalive: Duration::from_secs(30),
            leerlauf_timeout: Duration::from_secs(90),
            rtc: RtcKonfig::default(),
        }
    }
}

/// Registries, Persistenz und Konfiguration fuer Hub- und Raum-Sitzungen
///
/// Clone teilt Hub und Registry.
#[derive(Clone)]
pub struct SignalingState {
    pub hub: PeerHub,
    pub registry: RoomRegistry,
    pub raeume: Arc<dyn RaumRepository>,
    pub konfig: SignalingKonfig,
    pub metriken: Arc<dyn SignalingMetriken>,
    /// Wird beim Herunterfahren des Servers abgebrochen
    pub shutdown: CancellationToken,
}

impl SignalingState {
    pub fn neu(
        raeume: Arc<dyn RaumRepository>,
        konfig: SignalingKonfig,
        metriken: Arc<dyn SignalingMetriken>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            hub: PeerHub::neu(Arc::clone(&metriken)),
            registry: RoomRegistry::neu(),
            raeume,
            konfig,
            metriken,
            shutdown,
        }
    }
}
