//! Axum-State des Servers

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use treffpunkt_auth::{AuthError, SessionQuelle, SessionStore};
use treffpunkt_db::{BenutzerRepository, EinladungRepository, RaumRepository, SqliteDb};
use treffpunkt_observability::TreffpunktMetriken;
use treffpunkt_signaling::{RtcKonfig, SignalingMetriken, SignalingState};

use crate::config::ServerConfig;

/// Geteilter Zustand aller Handler
#[derive(Clone)]
pub struct AppState {
    pub benutzer: Arc<dyn BenutzerRepository>,
    pub raeume: Arc<dyn RaumRepository>,
    pub einladungen: Arc<dyn EinladungRepository>,
    pub sessions: Arc<SessionStore>,
    pub signaling: SignalingState,
    pub metriken: TreffpunktMetriken,
    /// Gueltigkeit neu ausgestellter Tokens
    pub session_ttl: Duration,
}

impl AppState {
    /// Verdrahtet alle Repositories mit einer SQLite-Datenbank
    pub fn neu(
        db: Arc<SqliteDb>,
        sessions: Arc<SessionStore>,
        metriken: TreffpunktMetriken,
        config: &ServerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let signaling_metriken: Arc<dyn SignalingMetriken> = Arc::new(metriken.clone());
        let signaling = SignalingState::neu(
            db.clone(),
            config.signaling_konfig(),
            signaling_metriken,
            shutdown,
        );

        Self {
            benutzer: db.clone(),
            raeume: db.clone(),
            einladungen: db,
            sessions,
            signaling,
            metriken,
            session_ttl: config.session_ttl(),
        }
    }

    pub fn rtc(&self) -> &RtcKonfig {
        &self.signaling.konfig.rtc
    }
}

impl SessionQuelle for AppState {
    fn session_store(&self) -> &SessionStore {
        &self.sessions
    }

    fn auth_fehlgeschlagen(&self, _fehler: &AuthError) {
        self.metriken.auth_failures_total.inc();
    }
}
