//! treffpunkt-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::ServerConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use treffpunkt_auth::SessionStore;
use treffpunkt_db::SqliteDb;
use treffpunkt_observability::{HealthState, TreffpunktMetriken};

use crate::routes::{app_bauen, RouterOptionen};
use crate::state::AppState;

/// Haelt den Server-Zustand vor dem Start zusammen
pub struct Server {
    pub config: ServerConfig,
    db: Option<SqliteDb>,
}

/// Ein gebundener, laufender Server
pub struct LaufenderServer {
    adresse: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config, db: None }
    }

    /// Verwendet eine bereits geoeffnete Datenbank statt `[datenbank]`
    pub fn mit_datenbank(mut self, db: SqliteDb) -> Self {
        self.db = Some(db);
        self
    }

    /// Bindet den Listener und startet alle Subsysteme im Hintergrund
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen
    /// 2. Session-Store samt Cleanup-Task
    /// 3. Signaling-Zustand und Router
    /// 4. HTTP-Listener binden
    pub async fn binden(self) -> Result<LaufenderServer> {
        let db = match self.db {
            Some(db) => db,
            None => SqliteDb::oeffnen(&self.config.datenbank_config())
                .await
                .with_context(|| {
                    format!("Datenbank '{}' nicht verfuegbar", self.config.datenbank.url)
                })?,
        };
        let db = Arc::new(db);

        let shutdown = CancellationToken::new();

        let sessions = SessionStore::neu();
        if self.config.sitzung.cleanup_intervall_sek > 0 {
            sessions.cleanup_starten(
                Duration::from_secs(self.config.sitzung.cleanup_intervall_sek),
                shutdown.clone(),
            );
        }

        let metriken = TreffpunktMetriken::neu().context("Metriken nicht registrierbar")?;
        let state = AppState::neu(
            Arc::clone(&db),
            sessions,
            metriken,
            &self.config,
            shutdown.clone(),
        );
        let health = HealthState::neu(db);

        let app = app_bauen(
            state,
            health,
            &RouterOptionen {
                metriken: self.config.observability.metriken,
                cors_origins: self.config.netzwerk.cors_origins.clone(),
            },
        );

        let bind = self.config.bind_adresse();
        let listener = TcpListener::bind(&bind)
            .await
            .with_context(|| format!("Bind auf {bind} fehlgeschlagen"))?;
        let adresse = listener.local_addr()?;
        tracing::info!(adresse = %adresse, "HTTP-Server bereit");

        let signal = shutdown.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
        });

        Ok(LaufenderServer {
            adresse,
            shutdown,
            task,
        })
    }

    /// Startet den Server und laeuft bis zum Shutdown-Signal (Ctrl-C)
    pub async fn starten(self) -> Result<()> {
        let server = self.binden().await?;

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        server.herunterfahren().await
    }
}

impl LaufenderServer {
    pub fn adresse(&self) -> SocketAddr {
        self.adresse
    }

    /// Bricht alle Sitzungen ab und wartet auf das Ende des HTTP-Servers
    pub async fn herunterfahren(self) -> Result<()> {
        self.shutdown.cancel();
        self.task.await.context("HTTP-Task abgebrochen")??;
        Ok(())
    }
}
