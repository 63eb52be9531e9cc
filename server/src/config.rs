//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use treffpunkt_db::DatabaseConfig;
use treffpunkt_signaling::{RtcKonfig, SignalingKonfig};

/// Umgebungsvariable mit dem Pfad zur Konfigurationsdatei
pub const ENV_CONFIG: &str = "TREFFPUNKT_CONFIG";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Datenbank-Einstellungen
    pub datenbank: DatenbankEinstellungen,
    /// Session-Einstellungen
    pub sitzung: SitzungEinstellungen,
    /// Signaling-Einstellungen (Queues, Keepalive)
    pub signaling: SignalingEinstellungen,
    /// WebRTC-Konfiguration fuer Clients
    pub rtc: RtcEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse des HTTP-Servers
    pub bind_adresse: String,
    /// Port des HTTP-Servers
    pub port: u16,
    /// CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 8080,
            cors_origins: vec![],
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    /// WAL-Modus aktivieren
    pub wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://treffpunkt.db".into(),
            max_verbindungen: 5,
            wal: true,
        }
    }
}

/// Session-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitzungEinstellungen {
    /// Gueltigkeit eines Tokens in Sekunden
    pub ttl_sek: u64,
    /// Abstand des Cleanup-Laufs fuer abgelaufene Sessions (0 = aus)
    pub cleanup_intervall_sek: u64,
}

impl Default for SitzungEinstellungen {
    fn default() -> Self {
        Self {
            ttl_sek: 15 * 60,
            cleanup_intervall_sek: 300,
        }
    }
}

/// Signaling-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingEinstellungen {
    /// Groesse der Send-Queue je Verbindung
    pub queue_groesse: usize,
    /// Abstand der Keepalive-Pings in Sekunden
    pub keepalive_sek: u64,
    /// Verbindung schliessen nach so vielen Sekunden ohne Empfang
    pub leerlauf_timeout_sek: u64,
}

impl Default for SignalingEinstellungen {
    fn default() -> Self {
        Self {
            queue_groesse: 256,
            keepalive_sek: 30,
            leerlauf_timeout_sek: 90,
        }
    }
}

/// WebRTC-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RtcEinstellungen {
    /// ICE-Server-URLs (STUN/TURN)
    pub ice_server: Vec<String>,
}

impl Default for RtcEinstellungen {
    fn default() -> Self {
        Self {
            ice_server: vec![treffpunkt_signaling::protocol::STANDARD_ICE_SERVER.into()],
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// `/metrics` bereitstellen
    pub metriken: bool,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self { metriken: true }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match Self::laden_falls_vorhanden(pfad)? {
            Some(config) => Ok(config),
            None => {
                fehlende_datei_melden(pfad);
                Ok(Self::default())
            }
        }
    }

    /// Wie `laden`, aber `None` statt Standardwerten wenn die Datei fehlt
    ///
    /// Fuer den Start, bei dem das Logging erst nach dem Laden steht.
    pub fn laden_falls_vorhanden(pfad: &str) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => Self::aus_toml(&inhalt)
                .map(Some)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Parst die Konfiguration aus einem TOML-String
    pub fn aus_toml(inhalt: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(inhalt)
    }

    /// Gibt die vollstaendige Bind-Adresse fuer HTTP zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.sitzung.ttl_sek)
    }

    pub fn datenbank_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.wal,
        }
    }

    pub fn rtc_konfig(&self) -> RtcKonfig {
        RtcKonfig::aus_urls(self.rtc.ice_server.clone())
    }

    pub fn signaling_konfig(&self) -> SignalingKonfig {
        SignalingKonfig {
            queue_groesse: self.signaling.queue_groesse.max(1),
            keepalive: Duration::from_secs(self.signaling.keepalive_sek.max(1)),
            leerlauf_timeout: Duration::from_secs(self.signaling.leerlauf_timeout_sek.max(1)),
            rtc: self.rtc_konfig(),
        }
    }
}

/// Warnt ueber eine fehlende Konfigurationsdatei
pub fn fehlende_datei_melden(pfad: &str) {
    tracing::warn!(
        pfad = pfad,
        "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
    );
}
