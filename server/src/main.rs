//! Treffpunkt Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.

use anyhow::Result;
use treffpunkt_observability::logging_initialisieren;
use treffpunkt_server::{
    config::{fehlende_datei_melden, ServerConfig, ENV_CONFIG},
    Server,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var(ENV_CONFIG).unwrap_or_else(|_| "config.toml".into());

    let geladen = ServerConfig::laden_falls_vorhanden(&config_pfad)?;
    let datei_fehlt = geladen.is_none();
    let config = geladen.unwrap_or_default();

    logging_initialisieren(&config.logging.level, &config.logging.format);

    // Erst jetzt gibt es einen Subscriber fuer die Warnung
    if datei_fehlt {
        fehlende_datei_melden(&config_pfad);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        bind = %config.bind_adresse(),
        "Treffpunkt Server wird initialisiert"
    );

    Server::neu(config).starten().await
}
