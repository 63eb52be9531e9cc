//! Session-Management fuer Treffpunkt
//!
//! Tokens werden aus einem Prozess-Geheimnis und der Benutzer-ID abgeleitet
//! (SHA-256 ueber `geheimnis || user_id`). Das Geheimnis wird beim Start aus
//! dem Betriebssystem-Zufall erzeugt und nie persistiert, ein Neustart
//! entwertet also alle Tokens.
//!
//! Abgelaufene Sessions werden bei der naechsten Pruefung geloescht. Der
//! periodische Cleanup-Task ist nur eine Ergaenzung.

use std::{collections::HashMap, sync::Arc, time::Duration};

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use tokio::{sync::RwLock, task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;
use treffpunkt_core::UserId;

use crate::error::{AuthError, AuthResult};

/// Laenge des Prozess-Geheimnisses in Bytes
const GEHEIMNIS_BYTES: usize = 64;

/// Ein ausgestelltes Session-Token
#[derive(Debug, Clone)]
pub struct Session {
    /// Der Token-String (SHA-256 Hex)
    pub token: String,
    /// ID des Benutzers dem diese Session gehoert
    pub user_id: UserId,
    /// Zeitpunkt des Session-Ablaufs
    pub laeuft_ab_am: Instant,
}

impl Session {
    /// Gibt `true` zurueck solange der Ablaufzeitpunkt nicht ueberschritten ist
    pub fn ist_gueltig(&self) -> bool {
        Instant::now() <= self.laeuft_ab_am
    }
}

/// In-Memory Session-Store mit TTL pro Token
#[derive(Debug)]
pub struct SessionStore {
    /// Hex-kodiertes Prozess-Geheimnis
    geheimnis: String,
    /// token -> Session
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Erstellt einen neuen leeren Session-Store mit frischem Geheimnis
    pub fn neu() -> Arc<Self> {
        let mut bytes = [0u8; GEHEIMNIS_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Arc::new(Self {
            geheimnis: hex::encode(bytes),
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Startet einen Hintergrund-Task, der abgelaufene Sessions entfernt
    pub fn cleanup_starten(
        self: &Arc<Self>,
        intervall: Duration,
        abbruch: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = abbruch.cancelled() => break,
                    _ = tokio::time::sleep(intervall) => {
                        let entfernt = store.cleanup_abgelaufene().await;
                        if entfernt > 0 {
                            tracing::debug!(anzahl = entfernt, "Abgelaufene Sessions bereinigt");
                        }
                    }
                }
            }
        })
    }

    /// Stellt ein Token fuer den Benutzer aus, gueltig fuer `ttl`
    ///
    /// Erneutes Ausstellen fuer denselben Benutzer liefert dasselbe Token
    /// und verlaengert dessen Ablauf.
    pub async fn ausstellen(&self, user_id: &UserId, ttl: Duration) -> String {
        let token = self.token_ableiten(user_id);
        let session = Session {
            token: token.clone(),
            user_id: user_id.clone(),
            laeuft_ab_am: Instant::now() + ttl,
        };

        self.sessions.write().await.insert(token.clone(), session);
        tracing::debug!(user_id = %user_id, ttl_sek = ttl.as_secs(), "Session ausgestellt");
        token
    }

    /// Validiert ein Token und gibt die gebundene Benutzer-ID zurueck
    ///
    /// Ein abgelaufenes Token wird dabei geloescht; jede weitere Pruefung
    /// liefert `AuthError::SessionUngueltig`.
    pub async fn validieren(&self, token: &str) -> AuthResult<UserId> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return Err(AuthError::SessionUngueltig),
                Some(session) if session.ist_gueltig() => return Ok(session.user_id.clone()),
                Some(_) => {}
            }
        }

        // Zwischen Lese- und Schreibsperre kann das Token neu ausgestellt worden sein
        let mut sessions = self.sessions.write().await;
        match sessions.get(token) {
            Some(session) if session.ist_gueltig() => Ok(session.user_id.clone()),
            Some(session) => {
                tracing::debug!(user_id = %session.user_id, "Abgelaufene Session entfernt");
                sessions.remove(token);
                Err(AuthError::SessionAbgelaufen)
            }
            None => Err(AuthError::SessionUngueltig),
        }
    }

    /// Invalidiert (loescht) eine Session anhand des Tokens
    ///
    /// Gibt `true` zurueck wenn eine Session entfernt wurde.
    pub async fn invalidieren(&self, token: &str) -> bool {
        let entfernt = self.sessions.write().await.remove(token).is_some();
        if entfernt {
            tracing::debug!("Session invalidiert");
        }
        entfernt
    }

    /// Bereinigt abgelaufene Sessions und gibt die Anzahl der entfernten Sessions zurueck
    pub async fn cleanup_abgelaufene(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let vorher = sessions.len();
        sessions.retain(|_, s| s.ist_gueltig());
        vorher - sessions.len()
    }

    /// Anzahl der gespeicherten Sessions (inklusive noch nicht bereinigter)
    pub async fn anzahl(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn token_ableiten(&self, user_id: &UserId) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.geheimnis.as_bytes());
        hasher.update(user_id.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }
}
