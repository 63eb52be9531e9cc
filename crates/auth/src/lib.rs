//! treffpunkt-auth – Session-Store und Auth-Middleware
//!
//! Dieses Crate implementiert:
//! - Kurzlebige Bearer-Tokens, abgeleitet aus einem Prozess-Geheimnis
//! - Lazy Expiry (abgelaufene Tokens werden bei der naechsten Pruefung geloescht)
//! - Axum-Middleware, die den Token aus dem `Authorization`-Header prueft

pub mod error;
pub mod middleware;
pub mod session;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use middleware::{
    anmeldung_pruefen, auth_fehler_antwort, auth_status, sitzung_pruefen, token_aus_headers,
    AngemeldeterBenutzer, SessionQuelle,
};
pub use session::{Session, SessionStore};
