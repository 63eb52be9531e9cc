//! HTTP-Fehlerabbildung
//!
//! Alle Handler liefern `ApiResult<T>`. Bibliotheksfehler werden hier auf
//! Statuscodes und den JSON-Body `{ "error": { "code", "message" } }`
//! abgebildet.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use treffpunkt_auth::AuthError;
use treffpunkt_db::DbError;

/// Fehler eines HTTP-Handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] DbError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn ungueltig(msg: impl Into<String>) -> Self {
        Self::UngueltigeEingabe(msg.into())
    }

    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::UngueltigeEingabe(_) => StatusCode::BAD_REQUEST,
            Self::NichtGefunden(_) => StatusCode::NOT_FOUND,
            Self::Auth(e) => treffpunkt_auth::auth_status(e),
            Self::Datenbank(DbError::NichtGefunden(_)) => StatusCode::NOT_FOUND,
            Self::Datenbank(DbError::Eindeutigkeit(_)) => StatusCode::CONFLICT,
            Self::Datenbank(DbError::UngueltigeDaten(_)) => StatusCode::BAD_REQUEST,
            Self::Datenbank(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text fuer den Client; interne Details bleiben im Log
    fn oeffentliche_meldung(&self) -> String {
        match self {
            Self::Auth(e) => e.oeffentliche_meldung().to_string(),
            Self::Datenbank(DbError::NichtGefunden(m)) => format!("Nicht gefunden: {m}"),
            Self::Datenbank(DbError::Eindeutigkeit(m)) => m.clone(),
            Self::Datenbank(DbError::UngueltigeDaten(m)) => m.clone(),
            Self::Datenbank(_) => "Interner Fehler".to_string(),
            andere => andere.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(fehler = %self, "Anfrage fehlgeschlagen");
        } else {
            tracing::debug!(fehler = %self, status = status.as_u16(), "Anfrage abgewiesen");
        }

        (
            status,
            Json(json!({
                "error": {
                    "code": status.as_u16(),
                    "message": self.oeffentliche_meldung()
                }
            })),
        )
            .into_response()
    }
}
