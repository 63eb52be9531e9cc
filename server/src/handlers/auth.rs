//! Login und Logout

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use treffpunkt_auth::AngemeldeterBenutzer;
use treffpunkt_db::{models::OeffentlicherBenutzer, BenutzerRepository};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    /// Der beim Anlegen ausgegebene `secretKey`
    pub user: String,
}

#[derive(Debug, Serialize)]
pub struct LoginAntwort {
    pub session: String,
    pub user: OeffentlicherBenutzer,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<(StatusCode, Json<LoginAntwort>)> {
    if body.user.is_empty() {
        return Err(ApiError::ungueltig("Schluessel fehlt"));
    }

    let benutzer = state
        .benutzer
        .laden_nach_secret(&body.user)
        .await?
        .ok_or_else(|| ApiError::ungueltig("Unbekannter Schluessel"))?;

    let session = state
        .sessions
        .ausstellen(&benutzer.user_id, state.session_ttl)
        .await;

    // Ein fehlgeschlagener Zeitstempel verhindert den Login nicht
    if let Err(e) = state.benutzer.login_vermerken(&benutzer.user_id).await {
        tracing::warn!(user_id = %benutzer.user_id, fehler = %e, "Login-Zeit nicht gespeichert");
    }

    tracing::info!(user_id = %benutzer.user_id, "Login erfolgreich");
    Ok((
        StatusCode::CREATED,
        Json(LoginAntwort {
            session,
            user: benutzer.into(),
        }),
    ))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(benutzer): Extension<AngemeldeterBenutzer>,
) -> StatusCode {
    if state.sessions.invalidieren(&benutzer.token).await {
        tracing::info!(user_id = %benutzer.user_id, "Logout");
    }
    StatusCode::NO_CONTENT
}
