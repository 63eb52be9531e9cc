//! Einladungen verschicken und abfragen

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::json;
use treffpunkt_auth::AngemeldeterBenutzer;
use treffpunkt_db::{EinladungRecord, EinladungRepository};

use crate::error::{ApiError, ApiResult};
use crate::handlers::{room_id_parsen, user_id_parsen};
use crate::state::AppState;

/// Hub-Event fuer neue Einladungen
pub const EVENT_INVITE: &str = "invite";

#[derive(Debug, Deserialize)]
pub struct EinladungBody {
    pub to: String,
    #[serde(rename = "roomID")]
    pub room_id: String,
}

/// POST /invite
///
/// Speichert die Einladung und benachrichtigt den Empfaenger ueber den Hub,
/// falls er gerade verbunden ist.
pub async fn einladen(
    State(state): State<AppState>,
    Extension(benutzer): Extension<AngemeldeterBenutzer>,
    Json(body): Json<EinladungBody>,
) -> ApiResult<(StatusCode, Json<EinladungRecord>)> {
    let to = user_id_parsen(&body.to)?;
    let room_id = room_id_parsen(&body.room_id)?;
    if to == benutzer.user_id {
        return Err(ApiError::ungueltig("Selbsteinladung ist nicht moeglich"));
    }

    let einladung = EinladungRepository::erstellen(
        state.einladungen.as_ref(),
        &benutzer.user_id,
        &to,
        &room_id,
    )
    .await?;

    let nachricht = json!({ "roomID": room_id, "from": benutzer.user_id });
    match state.signaling.hub.senden_an(&to, EVENT_INVITE, nachricht) {
        Ok(()) => tracing::debug!(to = %to, room_id = %room_id, "Einladung zugestellt"),
        Err(e) => tracing::debug!(to = %to, fehler = %e, "Einladung nicht live zugestellt"),
    }

    Ok((StatusCode::CREATED, Json(einladung)))
}

/// GET /invites – Einladungen an den angemeldeten Benutzer
pub async fn einladungen_auflisten(
    State(state): State<AppState>,
    Extension(benutzer): Extension<AngemeldeterBenutzer>,
) -> ApiResult<Json<Vec<EinladungRecord>>> {
    Ok(Json(state.einladungen.fuer_benutzer(&benutzer.user_id).await?))
}
