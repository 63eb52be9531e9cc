//! Raeume anlegen und abfragen

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use treffpunkt_auth::AngemeldeterBenutzer;
use treffpunkt_core::RoomId;
use treffpunkt_db::{RaumRecord, RaumRepository};

use crate::error::{ApiError, ApiResult};
use crate::handlers::room_id_parsen;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RaumErstellenBody {
    #[serde(rename = "roomName")]
    pub room_name: String,
}

#[derive(Debug, Serialize)]
pub struct RaumErstelltAntwort {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
}

/// POST /rooms
pub async fn raum_erstellen(
    State(state): State<AppState>,
    Extension(benutzer): Extension<AngemeldeterBenutzer>,
    Json(body): Json<RaumErstellenBody>,
) -> ApiResult<(StatusCode, Json<RaumErstelltAntwort>)> {
    let name = body.room_name.trim();
    if name.is_empty() {
        return Err(ApiError::ungueltig("Raumname darf nicht leer sein"));
    }

    let raum = RaumRepository::erstellen(state.raeume.as_ref(), name, &benutzer.user_id).await?;
    tracing::info!(room_id = %raum.room_id, owner = %benutzer.user_id, "Raum angelegt");
    Ok((
        StatusCode::CREATED,
        Json(RaumErstelltAntwort {
            room_id: raum.room_id,
        }),
    ))
}

/// GET /rooms
pub async fn raeume_auflisten(State(state): State<AppState>) -> ApiResult<Json<Vec<RaumRecord>>> {
    Ok(Json(state.raeume.alle().await?))
}

/// GET /rooms/:room_id – 204 wenn der Raum nicht existiert
pub async fn raum_laden(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> ApiResult<Response> {
    let room_id = room_id_parsen(&room_id)?;
    match RaumRepository::laden(state.raeume.as_ref(), &room_id).await? {
        Some(raum) => Ok(Json(raum).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
