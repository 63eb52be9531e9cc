//! Benutzer anlegen und abfragen

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use treffpunkt_db::{models::OeffentlicherBenutzer, BenutzerRecord, BenutzerRepository};

use crate::error::{ApiError, ApiResult};
use crate::handlers::user_id_parsen;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BenutzerErstellenBody {
    pub name: String,
}

/// POST /users
///
/// Die Antwort enthaelt einmalig den `secretKey` fuer den Login.
pub async fn benutzer_erstellen(
    State(state): State<AppState>,
    Json(body): Json<BenutzerErstellenBody>,
) -> ApiResult<(StatusCode, Json<BenutzerRecord>)> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::ungueltig("Name darf nicht leer sein"));
    }

    let benutzer = BenutzerRepository::erstellen(state.benutzer.as_ref(), name).await?;
    tracing::info!(user_id = %benutzer.user_id, "Benutzer angelegt");
    Ok((StatusCode::CREATED, Json(benutzer)))
}

/// GET /users/:user_id
pub async fn benutzer_laden(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<OeffentlicherBenutzer>> {
    let user_id = user_id_parsen(&user_id)?;
    let benutzer = BenutzerRepository::laden(state.benutzer.as_ref(), &user_id)
        .await?
        .ok_or_else(|| ApiError::nicht_gefunden(format!("Benutzer {user_id}")))?;
    Ok(Json(benutzer.into()))
}
