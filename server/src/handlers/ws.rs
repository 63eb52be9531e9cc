//! WebSocket-Endpunkte fuer Hub und Raeume
//!
//! Die Anmeldung prueft die Middleware vor dem Upgrade. Danach uebernimmt
//! die jeweilige Signaling-Sitzung den Socket.

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    response::Response,
    Extension,
};
use futures_util::StreamExt;
use treffpunkt_auth::AngemeldeterBenutzer;
use treffpunkt_signaling::{hub_sitzung, raum_sitzung};

use crate::error::{ApiError, ApiResult};
use crate::handlers::room_id_parsen;
use crate::state::AppState;

/// GET /rooms/:room_id/join
pub async fn raum_beitreten(
    State(state): State<AppState>,
    Extension(benutzer): Extension<AngemeldeterBenutzer>,
    Path(room_id): Path<String>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let room_id = room_id_parsen(&room_id)?;
    let signaling = state.signaling.clone();
    let user_id = benutzer.user_id;

    Ok(ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        let ende = raum_sitzung(&signaling, room_id.clone(), user_id.clone(), sink, stream).await;
        tracing::debug!(room_id = %room_id, user_id = %user_id, ende = %ende, "Raum-Socket beendet");
    }))
}

/// GET /hub/join
pub async fn hub_beitreten(
    State(state): State<AppState>,
    Extension(benutzer): Extension<AngemeldeterBenutzer>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    if !state.benutzer.existiert(&benutzer.user_id).await? {
        return Err(ApiError::nicht_gefunden(format!(
            "Benutzer {}",
            benutzer.user_id
        )));
    }

    let signaling = state.signaling.clone();
    let user_id = benutzer.user_id;

    Ok(ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        let ende = hub_sitzung(&signaling, user_id.clone(), sink, stream).await;
        tracing::debug!(user_id = %user_id, ende = %ende, "Hub-Socket beendet");
    }))
}
