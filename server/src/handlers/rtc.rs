use axum::{extract::State, Json};
use treffpunkt_signaling::RtcKonfig;

use crate::state::AppState;

/// GET /config/rtc
pub async fn rtc_konfig(State(state): State<AppState>) -> Json<RtcKonfig> {
    Json(state.rtc().clone())
}
