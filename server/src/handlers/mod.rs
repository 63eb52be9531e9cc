//! HTTP- und WebSocket-Handler

pub mod auth;
pub mod invites;
pub mod rooms;
pub mod rtc;
pub mod users;
pub mod ws;

use treffpunkt_core::{RoomId, UserId};

use crate::error::{ApiError, ApiResult};

/// Prueft eine Benutzer-ID aus Pfad oder Body
pub(crate) fn user_id_parsen(wert: &str) -> ApiResult<UserId> {
    UserId::parsen(wert).map_err(|e| ApiError::ungueltig(e.to_string()))
}

/// Prueft eine Raum-ID aus Pfad oder Body
pub(crate) fn room_id_parsen(wert: &str) -> ApiResult<RoomId> {
    RoomId::parsen(wert).map_err(|e| ApiError::ungueltig(e.to_string()))
}
