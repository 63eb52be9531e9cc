//! SQLite-Implementierung des EinladungRepository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use treffpunkt_core::{RoomId, UserId};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::EinladungRecord;
use crate::repository::{DbResult, EinladungRepository};
use crate::sqlite::parse_datetime;
use crate::sqlite::pool::SqliteDb;

#[async_trait]
impl EinladungRepository for SqliteDb {
    async fn erstellen(
        &self,
        from: &UserId,
        to: &UserId,
        room_id: &RoomId,
    ) -> DbResult<EinladungRecord> {
        let id = Uuid::new_v4();
        let jetzt = Utc::now();

        sqlx::query(
            "INSERT INTO invites (id, from_user, to_user, room_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(room_id.as_str())
        .bind(jetzt.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let fehler = DbError::Sqlx(e);
            if fehler.ist_fremdschluessel() {
                DbError::nicht_gefunden(format!("Empfaenger {to} oder Raum {room_id}"))
            } else {
                fehler
            }
        })?;

        Ok(EinladungRecord {
            id,
            from: from.clone(),
            to: to.clone(),
            room_id: room_id.clone(),
            created: jetzt,
        })
    }

    async fn fuer_benutzer(&self, to: &UserId) -> DbResult<Vec<EinladungRecord>> {
        let rows = sqlx::query(
            "SELECT id, from_user, to_user, room_id, created_at
             FROM invites WHERE to_user = ?
             ORDER BY created_at DESC",
        )
        .bind(to.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_einladung).collect()
    }
}

fn row_to_einladung(row: &sqlx::sqlite::SqliteRow) -> DbResult<EinladungRecord> {
    let id: String = row.try_get("id")?;
    let from: String = row.try_get("from_user")?;
    let to: String = row.try_get("to_user")?;
    let room_id: String = row.try_get("room_id")?;
    Ok(EinladungRecord {
        id: Uuid::parse_str(&id)
            .map_err(|e| DbError::intern(format!("Ungueltige UUID in 'id': {e}")))?,
        from: UserId::neu(from),
        to: UserId::neu(to),
        room_id: RoomId::neu(room_id),
        created: parse_datetime(row, "created_at")?,
    })
}
