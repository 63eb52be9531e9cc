//! SQLite-Implementierung des RaumRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use treffpunkt_core::{RoomId, UserId};

use crate::error::DbError;
use crate::models::RaumRecord;
use crate::repository::{DbResult, RaumRepository};
use crate::sqlite::parse_datetime;
use crate::sqlite::pool::SqliteDb;

#[async_trait]
impl RaumRepository for SqliteDb {
    async fn erstellen(&self, name: &str, owner: &UserId) -> DbResult<RaumRecord> {
        let room_id = RoomId::generieren();
        let jetzt = Utc::now();

        sqlx::query(
            "INSERT INTO rooms (room_id, name, owner_id, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(room_id.as_str())
        .bind(name)
        .bind(owner.as_str())
        .bind(jetzt.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let fehler = DbError::Sqlx(e);
            if fehler.ist_fremdschluessel() {
                DbError::nicht_gefunden(format!("Besitzer {owner}"))
            } else {
                fehler
            }
        })?;

        tracing::debug!(room_id = %room_id, owner = %owner, "Raum angelegt");

        Ok(RaumRecord {
            room_id,
            name: name.to_string(),
            owner: owner.clone(),
            peers: Vec::new(),
            created: jetzt,
        })
    }

    async fn laden(&self, room_id: &RoomId) -> DbResult<Option<RaumRecord>> {
        let row = sqlx::query(
            "SELECT room_id, name, owner_id, created_at FROM rooms WHERE room_id = ?",
        )
        .bind(room_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            None => return Ok(None),
            Some(r) => r,
        };

        let peers: Vec<String> = sqlx::query_scalar(
            "SELECT user_id FROM room_peers WHERE room_id = ? ORDER BY joined_at, user_id",
        )
        .bind(room_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        row_to_raum(&row, peers.into_iter().map(UserId::neu).collect()).map(Some)
    }

    async fn alle(&self) -> DbResult<Vec<RaumRecord>> {
        let rows = sqlx::query(
            "SELECT room_id, name, owner_id, created_at FROM rooms ORDER BY created_at, room_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let peer_rows = sqlx::query(
            "SELECT room_id, user_id FROM room_peers ORDER BY joined_at, user_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut peers_je_raum: HashMap<String, Vec<UserId>> = HashMap::new();
        for r in &peer_rows {
            let room_id: String = r.try_get("room_id")?;
            let user_id: String = r.try_get("user_id")?;
            peers_je_raum
                .entry(room_id)
                .or_default()
                .push(UserId::neu(user_id));
        }

        rows.iter()
            .map(|r| {
                let room_id: String = r.try_get("room_id")?;
                let peers = peers_je_raum.remove(&room_id).unwrap_or_default();
                row_to_raum(r, peers)
            })
            .collect()
    }

    async fn peer_hinzufuegen(&self, room_id: &RoomId, user_id: &UserId) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let existiert = sqlx::query("SELECT 1 FROM rooms WHERE room_id = ?")
            .bind(room_id.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

        if !existiert {
            tx.rollback().await?;
            return Ok(false);
        }

        // Mengen-Semantik: ein zweiter Beitritt aendert nichts
        sqlx::query(
            "INSERT OR IGNORE INTO room_peers (room_id, user_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(room_id.as_str())
        .bind(user_id.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn peer_entfernen(&self, room_id: &RoomId, user_id: &UserId) -> DbResult<()> {
        sqlx::query("DELETE FROM room_peers WHERE room_id = ? AND user_id = ?")
            .bind(room_id.as_str())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_raum(row: &sqlx::sqlite::SqliteRow, peers: Vec<UserId>) -> DbResult<RaumRecord> {
    let room_id: String = row.try_get("room_id")?;
    let owner: String = row.try_get("owner_id")?;
    Ok(RaumRecord {
        room_id: RoomId::neu(room_id),
        name: row.try_get("name")?,
        owner: UserId::neu(owner),
        peers,
        created: parse_datetime(row, "created_at")?,
    })
}
