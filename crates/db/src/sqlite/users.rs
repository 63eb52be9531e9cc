//! SQLite-Implementierung des BenutzerRepository

use async_trait::async_trait;
use chrono::Utc;
use rand::{rngs::OsRng, RngCore};
use sqlx::Row;
use treffpunkt_core::UserId;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::BenutzerRecord;
use crate::repository::{BenutzerRepository, DbResult};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_datetime, parse_opt_datetime, sha256_hex};

#[async_trait]
impl BenutzerRepository for SqliteDb {
    async fn erstellen(&self, name: &str) -> DbResult<BenutzerRecord> {
        let jetzt = Utc::now();
        let jetzt_str = jetzt.to_rfc3339();

        let mut zufall = [0u8; 32];
        OsRng.fill_bytes(&mut zufall);

        let user_id = sha256_hex(&[
            Uuid::new_v4().as_bytes().as_slice(),
            name.as_bytes(),
            jetzt_str.as_bytes(),
        ]);
        let secret_key = sha256_hex(&[user_id.as_bytes(), &zufall[..]]);

        sqlx::query(
            "INSERT INTO users (user_id, name, secret_key, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&user_id)
        .bind(name)
        .bind(&secret_key)
        .bind(&jetzt_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit(format!("Benutzer-ID fuer '{name}' bereits vergeben"))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        tracing::debug!(user_id = %user_id, "Benutzer angelegt");

        Ok(BenutzerRecord {
            user_id: UserId::neu(user_id),
            name: name.to_string(),
            secret_key,
            created: jetzt,
            last_login_at: None,
        })
    }

    async fn laden(&self, user_id: &UserId) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query(
            "SELECT user_id, name, secret_key, created_at, last_login_at
             FROM users WHERE user_id = ?",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn laden_nach_secret(&self, secret_key: &str) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query(
            "SELECT user_id, name, secret_key, created_at, last_login_at
             FROM users WHERE secret_key = ?",
        )
        .bind(secret_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn existiert(&self, user_id: &UserId) -> DbResult<bool> {
        let anzahl: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE user_id = ?")
            .bind(user_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(anzahl > 0)
    }

    async fn login_vermerken(&self, user_id: &UserId) -> DbResult<()> {
        let ergebnis = sqlx::query("UPDATE users SET last_login_at = ? WHERE user_id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;

        if ergebnis.rows_affected() == 0 {
            return Err(DbError::nicht_gefunden(format!("Benutzer {user_id}")));
        }
        Ok(())
    }
}

fn row_to_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<BenutzerRecord> {
    let user_id: String = row.try_get("user_id")?;
    Ok(BenutzerRecord {
        user_id: UserId::neu(user_id),
        name: row.try_get("name")?,
        secret_key: row.try_get("secret_key")?,
        created: parse_datetime(row, "created_at")?,
        last_login_at: parse_opt_datetime(row, "last_login_at")?,
    })
}
