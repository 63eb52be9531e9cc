//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod invites;
pub mod pool;
pub mod rooms;
pub mod users;

pub use pool::SqliteDb;

use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::Row;

use crate::error::DbError;
use crate::repository::DbResult;

/// SHA-256 ueber die Verkettung aller Teile, Hex-kodiert
pub(crate) fn sha256_hex(teile: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for teil in teile {
        hasher.update(teil);
    }
    hex::encode(hasher.finalize())
}

pub(crate) fn parse_datetime(
    row: &sqlx::sqlite::SqliteRow,
    col: &str,
) -> DbResult<chrono::DateTime<Utc>> {
    let s: String = row.try_get(col)?;
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige DateTime in '{col}': {e}")))
}

pub(crate) fn parse_opt_datetime(
    row: &sqlx::sqlite::SqliteRow,
    col: &str,
) -> DbResult<Option<chrono::DateTime<Utc>>> {
    let s: Option<String> = row.try_get(col)?;
    s.as_deref()
        .map(|v| {
            chrono::DateTime::parse_from_rfc3339(v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DbError::intern(format!("Ungueltige DateTime in '{col}': {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_ist_verkettung() {
        assert_eq!(sha256_hex(&[b"ab", b"c"]), sha256_hex(&[b"abc"]));
        assert_eq!(sha256_hex(&[b"abc"]).len(), 64);
    }
}
