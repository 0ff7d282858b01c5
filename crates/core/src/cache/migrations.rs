//! Schema upgrades for the cache database.
//!
//! `_migrations` records every schema version already applied to the file.
//! On open, each newer version runs together with its ledger row in one
//! transaction, so a crash mid-upgrade leaves the previous schema intact.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Ordered schema versions. Version 1 creates `stores` and `entries`;
/// version 2 adds the lookup indexes entries are matched through.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_stores.sql")),
    (2, include_str!("../../migrations/002_entry_indexes.sql")),
];

/// Bring the schema up to the latest version. Safe to call on every open.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )?;

        let current: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
            let tx = conn.transaction()?;
            tx.execute_batch(sql).map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::debug!(version, "applied cache schema version");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let has_entries: bool = conn
            .call(|conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='entries')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();

        assert!(has_entries);
    }

    #[tokio::test]
    async fn test_migrations_version_tracking() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let count: i64 = conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0)))
            .await
            .unwrap();

        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_applies_only_newer_versions() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| -> Result<usize, tokio_rusqlite::rusqlite::Error> {
            conn.execute_batch(
                "CREATE TABLE _migrations (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL);",
            )?;
            conn.execute_batch(MIGRATIONS[0].1)?;
            conn.execute("INSERT INTO _migrations (version, applied_at) VALUES (1, 'earlier')", [])
        })
        .await
        .unwrap();

        run(&conn).await.unwrap();

        let rows: Vec<(i64, String)> = conn
            .call(|conn| -> Result<Vec<(i64, String)>, tokio_rusqlite::rusqlite::Error> {
                let mut stmt = conn.prepare("SELECT version, applied_at FROM _migrations ORDER BY version")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (1, "earlier".to_string()));
        assert_eq!(rows[1].0, 2);
    }
}
