//! Embedded schema migrations.

use anyhow::anyhow;
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Embedded Diesel migrations bundled with this crate (`banners`, `showings`).
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending migrations on the SQLite database at `url`.
///
/// Sets the journal mode to WAL first. Returns the names of the migrations
/// that were applied (empty when the schema was already current).
pub fn run_sqlite(url: &str) -> anyhow::Result<Vec<String>> {
    let mut conn = SqliteConnection::establish(url)?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>();
    tracing::info!(url, applied = applied.len(), "migrations up to date");
    Ok(applied)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn migrations_apply_on_temp_file_and_are_idempotent() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();

        let first = run_sqlite(&path).expect("migration run");
        assert_eq!(first.len(), 1);
        let second = run_sqlite(&path).expect("second run");
        assert!(second.is_empty());

        let mut conn = SqliteConnection::establish(&path).unwrap();
        conn.batch_execute(
            "INSERT INTO banners
                 (name, company_name, date_start, date_end, min_showings, max_showings)
             VALUES ('b', 'c', '01.01.2024', '31.01.2024', 1, 2)",
        )
        .unwrap();
        // max below min violates the CHECK constraint
        assert!(
            conn.batch_execute(
                "INSERT INTO banners
                     (name, company_name, date_start, date_end, min_showings, max_showings)
                 VALUES ('b', 'c', '01.01.2024', '31.01.2024', 3, 2)",
            )
            .is_err()
        );
    }
}
