use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ingredients (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            inci_name          TEXT NOT NULL UNIQUE COLLATE NOCASE,
            aliases            TEXT NOT NULL DEFAULT '',
            category           TEXT NOT NULL DEFAULT 'Unknown',
            safety_rating      INTEGER NOT NULL DEFAULT 1 CHECK (safety_rating >= 0),
            comedogenic_rating INTEGER NOT NULL DEFAULT 0
                               CHECK (comedogenic_rating BETWEEN 0 AND 5),
            pregnancy_safe     INTEGER,
            mechanism          TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS interactions (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            ingredient_a INTEGER NOT NULL REFERENCES ingredients(id),
            ingredient_b INTEGER NOT NULL REFERENCES ingredients(id),
            kind         TEXT NOT NULL,
            severity     TEXT NOT NULL,
            advice       TEXT NOT NULL DEFAULT '',
            citation     TEXT,
            CHECK (ingredient_a <> ingredient_b)
        );

        CREATE TABLE IF NOT EXISTS scan_history (
            id         TEXT PRIMARY KEY,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            detected   TEXT NOT NULL,
            routine    TEXT,
            skin_type  TEXT NOT NULL,
            pregnant   INTEGER NOT NULL DEFAULT 0,
            label      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_scan_created ON scan_history(created_at);
        ",
    )?;

    // One rule per unordered pair
    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_interaction_pair
         ON interactions(min(ingredient_a, ingredient_b), max(ingredient_a, ingredient_b));",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    tracing::debug!(version = SCHEMA_VERSION, "schema initialized");
    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        for table in &["metadata", "ingredients", "interactions", "scan_history"] {
            let count: i64 = conn
                .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, 0, "table {table} should exist and be empty");
        }
    }

    #[test]
    fn test_schema_version_set() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_idempotent_initialize() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn test_busy_timeout_set() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);
    }

    #[test]
    fn test_name_unique_case_insensitive() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        conn.execute("INSERT INTO ingredients (inci_name) VALUES ('Retinol')", [])
            .unwrap();
        let dup = conn.execute("INSERT INTO ingredients (inci_name) VALUES ('RETINOL')", []);
        assert!(dup.is_err());
    }

    #[test]
    fn test_pair_unique_in_either_order() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        conn.execute_batch(
            "INSERT INTO ingredients (id, inci_name) VALUES (1, 'Retinol'), (2, 'Ascorbic Acid');
             INSERT INTO interactions (ingredient_a, ingredient_b, kind, severity)
             VALUES (1, 2, 'CONFLICT', 'HIGH');",
        )
        .unwrap();
        let reversed = conn.execute(
            "INSERT INTO interactions (ingredient_a, ingredient_b, kind, severity)
             VALUES (2, 1, 'SYNERGY', 'LOW')",
            [],
        );
        assert!(reversed.is_err());

        let self_pair = conn.execute(
            "INSERT INTO interactions (ingredient_a, ingredient_b, kind, severity)
             VALUES (1, 1, 'CAUTION', 'LOW')",
            [],
        );
        assert!(self_pair.is_err());
    }

    #[test]
    fn test_comedogenic_range_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let bad = conn.execute(
            "INSERT INTO ingredients (inci_name, comedogenic_rating) VALUES ('Lanolin', 6)",
            [],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_reinitialize_keeps_rows() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO ingredients (id, inci_name) VALUES (1, 'Retinol'), (2, 'Niacinamide');
             INSERT INTO interactions (ingredient_a, ingredient_b, kind, severity, citation)
             VALUES (1, 2, 'SYNERGY', 'LOW', 'NCBI');",
        )
        .unwrap();

        initialize(&conn).unwrap();

        let citation: String = conn
            .query_row("SELECT citation FROM interactions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(citation, "NCBI");
        assert_eq!(get_schema_version(&conn).unwrap(), Some(1));
    }
}
