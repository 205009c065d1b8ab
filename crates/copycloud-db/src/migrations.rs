use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (rooms + items)");
        conn.execute_batch(
            "
            CREATE TABLE rooms (
                id          TEXT PRIMARY KEY,
                code        TEXT NOT NULL UNIQUE,
                is_secure   INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );

            CREATE INDEX idx_rooms_expires ON rooms(expires_at);

            CREATE TABLE items (
                id                  TEXT PRIMARY KEY,
                room_id             TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
                content_type        TEXT NOT NULL,
                content             TEXT NOT NULL,
                original_filename   TEXT,
                created_at          TEXT NOT NULL
            );

            CREATE INDEX idx_items_room ON items(room_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_rerunnable() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
