use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use copycloud_codes::{generate_id, generate_room_code, generate_secure_token};
use copycloud_types::models::{ContentType, ROOM_TTL_SECS};

use crate::Database;
use crate::models::{ItemRow, NewItem, RoomRow, from_db_time, stored_time, to_db_time};

/// Result of deleting a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemDeletion {
    /// No room with that code exists (expired but unswept rooms still count as existing).
    RoomNotFound,
    Removed(ItemRow),
    /// The room exists but the item is not in it; deleting twice is not an error.
    AlreadyGone,
}

impl Database {
    // -- Rooms --

    /// Create a room and, optionally, its first item in one transaction.
    ///
    /// The code is picked inside the same transaction that inserts the room,
    /// so two concurrent creations can never settle on the same code.
    pub fn create_room(
        &self,
        secure: bool,
        item: Option<NewItem>,
        now: DateTime<Utc>,
    ) -> Result<(RoomRow, Option<ItemRow>)> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let code = if secure {
                generate_secure_token()?
            } else {
                generate_room_code(|candidate| code_exists(&tx, candidate))?
            };

            let created_at = stored_time(now);
            let room = RoomRow {
                id: generate_id(),
                code,
                is_secure: secure,
                created_at,
                expires_at: created_at + Duration::seconds(ROOM_TTL_SECS),
            };

            tx.execute(
                "INSERT INTO rooms (id, code, is_secure, created_at, expires_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &room.id,
                    &room.code,
                    room.is_secure,
                    to_db_time(room.created_at),
                    to_db_time(room.expires_at),
                ],
            )?;

            let item = item
                .map(|new| insert_item(&tx, &room.id, new, now))
                .transpose()?;

            tx.commit()?;
            Ok((room, item))
        })
    }

    /// Look up a room that has not yet expired at `now`.
    pub fn find_active_room(&self, code: &str, now: DateTime<Utc>) -> Result<Option<RoomRow>> {
        self.with_conn(|conn| query_active_room(conn, code, now))
    }

    /// Fetch an unexpired room with its items, oldest first.
    pub fn get_room(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(RoomRow, Vec<ItemRow>)>> {
        self.with_conn(|conn| {
            let Some(room) = query_active_room(conn, code, now)? else {
                return Ok(None);
            };
            let items = query_items(conn, &room.id)?;
            Ok(Some((room, items)))
        })
    }

    // -- Items --

    /// Add an item to an unexpired room. Returns `None` when the room is
    /// missing or expired; nothing is written in that case.
    pub fn append_item(
        &self,
        code: &str,
        item: NewItem,
        now: DateTime<Utc>,
    ) -> Result<Option<ItemRow>> {
        self.with_conn(|conn| {
            let Some(room) = query_active_room(conn, code, now)? else {
                return Ok(None);
            };
            insert_item(conn, &room.id, item, now).map(Some)
        })
    }

    /// Remove one item from the room with `code`. Does not check expiry.
    pub fn delete_item(&self, code: &str, item_id: &str) -> Result<ItemDeletion> {
        self.with_conn(|conn| {
            let room_id: Option<String> = conn
                .query_row("SELECT id FROM rooms WHERE code = ?1", [code], |row| row.get(0))
                .optional()?;
            let Some(room_id) = room_id else {
                return Ok(ItemDeletion::RoomNotFound);
            };

            let existing = conn
                .query_row(
                    "SELECT id, room_id, content_type, content, original_filename, created_at
                     FROM items WHERE id = ?1 AND room_id = ?2",
                    params![item_id, &room_id],
                    item_from_row,
                )
                .optional()?;

            match existing {
                Some(item) => {
                    conn.execute(
                        "DELETE FROM items WHERE id = ?1 AND room_id = ?2",
                        params![item_id, &room_id],
                    )?;
                    Ok(ItemDeletion::Removed(item))
                }
                None => Ok(ItemDeletion::AlreadyGone),
            }
        })
    }

    // -- Expiry --

    /// Stored filenames of image items whose room has expired at `now`.
    pub fn expired_uploads(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT i.content FROM items i
                 JOIN rooms r ON i.room_id = r.id
                 WHERE r.expires_at <= ?1 AND i.content_type = ?2",
            )?;
            let names = stmt
                .query_map(
                    params![to_db_time(now), ContentType::Image.as_str()],
                    |row| row.get::<_, String>(0),
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(names)
        })
    }

    /// Delete every room expired at `now`. Items go with them via ON DELETE CASCADE.
    pub fn purge_expired_rooms(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM rooms WHERE expires_at <= ?1",
                [to_db_time(now)],
            )?;
            Ok(deleted)
        })
    }
}

fn code_exists(conn: &Connection, code: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM rooms WHERE code = ?1", [code], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn query_active_room(conn: &Connection, code: &str, now: DateTime<Utc>) -> Result<Option<RoomRow>> {
    let room = conn
        .query_row(
            "SELECT id, code, is_secure, created_at, expires_at
             FROM rooms WHERE code = ?1 AND expires_at > ?2",
            params![code, to_db_time(now)],
            room_from_row,
        )
        .optional()?;
    Ok(room)
}

fn query_items(conn: &Connection, room_id: &str) -> Result<Vec<ItemRow>> {
    // rowid breaks ties between items created within the same millisecond
    let mut stmt = conn.prepare(
        "SELECT id, room_id, content_type, content, original_filename, created_at
         FROM items WHERE room_id = ?1
         ORDER BY created_at ASC, rowid ASC",
    )?;
    let items = stmt
        .query_map([room_id], item_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

fn insert_item(conn: &Connection, room_id: &str, new: NewItem, now: DateTime<Utc>) -> Result<ItemRow> {
    let item = ItemRow {
        id: generate_id(),
        room_id: room_id.to_string(),
        content_type: new.content_type,
        content: new.content,
        original_filename: new.original_filename,
        created_at: stored_time(now),
    };

    conn.execute(
        "INSERT INTO items (id, room_id, content_type, content, original_filename, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            &item.id,
            &item.room_id,
            item.content_type.as_str(),
            &item.content,
            &item.original_filename,
            to_db_time(item.created_at),
        ],
    )?;

    Ok(item)
}

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<RoomRow> {
    Ok(RoomRow {
        id: row.get(0)?,
        code: row.get(1)?,
        is_secure: row.get(2)?,
        created_at: from_db_time(3, &row.get::<_, String>(3)?)?,
        expires_at: from_db_time(4, &row.get::<_, String>(4)?)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ItemRow> {
    let content_type = row
        .get::<_, String>(2)?
        .parse::<ContentType>()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ItemRow {
        id: row.get(0)?,
        room_id: row.get(1)?,
        content_type,
        content: row.get(3)?,
        original_filename: row.get(4)?,
        created_at: from_db_time(5, &row.get::<_, String>(5)?)?,
    })
}
