use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use copycloud_api::storage::Storage;
use copycloud_db::Database;

/// Background task that purges expired rooms.
///
/// Runs once immediately, then every `every`. Each pass deletes the uploads
/// of expired image items, then the expired rooms themselves (items cascade).
/// Errors are logged and the loop keeps going.
pub async fn run_sweep_loop(db: Arc<Database>, storage: Arc<Storage>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match sweep_expired(&db, &storage, Utc::now()).await {
            Ok(count) if count > 0 => info!("Sweep: deleted {} expired room(s)", count),
            Ok(_) => debug!("Sweep: nothing expired"),
            Err(e) => warn!("Sweep error: {:#}", e),
        }
    }
}

/// One purge pass as of `now`. Returns the number of rooms deleted.
pub async fn sweep_expired(
    db: &Arc<Database>,
    storage: &Storage,
    now: DateTime<Utc>,
) -> anyhow::Result<usize> {
    let uploads = {
        let db = db.clone();
        tokio::task::spawn_blocking(move || db.expired_uploads(now)).await??
    };

    for name in &uploads {
        // A leftover file is harmless; never let it block the purge
        if let Err(e) = storage.delete_file(name).await {
            warn!("Sweep: could not delete upload {}: {:#}", name, e);
        }
    }

    let db = db.clone();
    let purged = tokio::task::spawn_blocking(move || db.purge_expired_rooms(now)).await??;
    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use copycloud_db::models::NewItem;
    use copycloud_types::models::ContentType;
    use tempfile::TempDir;

    async fn fixtures() -> (Arc<Database>, Arc<Storage>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());
        let storage = Arc::new(Storage::new(dir.path().join("uploads")).await.unwrap());
        (db, storage, dir)
    }

    #[tokio::test]
    async fn sweep_purges_expired_rooms_and_files() {
        let (db, storage, _dir) = fixtures().await;
        let start = Utc::now();

        storage.save("old.png", b"old").await.unwrap();
        storage.save("new.png", b"new").await.unwrap();

        let (old, _) = db
            .create_room(false, Some(NewItem::image("old.png", "a.png")), start)
            .unwrap();
        db.append_item(&old.code, NewItem::text(ContentType::Text, "caption"), start)
            .unwrap()
            .unwrap();
        let (fresh, _) = db
            .create_room(
                false,
                Some(NewItem::image("new.png", "b.png")),
                start + ChronoDuration::minutes(4),
            )
            .unwrap();

        let at = old.expires_at;
        assert_eq!(sweep_expired(&db, &storage, at).await.unwrap(), 1);

        assert!(!storage.file_path("old.png").unwrap().exists());
        assert!(storage.file_path("new.png").unwrap().exists());
        assert!(db.get_room(&fresh.code, at).unwrap().is_some());
    }

    #[tokio::test]
    async fn second_sweep_is_a_no_op() {
        let (db, storage, _dir) = fixtures().await;
        let start = Utc::now();
        db.create_room(false, Some(NewItem::text(ContentType::Text, "x")), start)
            .unwrap();
        db.create_room(true, None, start).unwrap();

        let at = start + ChronoDuration::minutes(5);
        assert_eq!(sweep_expired(&db, &storage, at).await.unwrap(), 2);
        assert_eq!(sweep_expired(&db, &storage, at).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_upload_does_not_stop_sweep() {
        let (db, storage, _dir) = fixtures().await;
        let start = Utc::now();
        db.create_room(false, Some(NewItem::image("gone.jpg", "gone.jpg")), start)
            .unwrap();

        let at = start + ChronoDuration::minutes(6);
        assert_eq!(sweep_expired(&db, &storage, at).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn live_rooms_survive() {
        let (db, storage, _dir) = fixtures().await;
        let start = Utc::now();
        let (room, _) = db.create_room(false, None, start).unwrap();

        let at = start + ChronoDuration::minutes(4);
        assert_eq!(sweep_expired(&db, &storage, at).await.unwrap(), 0);
        assert!(db.find_active_room(&room.code, at).unwrap().is_some());
    }

    #[tokio::test]
    async fn loop_sweeps_immediately_on_start() {
        let (db, storage, _dir) = fixtures().await;
        db.create_room(false, None, Utc::now() - ChronoDuration::minutes(10))
            .unwrap();

        let room_count = |db: &Database| -> i64 {
            db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM rooms", [], |r| r.get(0))?))
                .unwrap()
        };

        // The next tick is an hour away, so only the first pass can purge
        let task = tokio::spawn(run_sweep_loop(
            db.clone(),
            storage.clone(),
            Duration::from_secs(3600),
        ));

        let mut remaining = room_count(&db);
        for _ in 0..200 {
            if remaining == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            remaining = room_count(&db);
        }
        task.abort();

        assert_eq!(remaining, 0);
    }
}
