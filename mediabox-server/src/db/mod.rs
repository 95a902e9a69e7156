//! Database access layer
//!
//! The media library lives in a single SQLite table, created on first start.

pub mod library;

use crate::error::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::info;

pub use library::{insert_track, list_tracks, NewTrack, Track};

/// Open (creating if needed) the library database and ensure its schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Create the `library` table if it does not exist (idempotent)
pub async fn ensure_schema(db: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS library (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            artist TEXT,
            album TEXT,
            genre TEXT,
            duration INTEGER NOT NULL,
            file_path TEXT,
            url TEXT,
            track_number INTEGER,
            release_date TEXT,
            play_count INTEGER NOT NULL DEFAULT 0,
            last_played TEXT,
            rating INTEGER,
            lyrics TEXT,
            is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
            artwork_path TEXT,
            bitrate INTEGER,
            sample_rate INTEGER,
            codec TEXT,
            added_date TEXT NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    info!("Table \"library\" created or already exists");
    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // One connection: every connection to :memory: is a separate database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();
    pool
}
