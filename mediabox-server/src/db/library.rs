//! Library table queries

use crate::error::Result;
use serde::Serialize;
use sqlx::{FromRow, Pool, Sqlite};

/// One row of the `library` table
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Track {
    pub id: i64,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    /// Seconds
    pub duration: i64,
    pub file_path: Option<String>,
    pub url: Option<String>,
    pub track_number: Option<i64>,
    pub release_date: Option<String>,
    pub play_count: i64,
    pub last_played: Option<String>,
    pub rating: Option<i64>,
    pub lyrics: Option<String>,
    pub is_favorite: bool,
    pub artwork_path: Option<String>,
    /// kbps
    pub bitrate: Option<i64>,
    /// Hz
    pub sample_rate: Option<i64>,
    pub codec: Option<String>,
    /// RFC 3339
    pub added_date: String,
}

/// A track about to be inserted (also the per-file result of a folder scan)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub duration: i64,
    pub file_path: Option<String>,
    pub url: Option<String>,
    pub track_number: Option<i64>,
    pub release_date: Option<String>,
    pub play_count: i64,
    pub last_played: Option<String>,
    pub rating: Option<i64>,
    pub lyrics: Option<String>,
    pub is_favorite: bool,
    pub artwork_path: Option<String>,
    pub bitrate: Option<i64>,
    pub sample_rate: Option<i64>,
    pub codec: String,
    pub added_date: String,
}

/// List tracks, optionally restricted to those whose title, artist or album
/// contains `filter` (case-insensitive)
pub async fn list_tracks(db: &Pool<Sqlite>, filter: Option<&str>) -> Result<Vec<Track>> {
    let tracks = match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(filter) => {
            let pattern = format!("%{}%", escape_like(filter));
            sqlx::query_as::<_, Track>(
                r#"
                SELECT * FROM library
                WHERE title LIKE ?1 ESCAPE '\'
                   OR artist LIKE ?1 ESCAPE '\'
                   OR album LIKE ?1 ESCAPE '\'
                ORDER BY id
                "#,
            )
            .bind(pattern)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, Track>("SELECT * FROM library ORDER BY id")
                .fetch_all(db)
                .await?
        }
    };

    Ok(tracks)
}

/// Insert a track and return its row id
pub async fn insert_track(db: &Pool<Sqlite>, track: &NewTrack) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO library (
            title, artist, album, genre, duration, file_path, url,
            track_number, release_date, play_count, last_played, rating,
            lyrics, is_favorite, artwork_path, bitrate, sample_rate, codec,
            added_date
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.album)
    .bind(&track.genre)
    .bind(track.duration)
    .bind(&track.file_path)
    .bind(&track.url)
    .bind(track.track_number)
    .bind(&track.release_date)
    .bind(track.play_count)
    .bind(&track.last_played)
    .bind(track.rating)
    .bind(&track.lyrics)
    .bind(track.is_favorite)
    .bind(&track.artwork_path)
    .bind(track.bitrate)
    .bind(track.sample_rate)
    .bind(&track.codec)
    .bind(&track.added_date)
    .execute(db)
    .await?;

    let id = result.last_insert_rowid();
    tracing::debug!(id, title = %track.title, "Track added to library");
    Ok(id)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
