//! Music library: folder scanning and tag import
//!
//! A scan reports one entry per music file found. Files whose tags cannot be
//! read are reported inline as `{file, error}` and do not abort the scan.

pub mod metadata;
pub mod scanner;

pub use metadata::MetadataExtractor;
pub use scanner::{is_music_file, MusicScanner, MUSIC_EXTENSIONS};

use serde::Serialize;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

use crate::db::{self, NewTrack};
use crate::error::Result;

/// Outcome for one scanned file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScanOutcome {
    Track(NewTrack),
    Failed { file: String, error: String },
}

/// Scan `folder` and extract metadata for every music file in it
///
/// Blocking file I/O runs on the blocking pool.
pub async fn scan_folder(folder: PathBuf, artwork_dir: PathBuf) -> Result<Vec<ScanOutcome>> {
    tokio::task::spawn_blocking(move || scan_folder_blocking(&folder, &artwork_dir))
        .await
        .map_err(|e| crate::error::Error::Internal(format!("Scan task failed: {}", e)))?
}

fn scan_folder_blocking(folder: &Path, artwork_dir: &Path) -> Result<Vec<ScanOutcome>> {
    let files = MusicScanner::new().scan(folder)?;
    let extractor = MetadataExtractor::new(artwork_dir);

    let outcomes = files
        .into_iter()
        .map(|file| match extractor.extract(&file) {
            Ok(track) => ScanOutcome::Track(track),
            Err(e) => {
                tracing::error!("Error parsing file \"{}\": {}", file.display(), e);
                ScanOutcome::Failed {
                    file: file.to_string_lossy().into_owned(),
                    error: e.to_string(),
                }
            }
        })
        .collect();

    Ok(outcomes)
}

/// Insert every successfully scanned track; returns how many were added
pub async fn import(pool: &SqlitePool, outcomes: &[ScanOutcome]) -> Result<usize> {
    let mut added = 0;
    for outcome in outcomes {
        if let ScanOutcome::Track(track) = outcome {
            db::insert_track(pool, track).await?;
            added += 1;
        }
    }
    tracing::info!("Imported {} tracks into the library", added);
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unreadable_files_reported_inline() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.mp3"), b"not audio").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"skip me").unwrap();

        let outcomes = scan_folder(dir.path().to_path_buf(), dir.path().join("art"))
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);

        let value = serde_json::to_value(&outcomes[0]).unwrap();
        assert_eq!(value["file"], json!(dir.path().join("bad.mp3").to_string_lossy()));
        assert!(value["error"].is_string());
    }

    #[tokio::test]
    async fn test_import_skips_failures() {
        let pool = db::memory_pool().await;
        let outcomes = vec![ScanOutcome::Failed {
            file: "/music/bad.mp3".to_string(),
            error: "boom".to_string(),
        }];
        assert_eq!(import(&pool, &outcomes).await.unwrap(), 0);
    }
}
