//! Recursive music file discovery

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};

/// Extensions treated as music files (compared case-insensitively)
pub const MUSIC_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "m4a"];

/// Finds music files below a root directory
pub struct MusicScanner {
    ignore_patterns: Vec<String>,
}

impl MusicScanner {
    /// Create a scanner that skips common system and VCS entries
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
                "node_modules".to_string(),
            ],
        }
    }

    /// All music files under `root`, sorted by path
    ///
    /// Unreadable entries are logged and skipped; the scan continues.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(Error::NotFound(format!("Folder not found: {}", root.display())));
        }
        if !root.is_dir() {
            return Err(Error::BadRequest(format!("Not a directory: {}", root.display())));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_ignored(e));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_music_file(entry.path()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Error accessing entry: {}", e),
            }
        }

        tracing::debug!(root = %root.display(), found = files.len(), "Music scan complete");
        Ok(files)
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        self.ignore_patterns.iter().any(|p| name == p.as_str())
    }
}

impl Default for MusicScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// True if the extension is one of [`MUSIC_EXTENSIONS`]
pub fn is_music_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MUSIC_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
        .unwrap_or(false)
}
