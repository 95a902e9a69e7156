//! Tag and stream property extraction for library entries

use chrono::Utc;
use lofty::file::{FileType, TaggedFileExt};
use lofty::picture::{MimeType, Picture};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use std::path::{Path, PathBuf};

use crate::db::NewTrack;
use crate::error::{Error, Result};

const UNKNOWN: &str = "Unknown";

/// Reads a music file's tags into a [`NewTrack`]
pub struct MetadataExtractor {
    artwork_dir: PathBuf,
}

impl MetadataExtractor {
    /// Embedded cover art is written below `artwork_dir`
    pub fn new(artwork_dir: impl Into<PathBuf>) -> Self {
        Self {
            artwork_dir: artwork_dir.into(),
        }
    }

    pub fn extract(&self, file_path: &Path) -> Result<NewTrack> {
        let tagged_file = Probe::open(file_path)
            .and_then(|probe| probe.read())
            .map_err(|e| Error::BadRequest(format!("Failed to read {}: {}", file_path.display(), e)))?;

        let properties = tagged_file.properties();
        let codec = codec_name(tagged_file.file_type());
        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

        let text = |value: Option<std::borrow::Cow<'_, str>>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string())
        };

        let artwork_path = match tag.and_then(|t| t.pictures().first()) {
            Some(picture) => match self.save_artwork(picture) {
                Ok(path) => Some(path.to_string_lossy().into_owned()),
                Err(e) => {
                    tracing::warn!(file = %file_path.display(), "Failed to save artwork: {}", e);
                    None
                }
            },
            None => None,
        };

        let track = NewTrack {
            title: text(tag.and_then(|t| t.title())),
            artist: text(tag.and_then(|t| t.artist())),
            album: text(tag.and_then(|t| t.album())),
            genre: text(tag.and_then(|t| t.genre())),
            duration: properties.duration().as_secs() as i64,
            file_path: Some(file_path.to_string_lossy().into_owned()),
            url: None,
            track_number: tag.and_then(|t| t.track()).map(i64::from),
            release_date: tag.and_then(|t| t.year()).map(|y| y.to_string()),
            play_count: 0,
            last_played: None,
            rating: None,
            lyrics: tag
                .and_then(|t| t.get_string(&ItemKey::Lyrics))
                .map(str::to_string),
            is_favorite: false,
            artwork_path,
            bitrate: properties.audio_bitrate().map(i64::from),
            sample_rate: properties.sample_rate().map(i64::from),
            codec: codec.to_string(),
            added_date: Utc::now().to_rfc3339(),
        };

        tracing::debug!(
            file = %file_path.display(),
            title = %track.title,
            artist = %track.artist,
            duration_s = track.duration,
            codec = %track.codec,
            "Extracted metadata"
        );

        Ok(track)
    }

    fn save_artwork(&self, picture: &Picture) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.artwork_dir)?;
        let extension = picture.mime_type().map(artwork_extension).unwrap_or("bin");
        let name = format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4().simple(),
            extension
        );
        let path = self.artwork_dir.join(name);
        std::fs::write(&path, picture.data())?;
        Ok(path)
    }
}

fn codec_name(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Mpeg => "MP3",
        FileType::Flac => "FLAC",
        FileType::Opus => "Opus",
        FileType::Vorbis => "OGG Vorbis",
        FileType::Aac => "AAC",
        FileType::Mp4 => "MPEG-4",
        FileType::Aiff => "AIFF",
        FileType::Wav => "WAV",
        FileType::WavPack => "WavPack",
        _ => UNKNOWN,
    }
}

fn artwork_extension(mime: &MimeType) -> &'static str {
    match mime {
        MimeType::Png => "png",
        MimeType::Jpeg => "jpeg",
        MimeType::Gif => "gif",
        MimeType::Bmp => "bmp",
        MimeType::Tiff => "tiff",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_nonexistent_file() {
        let extractor = MetadataExtractor::new("/tmp/artwork");
        assert!(extractor.extract(Path::new("/nonexistent/file.mp3")).is_err());
    }

    #[test]
    fn test_extract_garbage_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let extractor = MetadataExtractor::new(dir.path().join("art"));
        assert!(extractor.extract(&path).is_err());
    }

    #[test]
    fn test_codec_names() {
        assert_eq!(codec_name(FileType::Mpeg), "MP3");
        assert_eq!(codec_name(FileType::Flac), "FLAC");
        assert_eq!(artwork_extension(&MimeType::Png), "png");
    }
}
