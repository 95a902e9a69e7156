//! Download of remote tracks before playback

use reqwest::Url;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};

/// Downloads a remote file into a local directory
pub struct RemoteFetcher {
    client: reqwest::Client,
    download_dir: PathBuf,
}

impl RemoteFetcher {
    pub fn new(download_dir: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            download_dir,
        }
    }

    /// Fetch `url` and return the path it was saved to
    pub async fn fetch(&self, url: &str) -> Result<PathBuf> {
        let target = download_target(&self.download_dir, url)?;

        let response = self.client.get(url).send().await?.error_for_status()?;
        let data = response.bytes().await?;
        info!("Fetched {} bytes from {}", data.len(), url);

        tokio::fs::create_dir_all(&self.download_dir).await?;
        tokio::fs::write(&target, &data).await?;
        info!("File saved to {}", target.display());

        Ok(target)
    }
}

/// Local path for `url`: the last path segment inside `dir`
pub fn download_target(dir: &Path, url: &str) -> Result<PathBuf> {
    let parsed = Url::parse(url).map_err(|e| Error::BadRequest(format!("Invalid URL: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::BadRequest(format!(
            "Unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }

    // file_name() drops anything that is not a plain final component ("..", "/")
    let file_name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|segment| Path::new(segment).file_name())
        .map(|name| name.to_os_string())
        .ok_or_else(|| Error::BadRequest("URL does not name a file".to_string()))?;

    Ok(dir.join(file_name))
}
