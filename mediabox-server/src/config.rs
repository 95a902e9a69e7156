//! mediabox configuration
//!
//! Priority: command line > environment > TOML file > compiled default.
//! Command line and environment are read by clap; the TOML file is located
//! and parsed by [`mediabox_common::config`].

use clap::Parser;
use mediabox_common::config::{default_data_dir, load_or_default};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::actions::ActionTimeouts;
use crate::error::Result;

/// Application name used for config and data directories
pub const APP_NAME: &str = "mediabox";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Command-line arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mediabox")]
#[command(about = "Media playback control server with live event streaming")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "EN_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "EN_HOST")]
    pub host: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long, env = "MEDIABOX_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub public_dir: Option<PathBuf>,
    pub views_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub media_root: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub artwork_dir: Option<PathBuf>,
    pub heartbeat_interval_secs: Option<u64>,
    pub client_buffer: Option<usize>,
    pub rate_limit_max: Option<u32>,
    pub rate_limit_window_secs: Option<u64>,
    pub quick_action_timeout_secs: Option<u64>,
    pub extended_action_timeout_secs: Option<u64>,
    pub mpv_binary: Option<String>,
    pub mpv_socket: Option<PathBuf>,
    pub pin_file: Option<PathBuf>,
    pub bluetooth_adapter: Option<String>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Static files served at `/`
    pub public_dir: PathBuf,
    /// HTML fragments served by `content/get`
    pub views_dir: PathBuf,
    pub database_path: PathBuf,
    /// Root that folder scans are confined to
    pub media_root: PathBuf,
    /// Where remote tracks are downloaded before playback
    pub download_dir: PathBuf,
    /// Directory readable through `admin/logs`
    pub log_dir: PathBuf,
    pub artwork_dir: PathBuf,
    /// Written by the Bluetooth PIN agent
    pub pin_file: PathBuf,
    pub heartbeat_interval: Duration,
    pub client_buffer: usize,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub action_timeouts: ActionTimeouts,
    pub mpv_binary: String,
    pub mpv_socket: PathBuf,
    pub bluetooth_adapter: String,
}

impl Config {
    /// Resolve configuration from arguments and the config file they point to
    pub fn load(args: &Args) -> Result<Self> {
        let file: FileConfig = load_or_default(args.config.as_deref(), APP_NAME)?;
        Ok(Self::from_parts(args, file))
    }

    /// Merge already-parsed arguments over file settings and defaults
    pub fn from_parts(args: &Args, file: FileConfig) -> Self {
        let data_dir = default_data_dir(APP_NAME);
        let defaults = ActionTimeouts::default();

        Self {
            host: args
                .host
                .clone()
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            public_dir: file.public_dir.unwrap_or_else(|| PathBuf::from("public")),
            views_dir: file.views_dir.unwrap_or_else(|| PathBuf::from("views")),
            database_path: file
                .database_path
                .unwrap_or_else(|| data_dir.join("library.db")),
            media_root: file.media_root.unwrap_or_else(|| data_dir.join("music")),
            download_dir: file
                .download_dir
                .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME)),
            log_dir: file.log_dir.unwrap_or_else(|| data_dir.join("logs")),
            artwork_dir: file.artwork_dir.unwrap_or_else(|| data_dir.join("artwork")),
            pin_file: file.pin_file.unwrap_or_else(|| data_dir.join("bt-pins")),
            heartbeat_interval: Duration::from_secs(file.heartbeat_interval_secs.unwrap_or(15).max(1)),
            client_buffer: file.client_buffer.unwrap_or(64).max(1),
            rate_limit_max: file.rate_limit_max.unwrap_or(100).max(1),
            rate_limit_window: Duration::from_secs(file.rate_limit_window_secs.unwrap_or(900).max(1)),
            action_timeouts: ActionTimeouts {
                quick: file
                    .quick_action_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.quick),
                extended: file
                    .extended_action_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.extended),
            },
            mpv_binary: file.mpv_binary.unwrap_or_else(|| "mpv".to_string()),
            mpv_socket: file
                .mpv_socket
                .unwrap_or_else(|| std::env::temp_dir().join("mediabox-mpv.sock")),
            bluetooth_adapter: file
                .bluetooth_adapter
                .unwrap_or_else(|| "/org/bluez/hci0".to_string()),
        }
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::from_parts(&Args::default(), FileConfig::default());
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.rate_limit_window, Duration::from_secs(900));
        assert_eq!(config.action_timeouts, ActionTimeouts::default());
        assert_eq!(config.mpv_binary, "mpv");
    }

    #[test]
    fn test_arguments_override_file() {
        let args = Args {
            port: Some(8080),
            host: None,
            config: None,
        };
        let file = FileConfig {
            port: Some(9000),
            host: Some("127.0.0.1".to_string()),
            ..Default::default()
        };

        let config = Config::from_parts(&args, file);
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 4000\nheartbeat_interval_secs = 5\nviews_dir = \"/srv/views\"\nquick_action_timeout_secs = 3"
        )
        .unwrap();

        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = Config::load(&args).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.views_dir, PathBuf::from("/srv/views"));
        assert_eq!(config.action_timeouts.quick, Duration::from_secs(3));
        assert_eq!(config.action_timeouts.extended, Duration::from_secs(300));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/mediabox.toml")),
            ..Default::default()
        };
        assert!(Config::load(&args).is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let args = Args::try_parse_from(["mediabox", "--port", "5000", "--host", "127.0.0.1"]).unwrap();
        assert_eq!(args.port, Some(5000));
        assert_eq!(args.host.as_deref(), Some("127.0.0.1"));
        assert!(Args::try_parse_from(["mediabox", "--port", "notaport"]).is_err());
    }
}
