use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub web: WebConfig,
}

/// Site-wide filter settings, read-only to the filter itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Embed mp3 streams with the audio player
    #[serde(default = "default_true")]
    pub enable_audio: bool,
    /// Embed flv/mp4/f4v streams with the video player
    #[serde(default = "default_true")]
    pub enable_video: bool,
    /// Captions state for clips without a `captions` directive
    #[serde(default)]
    pub default_captions: bool,
    /// Emit HTML5 media source URLs for browsers without Flash
    #[serde(default)]
    pub html5_fallback: bool,
    /// Server product convention used to build HTML5 source URLs
    #[serde(default)]
    pub hls_url_format: HlsUrlFormat,
}

/// HTTP streaming URL layout of the media server behind the rtmp endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HlsUrlFormat {
    /// Wowza Streaming Engine
    #[default]
    #[serde(alias = "wowza")]
    Wse,
    /// Adobe Flash Media Server
    Fms,
}

/// Where the Flowplayer assets live and how they are addressed from the browser
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Filesystem root that maps to `www_root`
    pub dir_root: PathBuf,
    /// Directory holding `flowplayer-x.y.z.min.js` and `flowplayer-x.y.z.swf`
    pub lib_dir: PathBuf,
    /// Directory holding the rtmp, captions and content plugin swf files
    pub filter_dir: PathBuf,
    /// Public base URL of the site
    pub www_root: String,
    /// Path (under `www_root`) the browser module is served from
    pub module_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

fn default_true() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enable_audio: true,
            enable_video: true,
            default_captions: false,
            html5_fallback: false,
            hls_url_format: HlsUrlFormat::Wse,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            dir_root: PathBuf::from("./public"),
            lib_dir: PathBuf::from("./public/lib/flowplayer"),
            filter_dir: PathBuf::from("./public/filter/rtmp"),
            www_root: "http://localhost:8080".to_string(),
            module_path: "/static/module.js".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./rtmp-filter.db".to_string(),
            max_connections: Some(5),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load the configuration named by `CONFIG_FILE` (default `config.toml`),
    /// writing the defaults to that path when it does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(Path::new(&config_file))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };

        if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(io_err)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(path, contents).map_err(io_err)?;
            info!("Wrote default configuration to {}", path.display());
            Ok(default_config)
        }
    }
}
