use serde::{Deserialize, Serialize};

/// Identifier of the host scope (course) a page belongs to
pub type ScopeId = i64;

/// Naming convention that decides how many path segments belong to the
/// connection URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Flash Media Server, Red5, Wowza: `rtmp://host/app` + stream
    #[default]
    Standard,
    /// Amazon CloudFront: `rtmp://host/cfx/st` + stream
    Acf,
}

impl Provider {
    /// Interpret a `provider` directive. Unknown names fall back to
    /// [`Provider::Standard`].
    pub fn from_directive(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("acf") {
            Self::Acf
        } else {
            Self::Standard
        }
    }

    /// Number of leading path segments consumed into the connection URL
    pub fn connection_segments(self) -> usize {
        match self {
            Self::Standard => 1,
            Self::Acf => 2,
        }
    }
}

/// One playable clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Streaming server endpoint (`rtmp://host/app`); empty for playlist
    /// entries that name a stream on the player's default connection
    pub connection_url: String,
    /// Stream identifier requested on the connection, prefix-normalized,
    /// with the remaining query string reattached
    pub stream_path: String,
    pub title: String,
    pub captions_enabled: bool,
    /// Zero-based position within the resolved group
    pub index: usize,
    /// Validated `rtmp://` URL with directives removed
    pub source_url: String,
    /// Lower-cased media extension, inferred from a stream-type prefix when
    /// the extension itself was already stripped
    pub extension: Option<String>,
    pub provider: Provider,
}

impl StreamDescriptor {
    /// Stream path without its reattached query string
    pub fn stream_name(&self) -> &str {
        self.stream_path
            .split_once('?')
            .map_or(self.stream_path.as_str(), |(name, _)| name)
    }
}

/// Output of a single resolve call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub clips: Vec<StreamDescriptor>,
    /// Shared width hint, 0 when unspecified
    pub width: u32,
    /// Shared height hint, 0 when unspecified
    pub height: u32,
    /// Set for playlist references: individual clip links already exist
    pub suppress_fallback_link: bool,
}

impl ResolveResult {
    /// Whether the caller should size the player itself
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Named playlist stored by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    pub id: i64,
    pub scope: ScopeId,
    pub name: String,
    /// Newline separated `url[,title]` entries
    pub list: String,
}

/// One line of a [`PlaylistRecord`] list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub url: String,
    pub title: Option<String>,
}

impl PlaylistRecord {
    /// Parse the stored list, skipping blank lines
    pub fn entries(&self) -> Vec<PlaylistEntry> {
        self.list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(',') {
                Some((url, title)) => PlaylistEntry {
                    url: url.trim().to_string(),
                    title: Some(title.trim().to_string()).filter(|t| !t.is_empty()),
                },
                None => PlaylistEntry {
                    url: line.to_string(),
                    title: None,
                },
            })
            .collect()
    }
}

/// Request payload for creating or replacing a stored playlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistUpsertRequest {
    pub scope: ScopeId,
    pub name: String,
    pub list: String,
}
