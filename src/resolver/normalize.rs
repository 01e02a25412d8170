//! Validation and connection/stream splitting for a single alternative

use url::{Position, Url};

use crate::errors::StreamUrlError;
use crate::models::Provider;
use crate::utils::url::{UrlUtils, HTTP_SCHEME, RTMP_SCHEME};

/// Base used to validate playlist entries that carry only a stream path
const RELATIVE_BASE: &str = "http://playlist.invalid/";

/// What to do with a recognised media extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtensionRule {
    /// Strip the extension and request the stream with this type prefix
    Prefixed(&'static str),
    /// Strip the extension only
    Stripped,
}

/// Extensions the players can stream, lower case
const SUPPORTED_EXTENSIONS: [(&str, ExtensionRule); 4] = [
    ("flv", ExtensionRule::Stripped),
    ("mp4", ExtensionRule::Prefixed("mp4:")),
    ("f4v", ExtensionRule::Prefixed("mp4:")),
    ("mp3", ExtensionRule::Prefixed("mp3:")),
];

/// A validated alternative split into its connection and stream parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStream {
    pub connection_url: String,
    pub stream_path: String,
    pub source_url: String,
    pub extension: Option<String>,
    /// Title derived from the last path segment
    pub derived_title: String,
}

/// Validate a directive-free entry and split it for the given provider
///
/// `allow_relative` admits scheme-less entries (stream paths on the
/// player's default connection), which only playlists may contain.
pub fn normalize(
    entry: &str,
    provider: Provider,
    allow_relative: bool,
) -> Result<NormalizedStream, StreamUrlError> {
    if UrlUtils::has_rtmp_scheme(entry) {
        normalize_absolute(entry, provider)
    } else if allow_relative && !entry.contains("://") {
        normalize_relative(entry)
    } else {
        Err(StreamUrlError::UnsupportedScheme {
            url: entry.to_string(),
        })
    }
}

fn malformed(url: &str, reason: impl ToString) -> StreamUrlError {
    StreamUrlError::Malformed {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

fn normalize_absolute(entry: &str, provider: Provider) -> Result<NormalizedStream, StreamUrlError> {
    let as_http = UrlUtils::swap_scheme(entry, RTMP_SCHEME, HTTP_SCHEME)
        .ok_or_else(|| StreamUrlError::UnsupportedScheme {
            url: entry.to_string(),
        })?;
    let url = Url::parse(&as_http).map_err(|e| malformed(entry, e))?;

    let mut origin = to_rtmp(&url[..Position::BeforePath], entry)?;
    if url.port().is_none() && explicit_default_port(entry) {
        origin.push_str(":80");
    }

    // The stream key is passed on as written, never percent-encoded
    let (target, query) = split_query(UrlUtils::strip_scheme(entry, RTMP_SCHEME).unwrap_or(entry));
    let path = target.split_once('/').map(|(_, path)| path).unwrap_or_default();
    let source_url = with_query(format!("{origin}/{path}"), query);

    let segments: Vec<&str> = path.split('/').collect();
    let consumed = provider.connection_segments();
    let missing = || StreamUrlError::MissingStreamPath {
        url: entry.to_string(),
    };

    if segments.len() <= consumed || ends_without_name(path) {
        return Err(missing());
    }
    let connection_url = format!("{}/{}", origin, segments[..consumed].join("/"));
    let stream = segments[consumed..].join("/");
    let stream = stream.trim();
    if stream.is_empty() {
        return Err(missing());
    }

    let (stream_path, extension) = normalize_extension(stream);
    Ok(NormalizedStream {
        connection_url,
        stream_path: with_query(stream_path, query),
        source_url,
        extension,
        derived_title: UrlUtils::title_from_segment(segments.last().copied().unwrap_or_default()),
    })
}

fn normalize_relative(entry: &str) -> Result<NormalizedStream, StreamUrlError> {
    let base = Url::parse(RELATIVE_BASE).map_err(|e| malformed(entry, e))?;
    let url = base.join(entry).map_err(|e| malformed(entry, e))?;
    if url.host_str() != base.host_str() {
        return Err(malformed(entry, "relative entry escapes its connection"));
    }

    let (path, query) = split_query(entry);
    let stream = path.trim_start_matches('/').trim();
    if stream.is_empty() || ends_without_name(stream) {
        return Err(StreamUrlError::MissingStreamPath {
            url: entry.to_string(),
        });
    }

    let (stream_path, extension) = normalize_extension(stream);
    Ok(NormalizedStream {
        connection_url: String::new(),
        stream_path: with_query(stream_path, query),
        source_url: with_query(stream.to_string(), query),
        extension,
        derived_title: UrlUtils::title_from_segment(stream.rsplit('/').next().unwrap_or(stream)),
    })
}

fn split_query(text: &str) -> (&str, Option<&str>) {
    match text.split_once('?') {
        Some((target, query)) => (target, Some(query).filter(|q| !q.is_empty())),
        None => (text, None),
    }
}

fn with_query(mut target: String, query: Option<&str>) -> String {
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// A path ending in `/` names a directory, not a stream
fn ends_without_name(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|last| last.trim().is_empty())
}

fn to_rtmp(http_url: &str, entry: &str) -> Result<String, StreamUrlError> {
    UrlUtils::swap_scheme(http_url, HTTP_SCHEME, RTMP_SCHEME)
        .ok_or_else(|| malformed(entry, "scheme lost during validation"))
}

/// The http parser drops `:80` as a default port, which it is not for rtmp
fn explicit_default_port(entry: &str) -> bool {
    let rest = UrlUtils::strip_scheme(entry, RTMP_SCHEME).unwrap_or(entry);
    let authority = rest.split(['/', '?']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    host_port.ends_with(":80")
}

fn has_prefix(path: &str, prefix: &str) -> bool {
    path.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Strip a supported extension and apply its stream-type prefix
///
/// Returns the normalized path and the media extension. When the path
/// carries no extension but already has a stream-type prefix, the
/// extension is inferred from the prefix, so normalizing twice is a no-op.
pub fn normalize_extension(path: &str) -> (String, Option<String>) {
    if let Some((stem, ext)) = path.rsplit_once('.') {
        let ext = ext.to_ascii_lowercase();
        let rule = SUPPORTED_EXTENSIONS
            .iter()
            .find(|(supported, _)| *supported == ext)
            .map(|(_, rule)| *rule);

        if let Some(rule) = rule.filter(|_| !stem.is_empty() && !stem.ends_with('/')) {
            let normalized = match rule {
                ExtensionRule::Prefixed(prefix) if !has_prefix(stem, prefix) => {
                    format!("{prefix}{stem}")
                }
                _ => stem.to_string(),
            };
            return (normalized, Some(ext));
        }
    }

    let inferred = ["mp4", "mp3"]
        .iter()
        .find(|kind| has_prefix(path, &format!("{kind}:")))
        .map(|kind| kind.to_string());
    (path.to_string(), inferred)
}
