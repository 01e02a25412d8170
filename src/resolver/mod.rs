//! Stream URL resolution
//!
//! Turns the raw `href` of an rtmp anchor into playable stream descriptors.
//!
//! # Pipeline
//!
//! 1. Split the href into `#`-separated alternatives, expanding
//!    `rtmp://playlist=<name>` references through the [`PlaylistLookup`]
//! 2. Pull size, captions and provider directives out of each alternative
//! 3. Validate the URL with the generic (http) URL parser
//! 4. Split it into a connection URL and a stream path for its provider
//! 5. Normalize the media extension into a stream-type prefix
//! 6. Reattach the remaining query and pick a title
//!
//! A malformed alternative is dropped on its own; only a playlist that
//! cannot be found abandons the whole href.

pub mod directives;
pub mod normalize;

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::models::{ResolveResult, ScopeId, StreamDescriptor};
use crate::playlist::PlaylistLookup;
use crate::utils::UrlUtils;

fn playlist_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?i:rtmp://)playlist=(.+)$").expect("playlist pattern is valid")
    })
}

/// Name of the playlist an alternative refers to, `&amp;` unescaped
pub fn playlist_name(alternative: &str) -> Option<String> {
    let caps = playlist_pattern().captures(alternative.trim())?;
    let name = caps[1].replace("&amp;", "&");
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// One alternative awaiting directive extraction
#[derive(Debug)]
struct WorkingEntry {
    raw: String,
    title: Option<String>,
    from_playlist: bool,
}

/// Resolves rtmp hrefs for one scope
pub struct StreamUrlResolver<'a> {
    scope: ScopeId,
    default_captions: bool,
    lookup: &'a dyn PlaylistLookup,
}

impl<'a> StreamUrlResolver<'a> {
    pub fn new(scope: ScopeId, default_captions: bool, lookup: &'a dyn PlaylistLookup) -> Self {
        Self {
            scope,
            default_captions,
            lookup,
        }
    }

    /// Resolve a combined href into its clips
    ///
    /// Returns `None` when the href is not an rtmp URL, when a referenced
    /// playlist does not exist, or when no alternative survives validation.
    pub fn resolve(&self, combined_href: &str) -> Option<ResolveResult> {
        if !UrlUtils::has_rtmp_scheme(combined_href.trim()) {
            debug!("Ignoring non-rtmp href: {}", combined_href);
            return None;
        }

        let (working, suppress_fallback_link) = self.expand(combined_href)?;

        let mut width = 0;
        let mut height = 0;
        let mut clips: Vec<StreamDescriptor> = Vec::with_capacity(working.len());

        for entry in working {
            if let Some(size) = directives::bare_size(&entry.raw) {
                width = size.width;
                height = size.height;
                continue;
            }

            let directed = directives::extract(&entry.raw);
            if let Some(size) = directed.dimensions {
                width = size.width;
                height = size.height;
            }

            match normalize::normalize(&directed.url, directed.provider, entry.from_playlist) {
                Ok(stream) => clips.push(StreamDescriptor {
                    connection_url: stream.connection_url,
                    stream_path: stream.stream_path,
                    title: entry.title.unwrap_or(stream.derived_title),
                    captions_enabled: directed.captions.unwrap_or(self.default_captions),
                    index: clips.len(),
                    source_url: stream.source_url,
                    extension: stream.extension,
                    provider: directed.provider,
                }),
                Err(err) => debug!("Dropping stream alternative: {}", err),
            }
        }

        if clips.is_empty() {
            debug!("No playable alternative in href: {}", combined_href);
            return None;
        }

        Some(ResolveResult {
            clips,
            width,
            height,
            suppress_fallback_link,
        })
    }

    /// Split on `#` and expand playlist references in place
    fn expand(&self, combined_href: &str) -> Option<(Vec<WorkingEntry>, bool)> {
        let mut working = Vec::new();
        let mut from_playlist = false;

        for alternative in combined_href.split('#').map(str::trim) {
            if alternative.is_empty() {
                continue;
            }

            let Some(name) = playlist_name(alternative) else {
                working.push(WorkingEntry {
                    raw: alternative.to_string(),
                    title: None,
                    from_playlist: false,
                });
                continue;
            };

            let Some(record) = self.lookup.find_playlist(self.scope, &name) else {
                info!("Playlist '{}' not found in scope {}", name, self.scope);
                return None;
            };

            working.extend(record.entries().into_iter().map(|entry| WorkingEntry {
                raw: entry.url,
                title: entry.title,
                from_playlist: true,
            }));
            from_playlist = true;
        }

        Some((working, from_playlist))
    }
}

/// Resolve `combined_href` in `scope`; see [`StreamUrlResolver::resolve`]
pub fn resolve(
    combined_href: &str,
    default_captions: bool,
    scope: ScopeId,
    lookup: &dyn PlaylistLookup,
) -> Option<ResolveResult> {
    StreamUrlResolver::new(scope, default_captions, lookup).resolve(combined_href)
}
