//! Content filter
//!
//! Rewrites rtmp anchors in a block of rendered HTML into player
//! placeholders. Each page render owns a [`PageState`]; the filter itself is
//! immutable and shared between concurrent renders.

pub mod bootstrap;

use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::ConfigError;
use crate::models::ScopeId;
use crate::playlist::PlaylistLookup;
use crate::render::{embeddable_markers, MediaRenderer, DEFAULT_LABEL};
use crate::resolver::{self, StreamUrlResolver};
use bootstrap::PlayerAssets;

/// Per-page render state
#[derive(Debug, Clone, Default)]
pub struct PageState {
    /// Scope playlist references are looked up in
    pub scope: ScopeId,
    /// The host caches filtered output and replays it without page
    /// requirements, so the bootstrap must load the module itself
    pub cache_text: bool,
    /// The page is a preview being pre-rendered outside its body
    pub preview_prerender: bool,
    bootstrap_emitted: bool,
    module_required: bool,
}

impl PageState {
    pub fn new(scope: ScopeId) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    pub fn with_cache_text(mut self, cache_text: bool) -> Self {
        self.cache_text = cache_text;
        self
    }

    pub fn with_preview_prerender(mut self, preview_prerender: bool) -> Self {
        self.preview_prerender = preview_prerender;
        self
    }

    pub fn bootstrap_emitted(&self) -> bool {
        self.bootstrap_emitted
    }

    /// Whether the host page must include the browser module and call
    /// `M.filter_rtmp.init()` itself
    pub fn module_required(&self) -> bool {
        self.module_required
    }
}

fn nomediaplugin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)class="[^"]*nomediaplugin"#).expect("nomediaplugin pattern is valid")
    })
}

fn playlist_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<a\s[^>]*href="([^"]*rtmp://playlist=[^"]*)""#)
            .expect("playlist reference pattern is valid")
    })
}

/// Names of the playlists referenced by rtmp anchors in `text`, deduplicated
/// in order of first appearance
pub fn playlist_references(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in playlist_reference_pattern().captures_iter(text) {
        for alternative in caps[1].split('#') {
            if let Some(name) = resolver::playlist_name(alternative) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}

/// Rewrites rtmp anchors into player markup
pub struct ContentFilter {
    renderer: MediaRenderer,
    assets: PlayerAssets,
    module_url: String,
    anchor: Regex,
}

impl ContentFilter {
    /// Build a filter from the application config, discovering player assets
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let assets = PlayerAssets::discover(&config.player);
        let module_url = format!(
            "{}{}",
            config.player.www_root.trim_end_matches('/'),
            config.player.module_path
        );
        Self::new(MediaRenderer::new(config.filter.clone()), assets, module_url)
    }

    pub fn new(
        renderer: MediaRenderer,
        assets: PlayerAssets,
        module_url: String,
    ) -> Result<Self, ConfigError> {
        let markers = embeddable_markers(renderer.config());
        // With no media player enabled only playlist references can match
        let markers = if markers.is_empty() {
            r"[^\s\S]".to_string()
        } else {
            markers
        };
        let anchor = Regex::new(&format!(
            r#"(?is)<a\s[^>]*href="((?i:rtmp://)(?:playlist=[^"]*|[^"]*(?:{markers}))[^"]*)"[^>]*>([^>]*)</a>"#
        ))?;

        Ok(Self {
            renderer,
            assets,
            module_url,
            anchor,
        })
    }

    pub fn renderer(&self) -> &MediaRenderer {
        &self.renderer
    }

    pub fn assets(&self) -> &PlayerAssets {
        &self.assets
    }

    /// Filter one block of text belonging to the page described by `page`
    ///
    /// Text without any rtmp anchor comes back unchanged. Anchors that do not
    /// resolve, or that no enabled player can embed, are left as they are.
    /// The bootstrap script is appended after the first block that embedded
    /// a player.
    pub fn filter(&self, text: &str, page: &mut PageState, lookup: &dyn PlaylistLookup) -> String {
        if page.preview_prerender {
            return text.to_string();
        }
        if text.is_empty() || !contains_closing_anchor(text) {
            return text.to_string();
        }

        let resolver = StreamUrlResolver::new(
            page.scope,
            self.renderer.config().default_captions,
            lookup,
        );
        let mut embedded = 0usize;

        let output = self.anchor.replace_all(text, |caps: &Captures| {
            match self.replace_anchor(caps, &resolver) {
                Some(markup) => {
                    embedded += 1;
                    markup
                }
                None => caps[0].to_string(),
            }
        });

        if embedded == 0 {
            return text.to_string();
        }
        debug!("Embedded {} player(s) in scope {}", embedded, page.scope);

        let mut output = output.into_owned();
        if !page.bootstrap_emitted {
            page.bootstrap_emitted = true;
            output.push('\n');
            output.push_str(&bootstrap::config_script(
                &self.assets,
                self.renderer.config(),
            ));
            if page.cache_text {
                output.push('\n');
                output.push_str(&bootstrap::self_loading_script(&self.module_url));
            } else {
                page.module_required = true;
            }
        }
        output
    }

    fn replace_anchor(&self, caps: &Captures, resolver: &StreamUrlResolver) -> Option<String> {
        if nomediaplugin_pattern().is_match(&caps[0]) {
            return None;
        }

        let label = caps[2].trim();
        let label = if label.is_empty() { DEFAULT_LABEL } else { label };

        let result = resolver.resolve(&caps[1])?;
        match self.renderer.embed(&result, label) {
            Ok(markup) => markup,
            Err(e) => {
                warn!("Failed to render player markup: {}", e);
                None
            }
        }
    }
}

fn contains_closing_anchor(text: &str) -> bool {
    text.as_bytes()
        .windows(4)
        .any(|w| w.eq_ignore_ascii_case(b"</a>"))
}
