//! Player markup
//!
//! A resolved href is handed to the highest ranked enabled [`MediaPlayer`]
//! that can stream at least one of its clips. The chosen player emits a
//! placeholder `<span>` the browser module turns into a Flowplayer instance
//! (or a native media element), with the fallback links of the
//! [`MediaPlayer::Link`] player inside it.

pub mod hls;

use askama::Template;
use chrono::Utc;
use tracing::debug;

use crate::config::FilterConfig;
use crate::errors::AppResult;
use crate::models::{ResolveResult, StreamDescriptor};

/// Label used when the anchor text is empty
pub const DEFAULT_LABEL: &str = "Media Stream (RTMP)";

/// Video size used when the author gave none; the player then autosizes
pub const DEFAULT_VIDEO_WIDTH: u32 = 320;
pub const DEFAULT_VIDEO_HEIGHT: u32 = 240;

const AUDIO_STYLE: &str = "width: 300px; height:20px; display:block";

/// Players able to embed resolved clips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaPlayer {
    Video,
    Audio,
    /// Plain links to the source URLs; also supplies the fallback content of
    /// the media players
    Link,
}

impl MediaPlayer {
    pub const ALL: [MediaPlayer; 3] = [MediaPlayer::Video, MediaPlayer::Audio, MediaPlayer::Link];

    /// Selection order, highest first
    pub fn rank(self) -> u32 {
        match self {
            Self::Video => 1001,
            Self::Audio => 80,
            Self::Link => 0,
        }
    }

    /// Media extensions the player streams; empty means any URL
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Video => &["flv", "mp4", "f4v"],
            Self::Audio => &["mp3"],
            Self::Link => &[],
        }
    }

    pub fn is_enabled(self, config: &FilterConfig) -> bool {
        match self {
            Self::Video => config.enable_video,
            Self::Audio => config.enable_audio,
            Self::Link => true,
        }
    }

    pub fn supports(self, clip: &StreamDescriptor) -> bool {
        match self {
            Self::Link => true,
            _ => clip
                .extension
                .as_deref()
                .is_some_and(|ext| self.extensions().contains(&ext)),
        }
    }

    fn kind(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Link => "link",
        }
    }

    /// Enabled players in selection order
    pub fn enabled(config: &FilterConfig) -> Vec<MediaPlayer> {
        let mut players: Vec<_> = Self::ALL
            .into_iter()
            .filter(|player| player.is_enabled(config))
            .collect();
        players.sort_by_key(|player| std::cmp::Reverse(player.rank()));
        players
    }
}

/// Regex alternation of the extensions enabled media players recognise,
/// e.g. `\.flv|\.mp4|\.f4v|\.mp3`. Empty when no media player is enabled.
pub fn embeddable_markers(config: &FilterConfig) -> String {
    MediaPlayer::enabled(config)
        .into_iter()
        .flat_map(|player| player.extensions().iter())
        .map(|ext| format!(r"\.{}", regex::escape(ext)))
        .collect::<Vec<_>>()
        .join("|")
}

struct ClipView {
    href: String,
    conx: String,
    path: String,
    title: String,
    captions: &'static str,
    hls_url: Option<String>,
}

struct PlayerSize {
    width: u32,
    height: u32,
    autosize: &'static str,
}

#[derive(Template)]
#[template(path = "media_player.html")]
struct MediaPlayerTemplate<'a> {
    id: &'a str,
    kind: &'a str,
    label: &'a str,
    lead: &'a ClipView,
    size: Option<PlayerSize>,
    style: Option<&'a str>,
    fallback: &'a str,
    playlist: &'a [ClipView],
}

#[derive(Template)]
#[template(path = "fallback_link.html")]
struct FallbackLinkTemplate<'a> {
    clips: &'a [ClipView],
}

/// Renders resolve results with the enabled players
#[derive(Debug, Clone)]
pub struct MediaRenderer {
    config: FilterConfig,
    players: Vec<MediaPlayer>,
}

impl MediaRenderer {
    pub fn new(config: FilterConfig) -> Self {
        let players = MediaPlayer::enabled(&config);
        Self { config, players }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Embed `result` with the best matching media player
    ///
    /// Returns `Ok(None)` when no media player supports any clip; the caller
    /// keeps the original markup rather than degrading to bare links.
    pub fn embed(&self, result: &ResolveResult, label: &str) -> AppResult<Option<String>> {
        let Some((player, clips)) = self.select(result) else {
            debug!("No enabled media player supports {} clip(s)", result.clips.len());
            return Ok(None);
        };

        let views: Vec<ClipView> = clips.iter().map(|clip| self.clip_view(clip)).collect();
        let fallback = if result.suppress_fallback_link {
            String::new()
        } else {
            let all: Vec<ClipView> = result.clips.iter().map(|clip| self.clip_view(clip)).collect();
            FallbackLinkTemplate { clips: &all }.render()?
        };

        let size = match player {
            MediaPlayer::Video if result.has_dimensions() => Some(PlayerSize {
                width: result.width,
                height: result.height,
                autosize: "0",
            }),
            MediaPlayer::Video => Some(PlayerSize {
                width: DEFAULT_VIDEO_WIDTH,
                height: DEFAULT_VIDEO_HEIGHT,
                autosize: "1",
            }),
            _ => None,
        };
        let style = (player == MediaPlayer::Audio).then_some(AUDIO_STYLE);

        let id = element_id(player);
        let playlist: &[ClipView] = if views.len() > 1 { &views } else { &[] };
        let markup = MediaPlayerTemplate {
            id: &id,
            kind: player.kind(),
            label,
            lead: &views[0],
            size,
            style,
            fallback: &fallback,
            playlist,
        }
        .render()?;

        Ok(Some(markup))
    }

    /// First enabled media player, by rank, supporting at least one clip,
    /// with the clips it supports
    fn select<'r>(&self, result: &'r ResolveResult) -> Option<(MediaPlayer, Vec<&'r StreamDescriptor>)> {
        self.players
            .iter()
            .filter(|player| **player != MediaPlayer::Link)
            .find_map(|player| {
                let clips: Vec<_> = result.clips.iter().filter(|c| player.supports(c)).collect();
                (!clips.is_empty()).then_some((*player, clips))
            })
    }

    fn clip_view(&self, clip: &StreamDescriptor) -> ClipView {
        ClipView {
            href: clip.source_url.clone(),
            conx: clip.connection_url.clone(),
            path: clip.stream_path.clone(),
            title: clip.title.clone(),
            captions: if clip.captions_enabled { "1" } else { "0" },
            hls_url: self
                .config
                .html5_fallback
                .then(|| hls::hls_url(clip, self.config.hls_url_format))
                .flatten(),
        }
    }
}

/// `filter_rtmp_<kind>_` followed by the md5 of the time and a random number
pub fn element_id(player: MediaPlayer) -> String {
    let seed = format!("{}_{}", Utc::now().timestamp(), fastrand::u32(..));
    format!("filter_rtmp_{}_{:x}", player.kind(), md5::compute(seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HlsUrlFormat;
    use crate::models::Provider;

    fn clip(path: &str, ext: &str, index: usize) -> StreamDescriptor {
        StreamDescriptor {
            connection_url: "rtmp://host/app".to_string(),
            stream_path: path.to_string(),
            title: format!("Clip {index}"),
            captions_enabled: index % 2 == 1,
            index,
            source_url: format!("rtmp://host/app/{index}.{ext}"),
            extension: Some(ext.to_string()),
            provider: Provider::Standard,
        }
    }

    fn result(clips: Vec<StreamDescriptor>) -> ResolveResult {
        ResolveResult {
            clips,
            width: 0,
            height: 0,
            suppress_fallback_link: false,
        }
    }

    #[test]
    fn test_player_order_and_markers() {
        let config = FilterConfig::default();
        assert_eq!(
            MediaPlayer::enabled(&config),
            vec![MediaPlayer::Video, MediaPlayer::Audio, MediaPlayer::Link]
        );
        assert_eq!(embeddable_markers(&config), r"\.flv|\.mp4|\.f4v|\.mp3");

        let audio_only = FilterConfig {
            enable_video: false,
            ..FilterConfig::default()
        };
        assert_eq!(embeddable_markers(&audio_only), r"\.mp3");

        let none = FilterConfig {
            enable_video: false,
            enable_audio: false,
            ..FilterConfig::default()
        };
        assert_eq!(embeddable_markers(&none), "");
        assert_eq!(MediaPlayer::enabled(&none), vec![MediaPlayer::Link]);
    }

    #[test]
    fn test_element_id_format() {
        let id = element_id(MediaPlayer::Video);
        let hex = id.strip_prefix("filter_rtmp_video_").unwrap();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(element_id(MediaPlayer::Audio).starts_with("filter_rtmp_audio_"));
    }

    #[test]
    fn test_single_video_defaults_and_fallback_link() {
        let renderer = MediaRenderer::new(FilterConfig::default());
        let html = renderer
            .embed(&result(vec![clip("mp4:video", "mp4", 0)]), "Lecture")
            .unwrap()
            .unwrap();

        assert!(html.starts_with("<span id=\"filter_rtmp_video_"));
        assert!(html.contains("class=\"mediaplugin filter_rtmp_video\""));
        assert!(html.contains("data-media-path=\"mp4:video\""));
        assert!(html.contains("data-media-width=\"320\""));
        assert!(html.contains("data-media-height=\"240\""));
        assert!(html.contains("data-media-autosize=\"1\""));
        assert!(html.contains("data-media-captions=\"0\""));
        assert!(html.contains("class=\"mediafallbacklink nomediaplugin\""));
        assert!(!html.contains("filter_rtmp_video_playlist"));
        assert!(!html.contains("data-media-hls-url"));
    }

    #[test]
    fn test_explicit_size_disables_autosize() {
        let renderer = MediaRenderer::new(FilterConfig::default());
        let mut res = result(vec![clip("mp4:video", "mp4", 0)]);
        res.width = 640;
        res.height = 480;
        let html = renderer.embed(&res, "x").unwrap().unwrap();
        assert!(html.contains("data-media-width=\"640\""));
        assert!(html.contains("data-media-height=\"480\""));
        assert!(html.contains("data-media-autosize=\"0\""));
    }

    #[test]
    fn test_audio_player() {
        let renderer = MediaRenderer::new(FilterConfig::default());
        let html = renderer
            .embed(&result(vec![clip("mp3:talk", "mp3", 0)]), "Talk")
            .unwrap()
            .unwrap();
        assert!(html.contains("class=\"mediaplugin filter_rtmp_audio\""));
        assert!(html.contains("style=\"width: 300px; height:20px; display:block\""));
        assert!(!html.contains("data-media-width"));
    }

    #[test]
    fn test_disabled_player_falls_back_to_nothing() {
        let renderer = MediaRenderer::new(FilterConfig {
            enable_audio: false,
            ..FilterConfig::default()
        });
        let res = result(vec![clip("mp3:talk", "mp3", 0)]);
        assert!(renderer.embed(&res, "Talk").unwrap().is_none());

        let mut unknown = clip("live", "mkv", 0);
        unknown.extension = None;
        let renderer = MediaRenderer::new(FilterConfig::default());
        assert!(renderer.embed(&result(vec![unknown]), "Live").unwrap().is_none());
    }

    #[test]
    fn test_playlist_markup() {
        let renderer = MediaRenderer::new(FilterConfig::default());
        let mut res = result(vec![clip("mp4:a", "mp4", 0), clip("mp4:b", "mp4", 1)]);
        res.suppress_fallback_link = true;
        let html = renderer.embed(&res, "List").unwrap().unwrap();

        let id_start = "<span id=\"".len();
        let id = &html[id_start..id_start + "filter_rtmp_video_".len() + 32];
        assert!(html.contains(&format!("class=\"filter_rtmp_video_playlist {id}\"")));
        assert_eq!(html.matches("<a class=\"clip\"").count(), 2);
        assert!(html.contains(">Clip 0</a>"));
        assert!(html.contains("data-media-index=\"1\""));
        assert!(html.contains("data-media-captions=\"1\""));
        assert!(!html.contains("mediafallbacklink"));
    }

    #[test]
    fn test_mixed_clips_use_best_player() {
        let renderer = MediaRenderer::new(FilterConfig::default());
        let res = result(vec![clip("mp3:a", "mp3", 0), clip("mp4:b", "mp4", 1)]);
        let html = renderer.embed(&res, "Mixed").unwrap().unwrap();
        assert!(html.contains("filter_rtmp_video"));
        assert!(html.contains("data-media-path=\"mp4:b\""));
        assert!(!html.contains("<a class=\"clip\""));
        assert_eq!(html.matches("mediafallbacklink").count(), 2);
        assert!(html.contains("</a> / <a"));
    }

    #[test]
    fn test_hls_attribute_when_enabled() {
        let renderer = MediaRenderer::new(FilterConfig {
            html5_fallback: true,
            hls_url_format: HlsUrlFormat::Fms,
            ..FilterConfig::default()
        });
        let html = renderer
            .embed(&result(vec![clip("mp4:video", "mp4", 0)]), "x")
            .unwrap()
            .unwrap();
        assert!(html.contains("data-media-hls-url=\""));
        assert!(html.contains("video.mp4.m3u8"));
    }

    #[test]
    fn test_label_and_title_are_escaped() {
        let renderer = MediaRenderer::new(FilterConfig::default());
        let mut c = clip("mp4:video", "mp4", 0);
        c.title = "<b>\"Intro\"</b>".to_string();
        let html = renderer.embed(&result(vec![c]), "Q&A").unwrap().unwrap();
        assert!(html.contains("title=\"Q&amp;A\""));
        assert!(!html.contains("<b>"));
    }
}
