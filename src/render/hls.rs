//! HTML5 fallback URLs
//!
//! Browsers without Flash play the same stream over HLS. Media servers expose
//! their HLS endpoints under different layouts, selected by
//! [`HlsUrlFormat`].

use crate::config::HlsUrlFormat;
use crate::models::StreamDescriptor;
use crate::utils::url::{UrlUtils, HTTP_SCHEME, RTMP_SCHEME};

/// Build the HLS playlist URL for a clip
///
/// Returns `None` for clips without a connection URL (relative playlist
/// entries) since there is no server to derive the URL from.
///
/// - `wse` (Wowza): `http://host[:port]/<app>/<prefix><file>.<ext>/playlist.m3u8`
/// - `fms` (Adobe FMS): `http://host[:port]/hls-vod/<file>.<ext>.m3u8`
pub fn hls_url(clip: &StreamDescriptor, format: HlsUrlFormat) -> Option<String> {
    let rest = UrlUtils::strip_scheme(&clip.connection_url, RTMP_SCHEME)?;
    let (authority, app) = rest.split_once('/').unwrap_or((rest, ""));
    if authority.is_empty() {
        return None;
    }

    let query = clip.stream_path.split_once('?').map(|(_, query)| query);
    let (prefix, file) = split_type_prefix(clip.stream_name());
    let file = match clip.extension.as_deref() {
        Some(ext) => format!("{file}.{ext}"),
        None => file.to_string(),
    };

    let mut url = match format {
        HlsUrlFormat::Wse => {
            let app = app.trim_matches('/');
            if app.is_empty() {
                format!("{HTTP_SCHEME}{authority}/{prefix}{file}/playlist.m3u8")
            } else {
                format!("{HTTP_SCHEME}{authority}/{app}/{prefix}{file}/playlist.m3u8")
            }
        }
        HlsUrlFormat::Fms => format!("{HTTP_SCHEME}{authority}/hls-vod/{file}.m3u8"),
    };
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    Some(url)
}

/// Split `mp4:name` into (`mp4:`, `name`); paths without a prefix get `""`
fn split_type_prefix(stream: &str) -> (&str, &str) {
    ["mp4:", "mp3:"]
        .iter()
        .find_map(|prefix| {
            UrlUtils::strip_scheme(stream, prefix).map(|file| (&stream[..prefix.len()], file))
        })
        .unwrap_or(("", stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    fn clip(conx: &str, path: &str, ext: Option<&str>) -> StreamDescriptor {
        StreamDescriptor {
            connection_url: conx.to_string(),
            stream_path: path.to_string(),
            title: "t".to_string(),
            captions_enabled: false,
            index: 0,
            source_url: String::new(),
            extension: ext.map(str::to_string),
            provider: Provider::Standard,
        }
    }

    #[test]
    fn test_wowza_url() {
        let c = clip("rtmp://media.example.com:1935/vod", "mp4:lectures/week1", Some("mp4"));
        assert_eq!(
            hls_url(&c, HlsUrlFormat::Wse).as_deref(),
            Some("http://media.example.com:1935/vod/mp4:lectures/week1.mp4/playlist.m3u8")
        );
    }

    #[test]
    fn test_wowza_url_without_prefix_keeps_query() {
        let c = clip("rtmp://host/vod", "old?token=x", Some("flv"));
        assert_eq!(
            hls_url(&c, HlsUrlFormat::Wse).as_deref(),
            Some("http://host/vod/old.flv/playlist.m3u8?token=x")
        );
    }

    #[test]
    fn test_fms_url() {
        let c = clip("rtmp://host/vod", "mp3:talk", Some("mp3"));
        assert_eq!(
            hls_url(&c, HlsUrlFormat::Fms).as_deref(),
            Some("http://host/hls-vod/talk.mp3.m3u8")
        );
    }

    #[test]
    fn test_relative_clip_has_no_url() {
        let c = clip("", "mp4:b", Some("mp4"));
        assert_eq!(hls_url(&c, HlsUrlFormat::Wse), None);
        assert_eq!(hls_url(&c, HlsUrlFormat::Fms), None);
    }
}
