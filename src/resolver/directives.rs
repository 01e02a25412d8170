//! Directive extraction
//!
//! Authors steer the player through pseudo query parameters on the stream
//! URL (`d=640x480`, `captions=y`, `provider=acf`) or through a bare
//! `d=WxH` alternative. These never reach the streaming server, so they are
//! pulled out of the entry before it is validated.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Provider;
use crate::utils::UrlUtils;

/// Player size requested by a `d=WxH` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// An entry with its directives removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectedEntry {
    /// Entry text without directive parameters, query entities decoded
    pub url: String,
    pub dimensions: Option<Dimensions>,
    /// `None` when absent or unrecognised; the caller applies its default
    pub captions: Option<bool>,
    pub provider: Provider,
}

fn bare_size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^d=([0-9]{1,4})x([0-9]{1,4})$").expect("bare size pattern is valid")
    })
}

fn size_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^([0-9]{1,4})x([0-9]{1,4})$").expect("size value pattern is valid")
    })
}

fn capture_dimensions(pattern: &Regex, text: &str) -> Option<Dimensions> {
    let caps = pattern.captures(text)?;
    Some(Dimensions {
        width: caps[1].parse().ok()?,
        height: caps[2].parse().ok()?,
    })
}

/// Match an alternative that is nothing but a `d=WxH` size directive
pub fn bare_size(entry: &str) -> Option<Dimensions> {
    capture_dimensions(bare_size_pattern(), entry.trim())
}

/// Interpret a `captions` value: `1`/`y` on, `0`/`n` off, anything else unset
pub fn parse_captions(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "y" => Some(true),
        "0" | "n" => Some(false),
        _ => None,
    }
}

/// Pull `d`, `captions` and `provider` parameters out of an entry's query
///
/// Keys match case-insensitively.
/// Later occurrences of the same directive override earlier ones. A `d`
/// parameter whose value is not `WxH` is not a directive and stays in the
/// query untouched.
pub fn extract(entry: &str) -> DirectedEntry {
    let (base, query) = match entry.split_once('?') {
        Some((base, query)) => (base, query),
        None => {
            return DirectedEntry {
                url: entry.to_string(),
                dimensions: None,
                captions: None,
                provider: Provider::Standard,
            }
        }
    };

    let query = UrlUtils::decode_html_entities(query);
    let mut dimensions = None;
    let mut captions = None;
    let mut provider = Provider::Standard;
    let mut kept: Vec<&str> = Vec::new();

    for param in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = param.split_once('=').unwrap_or((param, ""));
        match key.to_ascii_lowercase().as_str() {
            "d" => match capture_dimensions(size_value_pattern(), value) {
                Some(size) => dimensions = Some(size),
                None => kept.push(param),
            },
            "captions" => captions = parse_captions(value),
            "provider" => provider = Provider::from_directive(value),
            _ => kept.push(param),
        }
    }

    let url = if kept.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, kept.join("&"))
    };

    DirectedEntry {
        url,
        dimensions,
        captions,
        provider,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_size() {
        assert_eq!(
            bare_size("d=640x480"),
            Some(Dimensions {
                width: 640,
                height: 480
            })
        );
        assert_eq!(
            bare_size(" D=1280X720 "),
            Some(Dimensions {
                width: 1280,
                height: 720
            })
        );
        assert_eq!(bare_size("d=12345x480"), None);
        assert_eq!(bare_size("d=640x"), None);
        assert_eq!(bare_size("rtmp://host/app/a.mp4?d=640x480"), None);
    }

    #[test]
    fn test_extract_without_query() {
        let entry = extract("rtmp://host/app/a.mp4");
        assert_eq!(entry.url, "rtmp://host/app/a.mp4");
        assert_eq!(entry.dimensions, None);
        assert_eq!(entry.captions, None);
        assert_eq!(entry.provider, Provider::Standard);
    }

    #[test]
    fn test_extract_all_directives() {
        let entry = extract(
            "rtmp://host/cfx/st/a.mp4?token=abc&amp;d=320x240&amp;captions=Y&amp;provider=acf&amp;t=5",
        );
        assert_eq!(entry.url, "rtmp://host/cfx/st/a.mp4?token=abc&t=5");
        assert_eq!(
            entry.dimensions,
            Some(Dimensions {
                width: 320,
                height: 240
            })
        );
        assert_eq!(entry.captions, Some(true));
        assert_eq!(entry.provider, Provider::Acf);
    }

    #[test]
    fn test_extract_leaves_non_size_d_parameter() {
        let entry = extract("rtmp://host/app/a.mp4?d=large");
        assert_eq!(entry.url, "rtmp://host/app/a.mp4?d=large");
        assert_eq!(entry.dimensions, None);
    }

    #[test]
    fn test_extract_last_size_wins() {
        let entry = extract("rtmp://host/app/a.mp4?d=320x240&d=640x480");
        assert_eq!(
            entry.dimensions,
            Some(Dimensions {
                width: 640,
                height: 480
            })
        );
        assert_eq!(entry.url, "rtmp://host/app/a.mp4");
    }

    #[test]
    fn test_parse_captions() {
        assert_eq!(parse_captions("1"), Some(true));
        assert_eq!(parse_captions("y"), Some(true));
        assert_eq!(parse_captions("N"), Some(false));
        assert_eq!(parse_captions("0"), Some(false));
        assert_eq!(parse_captions("yes"), None);
        assert_eq!(parse_captions(""), None);
    }

    #[test]
    fn test_unrecognised_captions_value_is_consumed() {
        let entry = extract("rtmp://host/app/a.mp4?captions=maybe");
        assert_eq!(entry.url, "rtmp://host/app/a.mp4");
        assert_eq!(entry.captions, None);
    }

    #[test]
    fn test_extract_matches_keys_case_insensitively() {
        let entry = extract("rtmp://host/app/clip.mp3?D=640x480&Captions=y&PROVIDER=acf");
        assert_eq!(entry.url, "rtmp://host/app/clip.mp3");
        assert_eq!(
            entry.dimensions,
            Some(Dimensions {
                width: 640,
                height: 480
            })
        );
        assert_eq!(entry.captions, Some(true));
        assert_eq!(entry.provider, Provider::Acf);
    }

    #[test]
    fn test_size_requires_ascii_digits() {
        assert_eq!(bare_size("d=\u{0666}40x480"), None);
        let entry = extract("rtmp://host/app/a.mp4?d=640x\u{0664}80");
        assert_eq!(entry.dimensions, None);
        assert_eq!(entry.url, "rtmp://host/app/a.mp4?d=640x\u{0664}80");
    }
}
