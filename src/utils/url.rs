//! URL utilities for stream href handling
//!
//! The generic URL parser only understands registered schemes, so rtmp
//! URLs are validated by temporarily presenting them as http. These helpers
//! keep that substitution, and the text clean-up around it, in one place.

use std::borrow::Cow;

pub const RTMP_SCHEME: &str = "rtmp://";
pub const HTTP_SCHEME: &str = "http://";

/// URL utilities for stream href handling
pub struct UrlUtils;

impl UrlUtils {
    /// Whether `url` starts with `rtmp://`, ignoring case on the scheme token
    pub fn has_rtmp_scheme(url: &str) -> bool {
        Self::strip_scheme(url, RTMP_SCHEME).is_some()
    }

    /// Strip a scheme prefix, ignoring case, returning the remainder
    pub fn strip_scheme<'a>(url: &'a str, scheme: &str) -> Option<&'a str> {
        let head = url.get(..scheme.len())?;
        head.eq_ignore_ascii_case(scheme)
            .then(|| &url[scheme.len()..])
    }

    /// Replace the leading `from` scheme with `to`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rtmp_filter::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::swap_scheme("RTMP://host/app/a.mp4", "rtmp://", "http://").as_deref(),
    ///     Some("http://host/app/a.mp4")
    /// );
    /// assert_eq!(UrlUtils::swap_scheme("host/app", "rtmp://", "http://"), None);
    /// ```
    pub fn swap_scheme(url: &str, from: &str, to: &str) -> Option<String> {
        Self::strip_scheme(url, from).map(|rest| format!("{to}{rest}"))
    }

    /// Decode the entities HTML editors introduce into attribute values
    /// (`&amp;`, `&quot;`, `&#039;`, `&#39;`, `&lt;`, `&gt;`)
    ///
    /// Decoding is single pass, so `&amp;lt;` becomes `&lt;` and not `<`.
    pub fn decode_html_entities(text: &str) -> Cow<'_, str> {
        if !text.contains('&') {
            return Cow::Borrowed(text);
        }

        const ENTITIES: [(&str, char); 6] = [
            ("&amp;", '&'),
            ("&quot;", '"'),
            ("&#039;", '\''),
            ("&#39;", '\''),
            ("&lt;", '<'),
            ("&gt;", '>'),
        ];

        let mut decoded = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find('&') {
            decoded.push_str(&rest[..pos]);
            rest = &rest[pos..];
            match ENTITIES
                .iter()
                .find(|(entity, _)| rest.starts_with(entity))
            {
                Some((entity, ch)) => {
                    decoded.push(*ch);
                    rest = &rest[entity.len()..];
                }
                None => {
                    decoded.push('&');
                    rest = &rest[1..];
                }
            }
        }
        decoded.push_str(rest);
        Cow::Owned(decoded)
    }

    /// Derive a display title from the last segment of a stream path:
    /// stream-type prefix and extension removed, `+` read as a space,
    /// percent escapes decoded.
    pub fn title_from_segment(segment: &str) -> String {
        let name = ["mp4:", "mp3:"]
            .iter()
            .find_map(|prefix| Self::strip_scheme(segment, prefix))
            .unwrap_or(segment);

        let name = match name.rsplit_once('.') {
            Some((stem, ext))
                if !stem.is_empty()
                    && (1..=5).contains(&ext.len())
                    && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                stem
            }
            _ => name,
        };

        let spaced = name.replace('+', " ");
        match urlencoding::decode(&spaced) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => spaced,
        }
    }

    /// Escape a value for use inside a single-quoted JavaScript string
    pub fn escape_js_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '\\' => escaped.push_str("\\\\"),
                '\'' => escaped.push_str("\\'"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '<' => escaped.push_str("\\x3c"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }
}
