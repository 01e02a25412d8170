//! Utility functions for the RTMP filter
//!
//! - `utils::url` for scheme handling, entity decoding and title derivation

pub mod url;

pub use url::UrlUtils;
