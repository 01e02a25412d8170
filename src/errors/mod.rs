//! Error handling for the RTMP filter

pub mod types;

pub use types::*;
