//! RTMP streaming media filter
//!
//! Scans rendered HTML for anchors pointing at `rtmp://` stream URLs and
//! replaces them with player placeholders that the embedded browser module
//! wires up to Flowplayer (or native HTML5 media when Flash is absent).

pub mod assets;
pub mod config;
pub mod database;
pub mod errors;
pub mod filter;
pub mod models;
pub mod playlist;
pub mod render;
pub mod repositories;
pub mod resolver;
pub mod utils;
pub mod web;
