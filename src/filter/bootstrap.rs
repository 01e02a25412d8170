//! Player bootstrap script
//!
//! Flowplayer ships with its version in every file name, so the assets are
//! located by pattern rather than configured one by one.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::config::{FilterConfig, PlayerConfig};
use crate::utils::UrlUtils;

/// Player asset kinds and the file name pattern each is discovered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// `flowplayer-x.y.z.min.js`, library directory
    Script,
    /// `flowplayer-x.y.z.swf`, library directory
    Player,
    /// `flowplayer.rtmp-x.y.z.swf`, filter directory
    Rtmp,
    /// `flowplayer.captions-x.y.z.swf`, filter directory
    Captions,
    /// `flowplayer.content-x.y.z.swf`, filter directory
    Content,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Script,
        AssetKind::Player,
        AssetKind::Rtmp,
        AssetKind::Captions,
        AssetKind::Content,
    ];

    /// Suffix of the `filter_rtmp_flowplayer_*` variable in the bootstrap
    pub fn key(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Player => "swf",
            Self::Rtmp => "rtmp",
            Self::Captions => "captions",
            Self::Content => "content",
        }
    }

    fn pattern(self) -> &'static Regex {
        static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            [
                r"^flowplayer-[0-9]\.[0-9]\..+\.min\.js$",
                r"^flowplayer-[0-9]\.[0-9]\..+\.swf$",
                r"^flowplayer\.rtmp-[0-9]\.[0-9]\..+\.swf$",
                r"^flowplayer\.captions-[0-9]\.[0-9]\..+\.swf$",
                r"^flowplayer\.content-[0-9]\.[0-9]\..+\.swf$",
            ]
            .iter()
            .map(|p| Regex::new(p).expect("asset pattern is valid"))
            .collect()
        });
        &patterns[self as usize]
    }

    fn directory(self, config: &PlayerConfig) -> &Path {
        match self {
            Self::Script | Self::Player => &config.lib_dir,
            Self::Rtmp | Self::Captions | Self::Content => &config.filter_dir,
        }
    }
}

/// Web paths of the discovered player assets, relative to the site root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerAssets {
    pub www_root: String,
    pub script: Option<String>,
    pub player: Option<String>,
    pub rtmp: Option<String>,
    pub captions: Option<String>,
    pub content: Option<String>,
}

impl PlayerAssets {
    /// Scan the configured directories for the versioned asset files
    ///
    /// Unreadable directories and missing files leave the asset unset.
    pub fn discover(config: &PlayerConfig) -> Self {
        let mut assets = Self {
            www_root: config.www_root.trim_end_matches('/').to_string(),
            ..Self::default()
        };

        for kind in AssetKind::ALL {
            let found = find_versioned(kind.directory(config), kind.pattern())
                .and_then(|path| web_path(&config.dir_root, &path));
            match &found {
                Some(path) => debug!("Found player asset {}: {}", kind.key(), path),
                None => debug!("No player asset {} found", kind.key()),
            }
            *assets.slot(kind) = found;
        }

        assets
    }

    pub fn get(&self, kind: AssetKind) -> Option<&str> {
        match kind {
            AssetKind::Script => self.script.as_deref(),
            AssetKind::Player => self.player.as_deref(),
            AssetKind::Rtmp => self.rtmp.as_deref(),
            AssetKind::Captions => self.captions.as_deref(),
            AssetKind::Content => self.content.as_deref(),
        }
    }

    fn slot(&mut self, kind: AssetKind) -> &mut Option<String> {
        match kind {
            AssetKind::Script => &mut self.script,
            AssetKind::Player => &mut self.player,
            AssetKind::Rtmp => &mut self.rtmp,
            AssetKind::Captions => &mut self.captions,
            AssetKind::Content => &mut self.content,
        }
    }
}

/// First matching file name in sorted order, so the choice is stable
fn find_versioned(dir: &Path, pattern: &Regex) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read player asset directory {}: {}", dir.display(), e);
            return None;
        }
    };

    let mut hits: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.is_match(name))
        })
        .collect();
    hits.sort();
    hits.into_iter().next()
}

/// `/lib/flowplayer/x.js` for `<dir_root>/lib/flowplayer/x.js`
fn web_path(dir_root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir_root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(format!("/{}", parts.join("/")))
}

/// Script declaring the asset paths and the HTML5 fallback switch
pub fn config_script(assets: &PlayerAssets, filter: &FilterConfig) -> String {
    let mut vars = format!(
        "var filter_rtmp_wwwroot='{}';",
        UrlUtils::escape_js_string(&assets.www_root)
    );
    for kind in AssetKind::ALL {
        if let Some(path) = assets.get(kind) {
            vars.push_str(&format!(
                "var filter_rtmp_flowplayer_{}='{}';",
                kind.key(),
                UrlUtils::escape_js_string(path)
            ));
        }
    }
    vars.push_str(&format!(
        "var filter_rtmp_hls_fallback={};",
        filter.html5_fallback
    ));
    format!("<script>{vars}</script>")
}

/// Script that loads the browser module itself and starts it once the DOM
/// is ready, for output the host caches and replays without page requirements
pub fn self_loading_script(module_url: &str) -> String {
    format!(
        "<script>(function(d){{var s=d.createElement('script');s.src='{}';\
s.onload=function(){{if(d.readyState==='loading'){{d.addEventListener('DOMContentLoaded',function(){{M.filter_rtmp.init();}});}}else{{M.filter_rtmp.init();}}}};\
d.head.appendChild(s);}})(document);</script>",
        UrlUtils::escape_js_string(module_url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn player_config(root: &Path) -> PlayerConfig {
        PlayerConfig {
            dir_root: root.to_path_buf(),
            lib_dir: root.join("lib/flowplayer"),
            filter_dir: root.join("filter/rtmp"),
            www_root: "https://lms.example.edu/".to_string(),
            module_path: "/static/module.js".to_string(),
        }
    }

    #[test]
    fn test_discover_versioned_assets() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lib/flowplayer")).unwrap();
        fs::create_dir_all(root.join("filter/rtmp")).unwrap();
        for name in [
            "lib/flowplayer/flowplayer-3.2.13.min.js",
            "lib/flowplayer/flowplayer-3.2.18.swf",
            "lib/flowplayer/flowplayer.controls-3.2.16.swf",
            "lib/flowplayer/flowplayer.js",
            "filter/rtmp/flowplayer.rtmp-3.2.13.swf",
            "filter/rtmp/flowplayer.captions-3.2.10.swf",
        ] {
            fs::write(root.join(name), b"").unwrap();
        }

        let assets = PlayerAssets::discover(&player_config(root));
        assert_eq!(assets.www_root, "https://lms.example.edu");
        assert_eq!(
            assets.script.as_deref(),
            Some("/lib/flowplayer/flowplayer-3.2.13.min.js")
        );
        assert_eq!(
            assets.player.as_deref(),
            Some("/lib/flowplayer/flowplayer-3.2.18.swf")
        );
        assert_eq!(
            assets.rtmp.as_deref(),
            Some("/filter/rtmp/flowplayer.rtmp-3.2.13.swf")
        );
        assert_eq!(
            assets.captions.as_deref(),
            Some("/filter/rtmp/flowplayer.captions-3.2.10.swf")
        );
        assert_eq!(assets.content, None);
    }

    #[test]
    fn test_version_digits_are_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lib/flowplayer")).unwrap();
        fs::write(root.join("lib/flowplayer/flowplayer-\u{0663}.2.13.min.js"), b"").unwrap();

        let assets = PlayerAssets::discover(&player_config(root));
        assert_eq!(assets.script, None);
    }

    #[test]
    fn test_missing_directories_yield_no_assets() {
        let dir = tempfile::tempdir().unwrap();
        let assets = PlayerAssets::discover(&player_config(&dir.path().join("absent")));
        assert_eq!(assets.script, None);
        assert_eq!(assets.rtmp, None);
    }

    #[test]
    fn test_config_script() {
        let assets = PlayerAssets {
            www_root: "https://lms.example.edu".to_string(),
            script: Some("/lib/flowplayer/flowplayer-3.2.13.min.js".to_string()),
            rtmp: Some("/filter/rtmp/flowplayer.rtmp-3.2.13.swf".to_string()),
            ..PlayerAssets::default()
        };
        let script = config_script(&assets, &FilterConfig::default());

        assert!(script.starts_with("<script>var filter_rtmp_wwwroot='https://lms.example.edu';"));
        assert!(script.contains("var filter_rtmp_flowplayer_js='/lib/flowplayer/flowplayer-3.2.13.min.js';"));
        assert!(script.contains("var filter_rtmp_flowplayer_rtmp="));
        assert!(!script.contains("filter_rtmp_flowplayer_swf"));
        assert!(script.ends_with("var filter_rtmp_hls_fallback=false;</script>"));
    }

    #[test]
    fn test_self_loading_script() {
        let script = self_loading_script("https://lms.example.edu/static/module.js");
        assert!(script.contains("s.src='https://lms.example.edu/static/module.js'"));
        assert!(script.contains("M.filter_rtmp.init()"));
    }
}
