use rust_embed::RustEmbed;

/// Embedded browser assets (player module)
#[derive(RustEmbed)]
#[folder = "static/"]
#[prefix = "static/"]
pub struct StaticAssets;

/// Embedded database migrations
#[derive(RustEmbed)]
#[folder = "src/database/migrations/"]
#[prefix = "migrations/"]
pub struct MigrationAssets;

/// Path of the browser module inside [`StaticAssets`]
pub const PLAYER_MODULE: &str = "static/module.js";

impl StaticAssets {
    /// Get a static asset by path
    pub fn get_asset(path: &str) -> Option<rust_embed::EmbeddedFile> {
        Self::get(path)
    }

    /// Get the content type for a given file extension
    pub fn get_content_type(path: &str) -> &'static str {
        match path.split('.').next_back() {
            Some("html") => "text/html; charset=utf-8",
            Some("css") => "text/css; charset=utf-8",
            Some("js") => "application/javascript; charset=utf-8",
            Some("json") => "application/json; charset=utf-8",
            Some("swf") => "application/x-shockwave-flash",
            Some("vtt") => "text/vtt; charset=utf-8",
            Some("m3u8") => "application/vnd.apple.mpegurl",
            Some("png") => "image/png",
            Some("svg") => "image/svg+xml; charset=utf-8",
            _ => "application/octet-stream",
        }
    }

    /// Source of the browser player module
    pub fn player_module() -> Option<String> {
        Self::get(PLAYER_MODULE).map(|file| String::from_utf8_lossy(&file.data).into_owned())
    }
}

impl MigrationAssets {
    /// Get all migration files in order
    pub fn get_migrations() -> Vec<(String, String)> {
        let mut migrations = Vec::new();

        for file_path in Self::iter() {
            if let Some(file) = Self::get(&file_path) {
                let content = String::from_utf8_lossy(&file.data).to_string();
                let name = file_path
                    .strip_prefix("migrations/")
                    .unwrap_or(&file_path)
                    .to_string();
                migrations.push((name, content));
            }
        }

        migrations.sort_by(|a, b| a.0.cmp(&b.0));
        migrations
    }
}
