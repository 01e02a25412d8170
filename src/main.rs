use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rtmp_filter::{
    config::Config,
    database::Database,
    filter::{playlist_references, ContentFilter, PageState},
    models::{PlaylistUpsertRequest, ScopeId},
    playlist::{InMemoryPlaylistLookup, MemoizedPlaylistLookup},
    repositories::PlaylistRepository,
    resolver::{self, playlist_name},
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "rtmp-filter")]
#[command(version)]
#[command(about = "Turns rtmp:// links in HTML into embedded stream players")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL", global = true)]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter HTML from a file or stdin to stdout
    Filter {
        /// Input file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Scope playlist references are resolved in
        #[arg(short, long, default_value_t = 0)]
        scope: ScopeId,
        /// Emit a self-loading bootstrap for cached output
        #[arg(long)]
        cache_text: bool,
    },
    /// Resolve one href and print the result as JSON
    Resolve {
        href: String,
        #[arg(short, long, default_value_t = 0)]
        scope: ScopeId,
    },
    /// Run the HTTP service
    Serve {
        /// Listening IP address
        #[arg(short = 'H', long, value_name = "IP")]
        host: Option<String>,
        /// Listening port
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },
    /// Manage stored playlists
    Playlist {
        #[command(subcommand)]
        action: PlaylistCommand,
    },
}

#[derive(Subcommand)]
enum PlaylistCommand {
    /// Create or replace a playlist; entries are read one per line as `url[,title]`
    Add {
        scope: ScopeId,
        name: String,
        /// File holding the entries (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// List the playlists of a scope
    List { scope: ScopeId },
    /// Delete a playlist
    Remove { scope: ScopeId, name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("rtmp_filter={},tower_http=trace", cli.log_level)
    } else {
        format!("rtmp_filter={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    match cli.command {
        Command::Filter {
            input,
            scope,
            cache_text,
        } => {
            let text = read_input(input.as_ref())?;
            let filter = ContentFilter::from_config(&config)?;
            let names = playlist_references(&text);
            let lookup = MemoizedPlaylistLookup::new(preload(&config, scope, &names).await);

            let mut page = PageState::new(scope).with_cache_text(cache_text);
            let output = filter.filter(&text, &mut page, &lookup);
            std::io::stdout().write_all(output.as_bytes())?;
            if page.module_required() {
                info!(
                    "Output needs {}{} included and M.filter_rtmp.init() called",
                    config.player.www_root.trim_end_matches('/'),
                    config.player.module_path
                );
            }
        }
        Command::Resolve { href, scope } => {
            let names: Vec<String> = href.split('#').filter_map(playlist_name).collect();
            let lookup = preload(&config, scope, &names).await;
            match resolver::resolve(&href, config.filter.default_captions, scope, &lookup) {
                Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                None => anyhow::bail!("'{}' does not resolve to any stream", href),
            }
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.web.host = host;
            }
            if let Some(port) = port {
                config.web.port = port;
            }

            info!("Starting rtmp-filter service v{}", env!("CARGO_PKG_VERSION"));
            info!("Using database: {}", config.database.url);
            let database = Database::new(&config.database).await?;
            database.migrate().await?;
            info!("Database connection established and migrations applied");

            let filter = ContentFilter::from_config(&config)?;
            let repo = PlaylistRepository::new(database.pool());
            let server = WebServer::new(AppState::new(config, filter, Some(repo)))?;
            info!("Web server listening on {}:{}", server.host(), server.port());
            server.serve().await?;
        }
        Command::Playlist { action } => {
            let repo = open_repository(&config).await?;
            match action {
                PlaylistCommand::Add { scope, name, file } => {
                    let list = read_input(file.as_ref())?;
                    let record = repo
                        .upsert(PlaylistUpsertRequest { scope, name, list })
                        .await?;
                    println!(
                        "Stored playlist '{}' in scope {} ({} entries)",
                        record.name,
                        record.scope,
                        record.entries().len()
                    );
                }
                PlaylistCommand::List { scope } => {
                    for record in repo.list_for_scope(scope).await? {
                        println!("{}\t{} entries", record.name, record.entries().len());
                    }
                }
                PlaylistCommand::Remove { scope, name } => {
                    repo.delete_by_name(scope, &name).await?;
                    println!("Removed playlist '{}' from scope {}", name, scope);
                }
            }
        }
    }

    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

async fn open_repository(config: &Config) -> Result<PlaylistRepository> {
    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    Ok(PlaylistRepository::new(database.pool()))
}

/// Load referenced playlists; without storage every reference stays unresolved
async fn preload(config: &Config, scope: ScopeId, names: &[String]) -> InMemoryPlaylistLookup {
    if names.is_empty() {
        return InMemoryPlaylistLookup::new();
    }
    match open_repository(config).await {
        Ok(repo) => repo.load_lookup(scope, names).await,
        Err(e) => {
            warn!("Playlist storage unavailable: {}", e);
            InMemoryPlaylistLookup::new()
        }
    }
}
