use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use stock_catalog::{Catalog, load_location_overrides};
use stock_morphy::Singularizer;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use stockspeak::{AppState, IndexCache, SERVER_CATALOG_KEY, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_CATALOG: &str = "catalog.json";
const DEFAULT_LOCATION: &str = "default";
const DEFAULT_MAX_TRANSCRIPT_LEN: usize = 4096;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config();
    info!("binding to {}:{}", config.host, config.port);
    info!("using catalog at {}", config.catalog_path.display());
    info!(
        "default location {:?}, max transcript length {}",
        config.default_location, config.max_transcript_len
    );

    let start = Instant::now();
    let catalog = if config.catalog_path.exists() {
        Catalog::load(&config.catalog_path)?
    } else {
        warn!(
            "catalog {} not found; starting with an empty catalog",
            config.catalog_path.display()
        );
        Catalog::default()
    };
    info!(
        "catalog loaded in {} ms ({} items)",
        start.elapsed().as_millis(),
        catalog.len()
    );

    let overrides = match &config.overrides_path {
        Some(path) => {
            let overrides = load_location_overrides(path)?;
            info!(
                "loaded overrides for {} locations from {}",
                overrides.len(),
                path.display()
            );
            overrides
        }
        None => HashMap::new(),
    };

    let singularizer = match &config.exceptions_path {
        Some(path) => Singularizer::load(path)?,
        None => Singularizer::new(),
    };

    let cache = IndexCache::new(singularizer);
    // Warm the server catalog's index.
    let parser = cache.parser_for(SERVER_CATALOG_KEY, catalog.items());
    info!("index ready with {} keys", parser.index().len());

    let state = AppState {
        overrides: Arc::new(overrides),
        default_location: config.default_location,
        max_transcript_len: config.max_transcript_len,
        ..AppState::new(catalog.into_items(), cache)
    };

    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen address")?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    catalog_path: PathBuf,
    overrides_path: Option<PathBuf>,
    exceptions_path: Option<PathBuf>,
    default_location: String,
    max_transcript_len: usize,
}

fn load_config() -> Config {
    let mut cli_catalog: Option<PathBuf> = None;
    let mut cli_overrides: Option<PathBuf> = None;
    let mut cli_exceptions: Option<PathBuf> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--catalog" => cli_catalog = args.next().map(PathBuf::from),
            "--overrides" => cli_overrides = args.next().map(PathBuf::from),
            "--exceptions" => cli_exceptions = args.next().map(PathBuf::from),
            _ => {
                if let Some(path) = arg.strip_prefix("--catalog=") {
                    cli_catalog = Some(PathBuf::from(path));
                } else if let Some(path) = arg.strip_prefix("--overrides=") {
                    cli_overrides = Some(PathBuf::from(path));
                } else if let Some(path) = arg.strip_prefix("--exceptions=") {
                    cli_exceptions = Some(PathBuf::from(path));
                }
            }
        }
    }

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let catalog_path = cli_catalog
        .or_else(|| env::var("CATALOG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG));
    let overrides_path =
        cli_overrides.or_else(|| env::var("OVERRIDES_PATH").ok().map(PathBuf::from));
    let exceptions_path =
        cli_exceptions.or_else(|| env::var("SINGULAR_EXCEPTIONS_PATH").ok().map(PathBuf::from));
    let default_location = env::var("DEFAULT_LOCATION")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    let max_transcript_len = env::var("MAX_TRANSCRIPT_LEN")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_MAX_TRANSCRIPT_LEN);

    Config {
        host,
        port,
        catalog_path,
        overrides_path,
        exceptions_path,
        default_location,
        max_transcript_len,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
