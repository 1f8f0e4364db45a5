//! http-engine: a small HTTP/1.x server.
//!
//! Serves a handful of demo routes plus any static directories named in the
//! configuration or on the command line.

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use http_engine::config::validation::validate_config;
use http_engine::config::{load_config, ConfigError, ServerConfig, StaticConfig};
use http_engine::http::middleware::body::{json_body, BODY_LOCAL};
use http_engine::observability::{logging, metrics};
use http_engine::Server;

#[derive(Parser)]
#[command(name = "http-engine")]
#[command(about = "Minimal HTTP/1.x server", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve a directory under a route prefix, as PREFIX=DIR (repeatable)
    #[arg(long = "static", value_name = "PREFIX=DIR", value_parser = parse_static)]
    statics: Vec<StaticConfig>,
}

fn parse_static(value: &str) -> Result<StaticConfig, String> {
    let (prefix, directory) = value
        .split_once('=')
        .ok_or_else(|| format!("expected PREFIX=DIR, got '{value}'"))?;
    Ok(StaticConfig {
        prefix: prefix.to_string(),
        directory: directory.to_string(),
    })
}

fn build_config(cli: Cli) -> Result<ServerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = cli.host {
        config.listener.host = host;
    }
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    config.statics.extend(cli.statics);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn demo_routes(server: &mut Server) -> http_engine::Result<()> {
    let router = server.router_mut();

    router.get("/", |_req, res| res.send_text(200, "Hello from http-engine\n"), [])?;

    router.get(
        "/health",
        |_req, res| res.send_json(200, &json!({ "status": "ok" })),
        [],
    )?;

    router.get(
        "/users/:id",
        |req, res| {
            let id = req.param("id").unwrap_or_default().to_string();
            res.send_json(200, &json!({ "id": id }));
        },
        [],
    )?;

    router.post(
        "/echo",
        |req, res| match req.locals.get(BODY_LOCAL) {
            Some(body) => res.send_json(200, body),
            None => res.send(200, "application/octet-stream", req.body.clone()),
        },
        [],
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(Cli::parse())?;

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "http-engine starting");
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        read_timeout_secs = config.timeouts.read_secs,
        keep_alive = config.keep_alive.enabled,
        statics = config.statics.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut server = Server::new(config)?;
    server.use_middleware(json_body());
    demo_routes(&mut server)?;

    server.listen().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
