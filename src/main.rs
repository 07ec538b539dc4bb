use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pictionary_server::api::{self, RouterOptions};
use pictionary_server::app::{self, App};
use pictionary_server::config::Config;
use pictionary_server::logging::{self, LogSettings};
use pictionary_server::models::CacheKey;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "pictionary-server")]
#[command(about = "Serve cached AI sketches for dictionary words")]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Overrides PORT.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Remove every cached image.
    ClearCache,
    /// Remove the cached image for one dictionary entry.
    DeleteEntry {
        #[arg(long)]
        word: String,
        #[arg(long, default_value = "")]
        part_of_speech: String,
        #[arg(long)]
        definition: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Error loading .env file: {}", e);
        }
    }

    let _guard = logging::init(&LogSettings::from_env()).context("failed to set up logging")?;
    let args = CliArgs::parse();
    let config = Config::from_env().context("invalid configuration")?;

    let result = match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(config, port).await,
        Command::ClearCache => clear_cache(&config).await,
        Command::DeleteEntry {
            word,
            part_of_speech,
            definition,
        } => delete_entry(&config, CacheKey::new(word, part_of_speech, definition)).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn serve(config: Config, port: Option<u16>) -> Result<()> {
    info!("Starting pictionary-server");

    let app = Arc::new(
        App::from_config(&config)
            .await
            .context("failed to initialize application")?,
    );
    let router = api::build_router(
        app.clone(),
        RouterOptions {
            allowed_origins: config.allowed_origins.clone(),
            static_dir: config.static_dir.clone(),
        },
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.port)));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server starting on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutting down server...");
    app.cache().close().await;
    info!("Server exited");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn clear_cache(config: &Config) -> Result<()> {
    let cache = app::open_cache(config).await?;
    let removed = cache.clear().await.context("failed to clear cache")?;
    info!("Removed {} cached images", removed);
    cache.close().await;
    Ok(())
}

async fn delete_entry(config: &Config, key: CacheKey) -> Result<()> {
    let cache = app::open_cache(config).await?;
    cache
        .delete(&key)
        .await
        .with_context(|| format!("failed to delete cache entry {}", key))?;
    info!("Deleted cache entry {}", key);
    cache.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CliArgs, Command};
    use clap::Parser;

    #[test]
    fn test_no_subcommand_means_serve() {
        let args = CliArgs::try_parse_from(["pictionary-server"]).unwrap();
        assert_eq!(args.command, None);
    }

    #[test]
    fn test_serve_port_override() {
        let args = CliArgs::try_parse_from(["pictionary-server", "serve", "--port", "9000"]).unwrap();
        assert_eq!(args.command, Some(Command::Serve { port: Some(9000) }));
    }

    #[test]
    fn test_delete_entry_defaults_part_of_speech() {
        let args = CliArgs::try_parse_from([
            "pictionary-server",
            "delete-entry",
            "--word",
            "cat",
            "--definition",
            "a small domesticated feline",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Some(Command::DeleteEntry {
                word: "cat".to_string(),
                part_of_speech: String::new(),
                definition: "a small domesticated feline".to_string(),
            })
        );
    }

    #[test]
    fn test_delete_entry_requires_word() {
        assert!(CliArgs::try_parse_from(["pictionary-server", "delete-entry", "--definition", "x"])
            .is_err());
    }
}
