//! Environment-driven configuration.
//!
//! Values come from the process environment. The binary loads a `.env` file
//! into the environment before reading them.

use crate::ai::openai::client::DEFAULT_BASE_URL;
use crate::ai::openai::image::DEFAULT_IMAGE_MODEL;
use crate::cache::MongoCacheConfig;
use crate::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_MONGODB_DATABASE: &str = "pictionary-app";
pub const DEFAULT_MONGODB_COLLECTION: &str = "cache";
/// Upper bound on one image generation call. DALL-E 3 routinely takes longer
/// than 10 seconds, so this is well above the store timeouts. Override with
/// `OPENAI_TIMEOUT_SECS`.
pub const DEFAULT_OPENAI_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    MongoDb,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Config(format!(
                "CACHE_BACKEND must be 'mongodb' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cache_backend: CacheBackend,
    pub mongodb: MongoCacheConfig,
    pub allowed_origins: Vec<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_image_model: String,
    pub openai_timeout: Duration,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: '{}'", port)))?,
            None => {
                warn!("PORT not set, using default: {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let uri = var("MONGODB_URI").unwrap_or_else(|| {
            warn!("MONGODB_URI not set, using default: {}", DEFAULT_MONGODB_URI);
            DEFAULT_MONGODB_URI.to_string()
        });

        let cache_backend = match var("CACHE_BACKEND") {
            Some(backend) => backend.parse()?,
            None => CacheBackend::MongoDb,
        };

        let openai_timeout = match var("OPENAI_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(secs.parse().map_err(|_| {
                Error::Config(format!("OPENAI_TIMEOUT_SECS is not a number: '{}'", secs))
            })?),
            None => DEFAULT_OPENAI_TIMEOUT,
        };

        let allowed_origins = var("FRONTEND_URL")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            cache_backend,
            mongodb: MongoCacheConfig {
                uri,
                database: var("MONGODB_DATABASE")
                    .unwrap_or_else(|| DEFAULT_MONGODB_DATABASE.to_string()),
                collection: var("MONGODB_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_MONGODB_COLLECTION.to_string()),
            },
            allowed_origins,
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            openai_image_model: var("OPENAI_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            openai_timeout,
            static_dir: var("STATIC_DIR").map(PathBuf::from),
        })
    }
}
