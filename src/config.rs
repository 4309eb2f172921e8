//! Application configuration loaded from environment variables.
//!
//! | Variable                 | Default     |
//! |--------------------------|-------------|
//! | `SERVER_HOST`            | `127.0.0.1` |
//! | `PORT`                   | `4000`      |
//! | `PRODUCT_PER_PAGE`       | `8`         |
//! | `CACHE_BACKEND`          | `memory` (`memory` or `redis`) |
//! | `REDIS_URL`              | required for `redis` |
//! | `MEDIA_BACKEND`          | `local` (`local` or `cloudinary`) |
//! | `UPLOAD_DIR`             | `uploads`   |
//! | `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` | required for `cloudinary` |
//! | `CLOUDINARY_FOLDER`      | `upload`    |
//! | `MEDIA_TIMEOUT_SECS`     | `30`        |
//!
//! Call `dotenv::dotenv()` first to pick up a `.env` file.

use crate::error::{Error, Result};
use crate::media::CloudinaryConfig;
use crate::query::DEFAULT_PAGE_SIZE;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheBackendKind {
    Memory,
    Redis { url: String },
}

#[derive(Clone, Debug)]
pub enum MediaBackendKind {
    Local { upload_dir: PathBuf },
    Cloudinary(CloudinaryConfig),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub page_size: usize,
    pub cache: CacheBackendKind,
    pub media: MediaBackendKind,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for invalid values or missing required
    /// variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which returns a variable's
    /// value if it is set.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for invalid values or missing required
    /// variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &str, for_backend: &str| {
            var(name).ok_or_else(|| {
                Error::ConfigError(format!("{} is required for {}", name, for_backend))
            })
        };

        let host = match var("SERVER_HOST") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::ConfigError(format!("SERVER_HOST is not an IP address: {}", raw)))?,
            None => IpAddr::from([127, 0, 0, 1]),
        };

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::ConfigError(format!("PORT is not a port number: {}", raw)))?,
            None => 4000,
        };

        let page_size = var("PRODUCT_PER_PAGE")
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let cache = match var("CACHE_BACKEND").as_deref() {
            None | Some("memory") => CacheBackendKind::Memory,
            Some("redis") => CacheBackendKind::Redis {
                url: required("REDIS_URL", "CACHE_BACKEND=redis")?,
            },
            Some(other) => {
                return Err(Error::ConfigError(format!(
                    "CACHE_BACKEND must be memory or redis, got {}",
                    other
                )))
            }
        };

        let media = match var("MEDIA_BACKEND").as_deref() {
            None | Some("local") => MediaBackendKind::Local {
                upload_dir: PathBuf::from(var("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
            },
            Some("cloudinary") => {
                let backend = "MEDIA_BACKEND=cloudinary";
                let mut cloudinary = CloudinaryConfig::new(
                    required("CLOUDINARY_CLOUD_NAME", backend)?,
                    required("CLOUDINARY_API_KEY", backend)?,
                    required("CLOUDINARY_API_SECRET", backend)?,
                );
                if let Some(folder) = var("CLOUDINARY_FOLDER") {
                    cloudinary.folder = folder;
                }
                if let Some(raw) = var("MEDIA_TIMEOUT_SECS") {
                    let secs: u64 = raw.parse().map_err(|_| {
                        Error::ConfigError(format!("MEDIA_TIMEOUT_SECS is not a number: {}", raw))
                    })?;
                    cloudinary.timeout = Duration::from_secs(secs);
                }
                MediaBackendKind::Cloudinary(cloudinary)
            }
            Some(other) => {
                return Err(Error::ConfigError(format!(
                    "MEDIA_BACKEND must be local or cloudinary, got {}",
                    other
                )))
            }
        };

        Ok(AppConfig {
            host,
            port,
            page_size,
            cache,
            media,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
