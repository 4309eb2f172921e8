use log::{error, info};
use shop_kit::backend::{CacheBackend, InMemoryBackend};
use shop_kit::config::{AppConfig, CacheBackendKind, MediaBackendKind};
use shop_kit::http::{router, AppState};
use shop_kit::media::{CloudinaryMediaStore, LocalMediaStore, MediaBackend};
use shop_kit::{Error, InMemoryDatastore, Result};
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .ok();

    if let Err(e) = run().await {
        error!("shop-kit stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::from_env()?;

    let (media, uploads_dir) = match &config.media {
        MediaBackendKind::Local { upload_dir } => (
            MediaBackend::Local(LocalMediaStore::new(upload_dir.clone())?),
            Some(upload_dir.clone()),
        ),
        MediaBackendKind::Cloudinary(cloudinary) => (
            MediaBackend::Cloudinary(CloudinaryMediaStore::new(cloudinary.clone())?),
            None,
        ),
    };
    info!("Media backend: {}", media.name());

    match &config.cache {
        CacheBackendKind::Memory => {
            info!("Cache backend: memory");
            serve(&config, InMemoryBackend::new(), media, uploads_dir).await
        }
        #[cfg(feature = "redis")]
        CacheBackendKind::Redis { url } => {
            use shop_kit::backend::{RedisBackend, RedisConfig};

            info!("Cache backend: redis");
            let backend = RedisBackend::new(RedisConfig::from_url(url.clone()))?;
            serve(&config, backend, media, uploads_dir).await
        }
        #[cfg(not(feature = "redis"))]
        CacheBackendKind::Redis { .. } => Err(Error::ConfigError(
            "CACHE_BACKEND=redis needs the `redis` feature".to_string(),
        )),
    }
}

async fn serve<B: CacheBackend>(
    config: &AppConfig,
    backend: B,
    media: MediaBackend,
    uploads_dir: Option<PathBuf>,
) -> Result<()> {
    let state = AppState::new(InMemoryDatastore::new(), backend, media, config.page_size);

    if !state.cache.health_check().await? {
        return Err(Error::BackendError("Cache backend is not healthy".to_string()));
    }

    let app = router(state, uploads_dir.as_deref());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("shop-kit {} listening on http://{}", shop_kit::VERSION, addr);
    info!("API: http://{}/api/v1/product/latest", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
