//! # shop-kit
//!
//! Product and order backend for a small online store: catalog search with
//! pagination, order placement with stock reduction, media uploads, an admin
//! dashboard and a read-through cache that every write invalidates.
//!
//! ## Layers
//!
//! - **Stores:** [`repository`] traits with an in-memory [`InMemoryDatastore`]
//! - **Cache:** [`CacheService`] over any [`CacheBackend`] (in-memory or Redis),
//!   keyed by [`CacheKey`] and cleared through [`Invalidation`]
//! - **Media:** [`media::MediaStore`] with local disk and Cloudinary backends
//! - **Services:** [`services`] hold the business rules
//! - **HTTP:** [`http::router`] exposes everything under `/api/v1`
//!
//! ## Quick Start
//!
//! ```ignore
//! use shop_kit::backend::InMemoryBackend;
//! use shop_kit::http::{router, AppState};
//! use shop_kit::media::InMemoryMediaStore;
//! use shop_kit::InMemoryDatastore;
//!
//! let state = AppState::new(
//!     InMemoryDatastore::new(),
//!     InMemoryBackend::new(),
//!     InMemoryMediaStore::new(),
//!     8,
//! );
//! let app = router(state, None);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:4000").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! ## Cache entries
//!
//! Values are stored as postcard bytes inside a versioned envelope (see
//! [`serialization`]). An entry with a bad header or an old schema version is
//! evicted and reloaded from the store on the next read.

#[macro_use]
extern crate log;

pub mod backend;
pub mod cache;
pub mod charts;
pub mod config;
pub mod error;
pub mod http;
pub mod invalidation;
pub mod key;
pub mod media;
pub mod models;
pub mod observability;
pub mod query;
pub mod repository;
pub mod serialization;
pub mod services;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use cache::CacheService;
pub use config::AppConfig;
pub use error::{Error, Result};
pub use invalidation::Invalidation;
pub use key::CacheKey;
pub use query::{SearchPage, SearchQuery};
pub use repository::{DataRepository, Datastore, InMemoryDatastore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
