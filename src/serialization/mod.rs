//! Postcard-based cache serialization with versioned envelopes.
//!
//! Every cached snapshot (a product, a product list, the category list, a
//! dashboard view) is stored in the same format:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (4 bytes)│POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "SHOP"              u32                postcard::to_allocvec(T)
//! ```
//!
//! The version is bumped whenever a cached model changes shape. Entries written
//! by an older build then fail validation and are reloaded from the store
//! instead of being misread.
//!
//! Cached types must stay postcard-friendly: no `#[serde(flatten)]`, no
//! `skip_serializing_if`, no `serde_json::Value`.
//!
//! # Example
//!
//! ```rust
//! use shop_kit::serialization::{serialize_for_cache, deserialize_from_cache};
//!
//! # fn main() -> shop_kit::Result<()> {
//! let categories = vec!["shoes".to_string(), "laptops".to_string()];
//! let bytes = serialize_for_cache(&categories)?;
//! let restored: Vec<String> = deserialize_from_cache(&bytes)?;
//! assert_eq!(categories, restored);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Magic header for cache entries: b"SHOP"
pub const CACHE_MAGIC: [u8; 4] = *b"SHOP";

/// Current schema version of cached models.
///
/// Increment when a field is added, removed, reordered or retyped on any type
/// that goes through the cache (`Product`, `Order`, dashboard views).
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope for cache entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    /// Magic header: must be b"SHOP"
    pub magic: [u8; 4],
    /// Schema version: must match CURRENT_SCHEMA_VERSION
    pub version: u32,
    /// The actual cached data
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    /// Create a new envelope with current magic and version.
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Serialize a value with envelope for cache storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if Postcard serialization fails.
pub fn serialize_for_cache<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = CacheEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Deserialize a value from cache storage with validation.
///
/// Checks the magic header, then the schema version, then decodes the payload.
///
/// # Errors
///
/// - `Error::InvalidCacheEntry`: Invalid magic header
/// - `Error::VersionMismatch`: Schema version mismatch
/// - `Error::DeserializationError`: Corrupted Postcard payload
pub fn deserialize_from_cache<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        warn!("Cache deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != CACHE_MAGIC {
        warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Photo, Product};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_product() -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::now_v7(),
            name: "Trail Runner".to_string(),
            price: 129.5,
            stock: 12,
            category: "shoes".to_string(),
            photos: vec![Photo {
                id: "upload/abc".to_string(),
                url: "https://media.example/abc.jpg".to_string(),
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_product_list_survives_envelope() {
        let products = vec![sample_product(), sample_product()];

        let bytes = serialize_for_cache(&products).unwrap();
        let restored: Vec<Product> = deserialize_from_cache(&bytes).unwrap();

        assert_eq!(products, restored);
    }

    #[test]
    fn test_envelope_structure() {
        let bytes = serialize_for_cache(&"categories").unwrap();
        let envelope: CacheEnvelope<String> = postcard::from_bytes(&bytes).unwrap();

        assert_eq!(envelope.magic, CACHE_MAGIC);
        assert_eq!(envelope.version, CURRENT_SCHEMA_VERSION);
        assert_eq!(envelope.payload, "categories");
    }

    #[test]
    fn test_invalid_magic_rejected() {
        let mut bytes = vec![0u8; 32];
        bytes[0..4].copy_from_slice(b"CKIT");
        bytes[4] = 1;

        let result: Result<Vec<String>> = deserialize_from_cache(&bytes);
        match result.unwrap_err() {
            Error::InvalidCacheEntry(_) => {}
            e => panic!("Expected InvalidCacheEntry, got {:?}", e),
        }
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut envelope = CacheEnvelope::new(vec!["shoes".to_string()]);
        envelope.version = 999;

        let bytes = postcard::to_allocvec(&envelope).unwrap();
        let result: Result<Vec<String>> = deserialize_from_cache(&bytes);

        match result.unwrap_err() {
            Error::VersionMismatch { expected, found } => {
                assert_eq!(expected, CURRENT_SCHEMA_VERSION);
                assert_eq!(found, 999);
            }
            e => panic!("Expected VersionMismatch, got {:?}", e),
        }
    }

    #[test]
    fn test_corrupted_payload_rejected() {
        let mut bytes = serialize_for_cache(&sample_product()).unwrap();
        let original_len = bytes.len();
        bytes.truncate(original_len / 2);

        let result: Result<Product> = deserialize_from_cache(&bytes);
        match result.unwrap_err() {
            Error::DeserializationError(_) => {}
            e => panic!("Expected DeserializationError, got {:?}", e),
        }
    }
}
