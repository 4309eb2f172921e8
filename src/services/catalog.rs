//! Product catalog: cached reads, search, and admin writes.

use crate::backend::CacheBackend;
use crate::cache::CacheService;
use crate::error::{Error, Result};
use crate::invalidation::Invalidation;
use crate::key::CacheKey;
use crate::media::{MediaFile, MediaStore};
use crate::models::{NewProduct, Product, ProductPatch};
use crate::query::{self, SearchPage, SearchQuery};
use crate::repository::{DataRepository, Datastore, ProductRepository};
use uuid::Uuid;

/// Number of products on the "latest" shelf.
pub const LATEST_PRODUCTS: usize = 5;

/// Maximum photos per product.
pub const MAX_PHOTOS: usize = 5;

/// Text fields of a product form. Blank values count as absent.
#[derive(Clone, Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub price: Option<String>,
    pub stock: Option<String>,
    pub category: Option<String>,
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn number<T: std::str::FromStr>(value: &Option<String>, field: &str) -> Result<Option<T>> {
    text(value)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| Error::validation(format!("Invalid {}", field)))
        })
        .transpose()
}

impl ProductForm {
    /// Every field is required.
    pub fn into_new_product(self) -> Result<NewProduct> {
        let price = number::<f64>(&self.price, "price")?;
        let stock = number::<i64>(&self.stock, "stock")?;

        match (text(&self.name), price, stock, text(&self.category)) {
            (Some(name), Some(price), Some(stock), Some(category)) => {
                if !price.is_finite() || price < 0.0 {
                    return Err(Error::validation("Invalid price"));
                }
                Ok(NewProduct {
                    name,
                    price,
                    stock,
                    category,
                })
            }
            _ => Err(Error::validation("Please enter all fields")),
        }
    }

    /// Only the present fields change.
    pub fn into_patch(self) -> Result<ProductPatch> {
        let price = number::<f64>(&self.price, "price")?;
        if matches!(price, Some(p) if !p.is_finite() || p < 0.0) {
            return Err(Error::validation("Invalid price"));
        }

        Ok(ProductPatch {
            name: text(&self.name),
            price,
            stock: number::<i64>(&self.stock, "stock")?,
            category: text(&self.category),
        })
    }
}

/// Service layer for products. Coordinates store, cache and media.
pub struct CatalogService<D: Datastore, B: CacheBackend, M: MediaStore> {
    store: D,
    cache: CacheService<B>,
    media: M,
    page_size: usize,
}

impl<D: Datastore, B: CacheBackend, M: MediaStore> Clone for CatalogService<D, B, M> {
    fn clone(&self) -> Self {
        CatalogService {
            store: self.store.clone(),
            cache: self.cache.clone(),
            media: self.media.clone(),
            page_size: self.page_size,
        }
    }
}

impl<D: Datastore, B: CacheBackend, M: MediaStore> CatalogService<D, B, M> {
    pub fn new(store: D, cache: CacheService<B>, media: M, page_size: usize) -> Self {
        Self {
            store,
            cache,
            media,
            page_size,
        }
    }

    /// Five newest products.
    pub async fn latest(&self) -> Result<Vec<Product>> {
        self.cache
            .fetch_or_load(&CacheKey::LatestProducts, || {
                ProductRepository::latest(self.store.products(), LATEST_PRODUCTS)
            })
            .await
    }

    /// Distinct categories.
    pub async fn categories(&self) -> Result<Vec<String>> {
        self.cache
            .fetch_or_load(&CacheKey::Categories, || self.store.products().categories())
            .await
    }

    /// Every product, for the admin table.
    pub async fn all_products(&self) -> Result<Vec<Product>> {
        self.cache
            .fetch_or_load(&CacheKey::AllProducts, || self.store.products().fetch_all())
            .await
    }

    /// One product. A missing product is not cached.
    pub async fn product(&self, id: Uuid) -> Result<Product> {
        self.cache
            .fetch_or_load(&CacheKey::Product(id), || async move {
                self.store
                    .products()
                    .fetch_by_id(&id)
                    .await?
                    .ok_or_else(|| Error::not_found("Product Not Found"))
            })
            .await
    }

    /// Filtered, paged search. Never cached.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        let plan = query.plan(self.page_size)?;
        query::execute(self.store.products(), &plan).await
    }

    /// Create a product from a form and 1 to 5 photos.
    ///
    /// Photos are uploaded before the product is written; a failed upload
    /// leaves nothing behind.
    pub async fn create(&self, form: ProductForm, photos: Vec<MediaFile>) -> Result<Product> {
        if photos.is_empty() {
            return Err(Error::validation("Please Add Photo"));
        }
        if photos.len() > MAX_PHOTOS {
            return Err(Error::validation("You can only upload 5 Photos"));
        }
        let draft = form.into_new_product()?;

        let stored = self.media.upload(&photos).await?;
        let product = self
            .store
            .products()
            .save(Product::new(draft, stored))
            .await?;
        info!("[Catalog] Created product {} ({})", product.id, product.name);

        self.cache
            .invalidate(&Invalidation::new().products().admin())
            .await?;

        Ok(product)
    }

    /// Apply a partial update. New photos replace the old set and the old
    /// assets are deleted from the media store.
    pub async fn update(
        &self,
        id: Uuid,
        form: ProductForm,
        photos: Vec<MediaFile>,
    ) -> Result<Product> {
        if photos.len() > MAX_PHOTOS {
            return Err(Error::validation("You can only upload 5 Photos"));
        }
        let patch = form.into_patch()?;

        let mut product = self
            .store
            .products()
            .fetch_by_id(&id)
            .await?
            .ok_or_else(|| Error::not_found("Product Not Found"))?;

        if !photos.is_empty() {
            let stored = self.media.upload(&photos).await?;
            let report = self.media.delete(&product.photo_ids()).await;
            if !report.is_complete() {
                warn!(
                    "[Catalog] Product {}: {} old photos not deleted: {:?}",
                    id, report.failed, report.errors
                );
            }
            product.photos = stored;
        }

        product.apply(patch);
        let product = self.store.products().save(product).await?;
        info!("[Catalog] Updated product {}", id);

        self.cache
            .invalidate(&Invalidation::new().products().admin().product_id(id))
            .await?;

        Ok(product)
    }

    /// Delete a product and its photos.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let product = self
            .store
            .products()
            .fetch_by_id(&id)
            .await?
            .ok_or_else(|| Error::not_found("Product Not Found"))?;

        let report = self.media.delete(&product.photo_ids()).await;
        if !report.is_complete() {
            warn!(
                "[Catalog] Product {}: {} photos not deleted: {:?}",
                id, report.failed, report.errors
            );
        }

        self.store.products().remove(&id).await?;
        info!("[Catalog] Deleted product {}", id);

        self.cache
            .invalidate(&Invalidation::new().products().admin().product_id(id))
            .await?;

        Ok(())
    }
}
