//! Read-through catalog cache.
//!
//! Product lookups happen on every cart add, so products and listings are
//! cached with `moka` (5-minute TTL). Misses are not cached.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use brana_core::ProductId;

use crate::db::{ProductStore, RepositoryError};
use crate::models::Product;

#[derive(Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}

/// Cached access to the product catalog.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    products: Arc<dyn ProductStore>,
    cache: Cache<String, CacheValue>,
}

impl Catalog {
    /// Wrap a product store.
    #[must_use]
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogInner { products, cache }),
        }
    }

    /// A product by id, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let cache_key = format!("product:{id}");
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let product = self.inner.products.get(id).await?;
        if let Some(product) = &product {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }

    /// Active products, optionally in one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self, category: Option<&str>) -> Result<Arc<Vec<Product>>, RepositoryError> {
        let cache_key = format!("products:{}", category.unwrap_or("*"));
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let products = Arc::new(self.inner.products.list(category).await?);
        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Drop every cached entry (after catalog writes).
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use brana_core::LocalizedText;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::MemoryStore;

    fn psalter(price: i64) -> Product {
        Product {
            id: ProductId::from("p1"),
            name: LocalizedText::new("Psalter facsimile", "የዳዊት መዝሙር ቅጂ"),
            description: LocalizedText::default(),
            price: Decimal::new(price, 0),
            image: None,
            category: "facsimiles".to_string(),
            stock: 3,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_product_is_cached_until_invalidated() {
        let store = Arc::new(MemoryStore::new());
        store.upsert(&psalter(450)).await.unwrap();
        let catalog = Catalog::new(store.clone());

        let first = catalog.product(&ProductId::from("p1")).await.unwrap().unwrap();
        assert_eq!(first.price, Decimal::new(450, 0));

        store.upsert(&psalter(500)).await.unwrap();
        let cached = catalog.product(&ProductId::from("p1")).await.unwrap().unwrap();
        assert_eq!(cached.price, Decimal::new(450, 0));

        catalog.invalidate_all();
        let fresh = catalog.product(&ProductId::from("p1")).await.unwrap().unwrap();
        assert_eq!(fresh.price, Decimal::new(500, 0));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let catalog = Catalog::new(store.clone());

        assert!(catalog.product(&ProductId::from("p1")).await.unwrap().is_none());
        store.upsert(&psalter(450)).await.unwrap();
        assert!(catalog.product(&ProductId::from("p1")).await.unwrap().is_some());
    }
}
