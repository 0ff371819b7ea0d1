//! Catalog persistence.

use async_trait::async_trait;
use rust_decimal::Decimal;

use brana_core::{LocalizedText, ProductId};

use super::{PgStore, RepositoryError};
use crate::models::Product;

/// Persistence for the product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Active products, optionally restricted to one category, ordered by id.
    async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError>;

    /// A product by id, active or not.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert or overwrite a product.
    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Number of active products.
    async fn count_active(&self) -> Result<u64, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name_en: String,
    name_am: Option<String>,
    description_en: String,
    description_am: Option<String>,
    price: Decimal,
    image: Option<String>,
    category: String,
    stock: i32,
    active: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::from(row.id.as_str()),
            name: LocalizedText {
                en: row.name_en,
                am: row.name_am,
            },
            description: LocalizedText {
                en: row.description_en,
                am: row.description_am,
            },
            price: row.price,
            image: row.image,
            category: row.category,
            stock: row.stock,
            active: row.active,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name_en, name_am, description_en, description_am, \
                               price, image, category, stock, active";

#[async_trait]
impl ProductStore for PgStore {
    async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product
             WHERE active AND ($1::TEXT IS NULL OR category = $1)
             ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Product::from))
    }

    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.product
                (id, name_en, name_am, description_en, description_am,
                 price, image, category, stock, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name_en = EXCLUDED.name_en,
                name_am = EXCLUDED.name_am,
                description_en = EXCLUDED.description_en,
                description_am = EXCLUDED.description_am,
                price = EXCLUDED.price,
                image = EXCLUDED.image,
                category = EXCLUDED.category,
                stock = EXCLUDED.stock,
                active = EXCLUDED.active,
                updated_at = now()
            ",
        )
        .bind(&product.id)
        .bind(&product.name.en)
        .bind(product.name.am.as_deref())
        .bind(&product.description.en)
        .bind(product.description.am.as_deref())
        .bind(product.price)
        .bind(product.image.as_deref())
        .bind(&product.category)
        .bind(product.stock)
        .bind(product.active)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn count_active(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.product WHERE active")
            .fetch_one(self.pool())
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
