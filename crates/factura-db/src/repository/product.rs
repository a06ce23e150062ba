//! # Product Repository
//!
//! Database operations for products.
//!
//! A product belongs to exactly one factory; its price is the value copied
//! onto invoice lines at add-time (see the snapshot semantics on
//! [`factura_core::InvoiceItem`]).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::events::{ChangeFeed, ChangeOp, EntityKind};
use factura_core::validation::validate_product;
use factura_core::{generate_id, Product, ProductInput};

const SELECT_COLUMNS: &str = "id, factory_id, name, sku, description, price_cents, in_stock, \
                              created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    events: ChangeFeed,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, events: ChangeFeed) -> Self {
        ProductRepository { pool, events }
    }

    /// Creates a product from validated form input.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - The owning factory doesn't exist
    pub async fn create(&self, input: ProductInput) -> DbResult<Product> {
        validate_product(&input)?;
        self.ensure_factory_exists(&input.factory_id).await?;

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            factory_id: input.factory_id,
            name: input.name,
            sku: input.sku,
            description: input.description,
            price_cents: input.price_cents,
            in_stock: input.in_stock,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products \
             (id, factory_id, name, sku, description, price_cents, in_stock, \
              created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&product.id)
        .bind(&product.factory_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.in_stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        self.events
            .publish(EntityKind::Product, &product.id, ChangeOp::Created);

        Ok(product)
    }

    /// Replaces all editable fields of an existing product.
    ///
    /// Saved invoice lines are NOT touched: they carry the price frozen at
    /// add-time.
    pub async fn update(&self, id: &str, input: ProductInput) -> DbResult<Product> {
        validate_product(&input)?;

        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if existing.factory_id != input.factory_id {
            self.ensure_factory_exists(&input.factory_id).await?;
        }

        let now = Utc::now();

        debug!(id = %id, "Updating product");

        sqlx::query(
            "UPDATE products SET \
             factory_id = ?2, name = ?3, sku = ?4, description = ?5, \
             price_cents = ?6, in_stock = ?7, updated_at = ?8 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&input.factory_id)
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(input.in_stock)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.events
            .publish(EntityKind::Product, id, ChangeOp::Updated);

        Ok(Product {
            id: existing.id,
            factory_id: input.factory_id,
            name: input.name,
            sku: input.sku,
            description: input.description,
            price_cents: input.price_cents,
            in_stock: input.in_stock,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists the products belonging to one factory.
    pub async fn list_by_factory(&self, factory_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE factory_id = ?1 ORDER BY name"
        ))
        .bind(factory_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Deletes a product.
    ///
    /// ## Referential Rule
    /// A product that appears on invoice lines cannot be deleted: the lines
    /// reference it for display, even though their price is frozen.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let item_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoice_items WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if item_count > 0 {
            return Err(DbError::dependents_exist("Product", "invoice items", item_count));
        }

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.events
            .publish(EntityKind::Product, id, ChangeOp::Deleted);

        Ok(())
    }

    async fn ensure_factory_exists(&self, factory_id: &str) -> DbResult<()> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM factories WHERE id = ?1")
            .bind(factory_id)
            .fetch_one(&self.pool)
            .await?;

        if exists == 0 {
            return Err(DbError::not_found("Factory", factory_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{factory_input, product_input, test_db};
    use factura_core::ValidationError;

    #[tokio::test]
    async fn test_create_and_list_by_factory() {
        let db = test_db().await;
        let factory = db
            .factories()
            .create(factory_input("Adhunik Textiles", Some("ADH")))
            .await
            .unwrap();

        let product = db
            .products()
            .create(product_input(&factory.id, "Cotton Fabric Roll", 999))
            .await
            .unwrap();
        assert_eq!(product.price().cents(), 999);

        let listed = db.products().list_by_factory(&factory.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Cotton Fabric Roll");
    }

    #[tokio::test]
    async fn test_create_requires_existing_factory() {
        let db = test_db().await;

        let err = db
            .products()
            .create(product_input("missing-factory", "Cotton Fabric Roll", 999))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let db = test_db().await;
        let factory = db
            .factories()
            .create(factory_input("Adhunik Textiles", Some("ADH")))
            .await
            .unwrap();

        let err = db
            .products()
            .create(product_input(&factory.id, "Cotton Fabric Roll", -1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Negative { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_price_is_allowed() {
        let db = test_db().await;
        let factory = db
            .factories()
            .create(factory_input("Adhunik Textiles", Some("ADH")))
            .await
            .unwrap();

        let product = db
            .products()
            .create(product_input(&factory.id, "Sample Swatch", 0))
            .await
            .unwrap();
        assert!(product.price().is_zero());
    }

    #[tokio::test]
    async fn test_update_price() {
        let db = test_db().await;
        let factory = db
            .factories()
            .create(factory_input("Adhunik Textiles", Some("ADH")))
            .await
            .unwrap();
        let created = db
            .products()
            .create(product_input(&factory.id, "Cotton Fabric Roll", 999))
            .await
            .unwrap();

        let updated = db
            .products()
            .update(&created.id, product_input(&factory.id, "Cotton Fabric Roll", 1299))
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 1299);

        let loaded = db.products().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.price_cents, 1299);
        assert_eq!(loaded.created_at, created.created_at);
    }
}
