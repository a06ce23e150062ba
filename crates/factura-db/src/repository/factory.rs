//! # Factory Repository
//!
//! Database operations for factories (suppliers).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::events::{ChangeFeed, ChangeOp, EntityKind};
use factura_core::validation::validate_factory;
use factura_core::{generate_id, Factory, FactoryInput};

const SELECT_COLUMNS: &str = "id, name, gstin, phone, email, address, code, \
                              created_at, updated_at";

/// Repository for factory database operations.
#[derive(Debug, Clone)]
pub struct FactoryRepository {
    pool: SqlitePool,
    events: ChangeFeed,
}

impl FactoryRepository {
    /// Creates a new FactoryRepository.
    pub fn new(pool: SqlitePool, events: ChangeFeed) -> Self {
        FactoryRepository { pool, events }
    }

    /// Creates a factory from validated form input.
    pub async fn create(&self, input: FactoryInput) -> DbResult<Factory> {
        validate_factory(&input)?;

        let now = Utc::now();
        let factory = Factory {
            id: generate_id(),
            name: input.name,
            gstin: input.gstin,
            phone: input.phone,
            email: input.email,
            address: input.address,
            code: input.code,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %factory.id, name = %factory.name, "Inserting factory");

        sqlx::query(
            "INSERT INTO factories \
             (id, name, gstin, phone, email, address, code, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&factory.id)
        .bind(&factory.name)
        .bind(&factory.gstin)
        .bind(&factory.phone)
        .bind(&factory.email)
        .bind(&factory.address)
        .bind(&factory.code)
        .bind(factory.created_at)
        .bind(factory.updated_at)
        .execute(&self.pool)
        .await?;

        self.events
            .publish(EntityKind::Factory, &factory.id, ChangeOp::Created);

        Ok(factory)
    }

    /// Replaces all editable fields of an existing factory.
    pub async fn update(&self, id: &str, input: FactoryInput) -> DbResult<Factory> {
        validate_factory(&input)?;

        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Factory", id))?;

        let now = Utc::now();

        debug!(id = %id, "Updating factory");

        sqlx::query(
            "UPDATE factories SET \
             name = ?2, gstin = ?3, phone = ?4, email = ?5, \
             address = ?6, code = ?7, updated_at = ?8 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.gstin)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.code)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.events
            .publish(EntityKind::Factory, id, ChangeOp::Updated);

        Ok(Factory {
            id: existing.id,
            name: input.name,
            gstin: input.gstin,
            phone: input.phone,
            email: input.email,
            address: input.address,
            code: input.code,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Gets a factory by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Factory>> {
        let factory = sqlx::query_as::<_, Factory>(&format!(
            "SELECT {SELECT_COLUMNS} FROM factories WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(factory)
    }

    /// Lists all factories sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Factory>> {
        let factories = sqlx::query_as::<_, Factory>(&format!(
            "SELECT {SELECT_COLUMNS} FROM factories ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(factories)
    }

    /// Deletes a factory.
    ///
    /// ## Referential Rule
    /// A factory that still has invoices or products cannot be deleted.
    /// Invoices are checked first; the error names whichever dependency
    /// blocked the delete.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting factory");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let invoice_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE factory_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if invoice_count > 0 {
            return Err(DbError::dependents_exist("Factory", "invoices", invoice_count));
        }

        let product_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE factory_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if product_count > 0 {
            return Err(DbError::dependents_exist("Factory", "products", product_count));
        }

        let result = sqlx::query("DELETE FROM factories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Factory", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.events
            .publish(EntityKind::Factory, id, ChangeOp::Deleted);

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

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let db = test_db().await;

        let created = db
            .factories()
            .create(factory_input("Adhunik Textiles", Some("ADH")))
            .await
            .unwrap();
        let loaded = db.factories().get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(loaded.name, "Adhunik Textiles");
        assert_eq!(loaded.code.as_deref(), Some("ADH"));
        assert_eq!(loaded.number_code(), "ADH");
    }

    #[tokio::test]
    async fn test_create_requires_gstin() {
        let db = test_db().await;

        let mut input = factory_input("Adhunik Textiles", None);
        input.gstin = String::new();

        let err = db.factories().create(input).await.unwrap_err();
        assert_eq!(err.to_string(), "gstin is required");
    }

    #[tokio::test]
    async fn test_update_replaces_editable_fields() {
        let db = test_db().await;
        let created = db
            .factories()
            .create(factory_input("Adhunik Textiles", Some("ADH")))
            .await
            .unwrap();

        let input = factory_input("Adhunik Mills", Some("ADM"));
        let updated = db.factories().update(&created.id, input).await.unwrap();
        assert_eq!(updated.name, "Adhunik Mills");
        assert_eq!(updated.code.as_deref(), Some("ADM"));

        let loaded = db.factories().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.number_code(), "ADM");
    }

    #[tokio::test]
    async fn test_delete_with_products_is_blocked() {
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

        let err = db.factories().delete(&factory.id).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Factory still has 1 products; delete those first"
        );

        // Removing the product unblocks the factory delete.
        db.products().delete(&product.id).await.unwrap();
        db.factories().delete(&factory.id).await.unwrap();
        assert!(db.factories().get_by_id(&factory.id).await.unwrap().is_none());
    }
}
