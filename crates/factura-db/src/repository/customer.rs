//! # Customer Repository
//!
//! Database operations for customers.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::events::{ChangeFeed, ChangeOp, EntityKind};
use factura_core::validation::validate_customer;
use factura_core::{generate_id, Customer, CustomerInput};

const SELECT_COLUMNS: &str = "id, name, gstin, phone, email, address, company, notes, \
                              created_at, updated_at";

/// Repository for customer database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.customers();
/// let customer = repo.create(input).await?;
/// let all = repo.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    events: ChangeFeed,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool, events: ChangeFeed) -> Self {
        CustomerRepository { pool, events }
    }

    /// Creates a customer from validated form input.
    ///
    /// ## Returns
    /// * `Ok(Customer)` - Inserted customer with generated id and timestamps
    /// * `Err(DbError::Validation)` - A field failed the form rules
    pub async fn create(&self, input: CustomerInput) -> DbResult<Customer> {
        validate_customer(&input)?;

        let now = Utc::now();
        let customer = Customer {
            id: generate_id(),
            name: input.name,
            gstin: input.gstin,
            phone: input.phone,
            email: input.email,
            address: input.address,
            company: input.company,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers \
             (id, name, gstin, phone, email, address, company, notes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.gstin)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.company)
        .bind(&customer.notes)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        self.events
            .publish(EntityKind::Customer, &customer.id, ChangeOp::Created);

        Ok(customer)
    }

    /// Replaces all editable fields of an existing customer.
    pub async fn update(&self, id: &str, input: CustomerInput) -> DbResult<Customer> {
        validate_customer(&input)?;

        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        let now = Utc::now();

        debug!(id = %id, "Updating customer");

        sqlx::query(
            "UPDATE customers SET \
             name = ?2, gstin = ?3, phone = ?4, email = ?5, \
             address = ?6, company = ?7, notes = ?8, updated_at = ?9 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.gstin)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.company)
        .bind(&input.notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.events
            .publish(EntityKind::Customer, id, ChangeOp::Updated);

        Ok(Customer {
            id: existing.id,
            name: input.name,
            gstin: input.gstin,
            phone: input.phone,
            email: input.email,
            address: input.address,
            company: input.company,
            notes: input.notes,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Gets a customer by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists all customers sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Deletes a customer.
    ///
    /// ## Referential Rule
    /// A customer that still has invoices cannot be deleted; the error names
    /// the dependency so the caller can show a blocking message.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let invoice_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE customer_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if invoice_count > 0 {
            return Err(DbError::dependents_exist("Customer", "invoices", invoice_count));
        }

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.events
            .publish(EntityKind::Customer, id, ChangeOp::Deleted);

        Ok(())
    }

    /// Counts customers (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{customer_input, factory_input, product_input, test_db};
    use chrono::NaiveDate;
    use factura_core::{InvoiceDraft, ValidationError};

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let db = test_db().await;

        let created = db
            .customers()
            .create(customer_input("Sharma Traders"))
            .await
            .unwrap();
        let loaded = db.customers().get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(loaded.name, "Sharma Traders");
        assert_eq!(loaded.gstin, created.gstin);
        assert_eq!(loaded.email.as_deref(), Some("accounts@example.in"));
        assert_eq!(loaded.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_email() {
        let db = test_db().await;

        let mut input = customer_input("Sharma Traders");
        input.email = Some("not-an-email".to_string());

        let err = db.customers().create(input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::InvalidFormat { .. })
        ));
        assert_eq!(db.customers().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_required_fields() {
        let db = test_db().await;

        let mut input = customer_input("Sharma Traders");
        input.phone = "  ".to_string();

        let err = db.customers().create(input).await.unwrap_err();
        assert_eq!(err.to_string(), "phone is required");
    }

    #[tokio::test]
    async fn test_update_replaces_editable_fields() {
        let db = test_db().await;
        let created = db
            .customers()
            .create(customer_input("Sharma Traders"))
            .await
            .unwrap();

        let mut input = customer_input("Sharma Trading Co");
        input.company = Some("Sharma Group".to_string());

        let updated = db.customers().update(&created.id, input).await.unwrap();
        assert_eq!(updated.name, "Sharma Trading Co");
        assert_eq!(updated.created_at, created.created_at);

        let loaded = db.customers().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Sharma Trading Co");
        assert_eq!(loaded.company.as_deref(), Some("Sharma Group"));
    }

    #[tokio::test]
    async fn test_update_unknown_customer_is_not_found() {
        let db = test_db().await;
        let err = db
            .customers()
            .update("missing", customer_input("Nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_sorts_by_name() {
        let db = test_db().await;
        db.customers()
            .create(customer_input("Verma & Sons"))
            .await
            .unwrap();
        db.customers()
            .create(customer_input("Gupta Distributors"))
            .await
            .unwrap();

        let names: Vec<String> = db
            .customers()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Gupta Distributors", "Verma & Sons"]);
    }

    #[tokio::test]
    async fn test_delete_without_invoices() {
        let db = test_db().await;
        let created = db
            .customers()
            .create(customer_input("Sharma Traders"))
            .await
            .unwrap();

        db.customers().delete(&created.id).await.unwrap();
        assert!(db.customers().get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_with_invoices_is_blocked() {
        let db = test_db().await;
        let customer = db
            .customers()
            .create(customer_input("Sharma Traders"))
            .await
            .unwrap();
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

        let mut draft = InvoiceDraft::new(
            customer.id.clone(),
            factory.id.clone(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        );
        draft.add_item(&product, 1).unwrap();
        let invoice = db.invoices().create(&draft).await.unwrap();

        let err = db.customers().delete(&customer.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::DependentsExist { count: 1, .. }
        ));
        assert_eq!(
            err.to_string(),
            "Customer still has 1 invoices; delete those first"
        );

        // Customer and invoice are untouched.
        assert!(db.customers().get_by_id(&customer.id).await.unwrap().is_some());
        assert!(db.invoices().get_by_id(&invoice.id).await.unwrap().is_some());
    }
}
