//! # Invoice Repository
//!
//! Database operations for invoices and their line items.
//!
//! ## Invoice Save Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Invoice Save                                       │
//! │                                                                         │
//! │  1. VALIDATE                                                           │
//! │     └── draft.validate() → first failure blocks the save               │
//! │                                                                         │
//! │  2. NUMBER (create only)                                               │
//! │     └── next_invoice_number() → INV-<code><yyyy><mm><dd><seq>          │
//! │         └── on UNIQUE collision: regenerate, then timestamp fallback   │
//! │                                                                         │
//! │  3. PERSIST (one transaction)                                          │
//! │     ├── invoice row (totals computed from the draft)                   │
//! │     └── item diff: missing → DELETE, no id → INSERT, else UPDATE       │
//! │                                                                         │
//! │  4. NOTIFY                                                             │
//! │     └── change event published after commit                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::events::{ChangeFeed, ChangeOp, EntityKind};
use factura_core::{generate_id, numbering, Factory, Invoice, InvoiceDraft, InvoiceItem, Product};

const INVOICE_COLUMNS: &str = "id, invoice_number, customer_id, factory_id, date, due_date, \
                               status, total_cents, tax_cents, discount_cents, notes, \
                               created_at, updated_at";

const ITEM_COLUMNS: &str = "id, invoice_id, product_id, quantity, unit_price_cents, \
                            total_price_cents, created_at, updated_at";

/// How many sequenced numbers to try before resorting to the timestamp
/// fallback. Collisions only happen when two saves race within one
/// factory-month, so one retry usually settles it.
const NUMBER_RETRIES: usize = 3;

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
    events: ChangeFeed,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool, events: ChangeFeed) -> Self {
        InvoiceRepository { pool, events }
    }

    // =========================================================================
    // Numbering
    // =========================================================================

    /// Produces the next invoice number for a factory and date.
    ///
    /// ## Degraded Path
    /// Any failure (query error, malformed prior number) silently yields the
    /// timestamp fallback `INV-<epoch-millis>`. The caller is never blocked
    /// by numbering; the only trace is a warning in the log.
    pub async fn next_invoice_number(&self, factory: &Factory, date: NaiveDate) -> String {
        match self.sequenced_number(factory, date).await {
            Ok(number) => number,
            Err(err) => {
                warn!(error = %err, factory = %factory.id, "invoice numbering degraded to timestamp fallback");
                numbering::fallback_number(Utc::now())
            }
        }
    }

    /// The sequenced rule: find the latest number for this factory-month,
    /// advance its 3-digit suffix, or start at 001.
    async fn sequenced_number(&self, factory: &Factory, date: NaiveDate) -> DbResult<String> {
        let code = factory.number_code();
        let prefix = numbering::month_prefix(code, date);
        let pattern = format!("{prefix}%");

        // rowid breaks created_at ties (rapid saves within one timestamp
        // granule): the most recently inserted row wins.
        let latest: Option<String> = sqlx::query_scalar(
            "SELECT invoice_number FROM invoices \
             WHERE invoice_number LIKE ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .bind(&pattern)
        .fetch_optional(&self.pool)
        .await?;

        let sequence = match latest {
            Some(number) => numbering::next_sequence(&number).ok_or_else(|| {
                DbError::Internal(format!("malformed invoice number '{number}'"))
            })?,
            None => numbering::SEQUENCE_START,
        };

        Ok(numbering::format_number(code, date, sequence))
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates an invoice (and its items) from a validated draft.
    ///
    /// ## Uniqueness
    /// The UNIQUE index on `invoice_number` is the arbiter: if the generated
    /// number collides (two saves racing within one factory-month), the
    /// number is regenerated and the insert retried, ending in a timestamp
    /// fallback. The sequence can skip values but never repeats.
    pub async fn create(&self, draft: &InvoiceDraft) -> DbResult<Invoice> {
        draft.validate()?;

        let factory = self
            .fetch_factory(&draft.factory_id)
            .await?
            .ok_or_else(|| DbError::not_found("Factory", &draft.factory_id))?;
        self.ensure_customer_exists(&draft.customer_id).await?;

        let mut attempt = 0;
        loop {
            let number = if attempt < NUMBER_RETRIES {
                self.next_invoice_number(&factory, draft.date).await
            } else {
                numbering::fallback_number(Utc::now())
            };

            match self.insert_with_number(draft, &number).await {
                Ok(invoice) => {
                    debug!(id = %invoice.id, number = %invoice.invoice_number, "Invoice created");
                    self.events
                        .publish(EntityKind::Invoice, &invoice.id, ChangeOp::Created);
                    return Ok(invoice);
                }
                Err(DbError::UniqueViolation { .. }) if attempt <= NUMBER_RETRIES => {
                    warn!(number = %number, "invoice number already taken, regenerating");
                    attempt += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Inserts the invoice row plus all items in one transaction.
    async fn insert_with_number(&self, draft: &InvoiceDraft, number: &str) -> DbResult<Invoice> {
        let now = Utc::now();
        let invoice = Invoice {
            id: generate_id(),
            invoice_number: number.to_string(),
            customer_id: draft.customer_id.clone(),
            factory_id: draft.factory_id.clone(),
            date: draft.date,
            due_date: draft.due_date,
            status: draft.status,
            total_cents: draft.total_cents(),
            tax_cents: draft.tax_cents,
            discount_cents: draft.discount_cents,
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            "INSERT INTO invoices \
             (id, invoice_number, customer_id, factory_id, date, due_date, status, \
              total_cents, tax_cents, discount_cents, notes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer_id)
        .bind(&invoice.factory_id)
        .bind(invoice.date)
        .bind(invoice.due_date)
        .bind(invoice.status)
        .bind(invoice.total_cents)
        .bind(invoice.tax_cents)
        .bind(invoice.discount_cents)
        .bind(&invoice.notes)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &draft.items {
            sqlx::query(
                "INSERT INTO invoice_items \
                 (id, invoice_id, product_id, quantity, unit_price_cents, \
                  total_price_cents, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(generate_id())
            .bind(&invoice.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.total_price_cents())
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(invoice)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Replaces an invoice's editable fields and diffs its item list,
    /// all in one transaction.
    ///
    /// ## Item Diff
    /// Compared against what is persisted: items missing from the draft are
    /// deleted, draft items without an id are inserted, the rest are updated
    /// in place. The invoice number never changes on update.
    pub async fn update(&self, id: &str, draft: &InvoiceDraft) -> DbResult<Invoice> {
        draft.validate()?;

        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;

        let now = Utc::now();

        debug!(id = %id, number = %existing.invoice_number, "Updating invoice");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            "UPDATE invoices SET \
             customer_id = ?2, factory_id = ?3, date = ?4, due_date = ?5, status = ?6, \
             total_cents = ?7, tax_cents = ?8, discount_cents = ?9, notes = ?10, \
             updated_at = ?11 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&draft.customer_id)
        .bind(&draft.factory_id)
        .bind(draft.date)
        .bind(draft.due_date)
        .bind(draft.status)
        .bind(draft.total_cents())
        .bind(draft.tax_cents)
        .bind(draft.discount_cents)
        .bind(&draft.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Diff against the persisted item set.
        let persisted_ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM invoice_items WHERE invoice_id = ?1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let kept: HashSet<&str> = draft.items.iter().filter_map(|i| i.id.as_deref()).collect();

        for item_id in &persisted_ids {
            if !kept.contains(item_id.as_str()) {
                sqlx::query("DELETE FROM invoice_items WHERE id = ?1")
                    .bind(item_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        for item in &draft.items {
            match &item.id {
                Some(item_id) => {
                    let result = sqlx::query(
                        "UPDATE invoice_items SET \
                         product_id = ?3, quantity = ?4, unit_price_cents = ?5, \
                         total_price_cents = ?6, updated_at = ?7 \
                         WHERE id = ?1 AND invoice_id = ?2",
                    )
                    .bind(item_id)
                    .bind(id)
                    .bind(&item.product_id)
                    .bind(item.quantity)
                    .bind(item.unit_price_cents)
                    .bind(item.total_price_cents())
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Err(DbError::not_found("Invoice item", item_id));
                    }
                }
                None => {
                    sqlx::query(
                        "INSERT INTO invoice_items \
                         (id, invoice_id, product_id, quantity, unit_price_cents, \
                          total_price_cents, created_at, updated_at) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    )
                    .bind(generate_id())
                    .bind(id)
                    .bind(&item.product_id)
                    .bind(item.quantity)
                    .bind(item.unit_price_cents)
                    .bind(item.total_price_cents())
                    .bind(now)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.events.publish(EntityKind::Invoice, id, ChangeOp::Updated);

        Ok(Invoice {
            id: existing.id,
            invoice_number: existing.invoice_number,
            customer_id: draft.customer_id.clone(),
            factory_id: draft.factory_id.clone(),
            date: draft.date,
            due_date: draft.due_date,
            status: draft.status,
            total_cents: draft.total_cents(),
            tax_cents: draft.tax_cents,
            discount_cents: draft.discount_cents,
            notes: draft.notes.clone(),
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Gets an invoice by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Gets an invoice by its business number.
    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_number = ?1"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Lists all invoices, newest first.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Lists a customer's invoices, newest first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE customer_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Gets all items for an invoice.
    pub async fn get_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items \
             WHERE invoice_id = ?1 ORDER BY created_at, id"
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets an invoice together with its items.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<(Invoice, Vec<InvoiceItem>)>> {
        let Some(invoice) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(id).await?;
        Ok(Some((invoice, items)))
    }

    /// Gets an invoice's items paired with their products, for document
    /// rendering (the document shows product names, not ids).
    pub async fn get_document_lines(&self, invoice_id: &str) -> DbResult<Vec<(InvoiceItem, Product)>> {
        let items = self.get_items(invoice_id).await?;

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = sqlx::query_as::<_, Product>(
                "SELECT id, factory_id, name, sku, description, price_cents, in_stock, \
                 created_at, updated_at \
                 FROM products WHERE id = ?1",
            )
            .bind(&item.product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;

            lines.push((item, product));
        }

        Ok(lines)
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Deletes an invoice and its items in one transaction.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting invoice");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.events.publish(EntityKind::Invoice, id, ChangeOp::Deleted);

        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn fetch_factory(&self, factory_id: &str) -> DbResult<Option<Factory>> {
        let factory = sqlx::query_as::<_, Factory>(
            "SELECT id, name, gstin, phone, email, address, code, created_at, updated_at \
             FROM factories WHERE id = ?1",
        )
        .bind(factory_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(factory)
    }

    async fn ensure_customer_exists(&self, customer_id: &str) -> DbResult<()> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE id = ?1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;

        if exists == 0 {
            return Err(DbError::not_found("Customer", customer_id));
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
    use crate::pool::Database;
    use crate::repository::testutil::{customer_input, factory_input, product_input, test_db};
    use factura_core::ValidationError;

    struct Fixture {
        db: Database,
        customer_id: String,
        factory: Factory,
        products: Vec<Product>,
    }

    /// One customer, one "ADH" factory, two products ($9.99 and $5.00).
    async fn fixture() -> Fixture {
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
        let products = vec![
            db.products()
                .create(product_input(&factory.id, "Cotton Fabric Roll", 999))
                .await
                .unwrap(),
            db.products()
                .create(product_input(&factory.id, "Silk Blend Sheet", 500))
                .await
                .unwrap(),
        ];

        Fixture {
            db,
            customer_id: customer.id,
            factory,
            products,
        }
    }

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn draft_with_items(fx: &Fixture, date: NaiveDate) -> InvoiceDraft {
        let mut draft = InvoiceDraft::new(fx.customer_id.clone(), fx.factory.id.clone(), date);
        draft.add_item(&fx.products[0], 2).unwrap();
        draft.add_item(&fx.products[1], 1).unwrap();
        draft
    }

    #[tokio::test]
    async fn test_first_invoice_of_month_gets_sequence_001() {
        let fx = fixture().await;
        let draft = draft_with_items(&fx, march(15));

        let invoice = fx.db.invoices().create(&draft).await.unwrap();
        assert_eq!(invoice.invoice_number, "INV-ADH20240315001");

        let second = fx.db.invoices().create(&draft).await.unwrap();
        assert_eq!(second.invoice_number, "INV-ADH20240315002");
    }

    #[tokio::test]
    async fn test_sequence_strictly_increases_within_a_month() {
        let fx = fixture().await;
        let draft = draft_with_items(&fx, march(15));

        for expected in 1..=4u32 {
            let invoice = fx.db.invoices().create(&draft).await.unwrap();
            assert_eq!(
                invoice.invoice_number,
                format!("INV-ADH20240315{expected:03}")
            );
        }
    }

    #[tokio::test]
    async fn test_sequence_continues_across_days_of_one_month() {
        let fx = fixture().await;

        let first = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, march(15)))
            .await
            .unwrap();
        assert_eq!(first.invoice_number, "INV-ADH20240315001");

        // Different day, same month: the counter keeps going.
        let second = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, march(20)))
            .await
            .unwrap();
        assert_eq!(second.invoice_number, "INV-ADH20240320002");
    }

    #[tokio::test]
    async fn test_new_month_restarts_sequence() {
        let fx = fixture().await;

        fx.db
            .invoices()
            .create(&draft_with_items(&fx, march(15)))
            .await
            .unwrap();

        let april = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let invoice = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, april))
            .await
            .unwrap();
        assert_eq!(invoice.invoice_number, "INV-ADH20240402001");
    }

    #[tokio::test]
    async fn test_factory_without_code_uses_default() {
        let fx = fixture().await;
        let plain = fx
            .db
            .factories()
            .create(factory_input("Prakash Metal Works", None))
            .await
            .unwrap();
        let product = fx
            .db
            .products()
            .create(product_input(&plain.id, "Steel Hinge Set", 500))
            .await
            .unwrap();

        let mut draft = InvoiceDraft::new(fx.customer_id.clone(), plain.id.clone(), march(15));
        draft.add_item(&product, 1).unwrap();

        let invoice = fx.db.invoices().create(&draft).await.unwrap();
        assert_eq!(invoice.invoice_number, "INV-ADH20240315001");
    }

    #[tokio::test]
    async fn test_malformed_prior_number_falls_back_to_timestamp() {
        let fx = fixture().await;

        // Plant a number that matches the month prefix but has a
        // non-numeric suffix.
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO invoices \
             (id, invoice_number, customer_id, factory_id, date, due_date, status, \
              total_cents, tax_cents, discount_cents, notes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, 'pending', 0, NULL, NULL, NULL, ?6, ?6)",
        )
        .bind(generate_id())
        .bind("INV-ADH20240315ABC")
        .bind(&fx.customer_id)
        .bind(&fx.factory.id)
        .bind(march(15))
        .bind(now)
        .execute(fx.db.pool())
        .await
        .unwrap();

        let invoice = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, march(15)))
            .await
            .unwrap();

        // Degraded but available: INV-<epoch-millis>, never an error.
        let suffix = invoice.invoice_number.strip_prefix("INV-").unwrap();
        assert!(suffix.parse::<i64>().is_ok(), "got {}", invoice.invoice_number);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_items_and_totals() {
        let fx = fixture().await;
        let mut draft = draft_with_items(&fx, march(15));
        draft.tax_cents = Some(200);
        draft.discount_cents = Some(100);
        draft.notes = Some("Net 30".to_string());

        let created = fx.db.invoices().create(&draft).await.unwrap();
        assert_eq!(created.total_cents, 2498);

        let (reloaded, items) = fx
            .db
            .invoices()
            .get_with_items(&created.id)
            .await
            .unwrap()
            .expect("invoice should exist");

        assert_eq!(reloaded.invoice_number, created.invoice_number);
        assert_eq!(reloaded.total_cents, 2498);
        assert_eq!(reloaded.grand_total().cents(), 2598);
        assert_eq!(reloaded.notes.as_deref(), Some("Net 30"));
        assert_eq!(reloaded.date, march(15));

        assert_eq!(items.len(), 2);
        let by_product: Vec<(&str, i64, i64)> = items
            .iter()
            .map(|i| (i.product_id.as_str(), i.quantity, i.unit_price_cents))
            .collect();
        assert!(by_product.contains(&(fx.products[0].id.as_str(), 2, 999)));
        assert!(by_product.contains(&(fx.products[1].id.as_str(), 1, 500)));
        assert!(items.iter().all(|i| i.total_price_cents == i.quantity * i.unit_price_cents));
    }

    #[tokio::test]
    async fn test_update_diffs_the_item_list() {
        let fx = fixture().await;
        let created = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, march(15)))
            .await
            .unwrap();
        let (invoice, items) = fx
            .db
            .invoices()
            .get_with_items(&created.id)
            .await
            .unwrap()
            .unwrap();

        let kept_id = items
            .iter()
            .find(|i| i.product_id == fx.products[0].id)
            .unwrap()
            .id
            .clone();

        // Edit flow: bump the kept line to qty 3, drop the other line,
        // add a brand new one.
        let mut draft = InvoiceDraft::from_invoice(&invoice, &items);
        let drop_index = draft
            .items
            .iter()
            .position(|i| i.product_id == fx.products[1].id)
            .unwrap();
        draft.remove_item(drop_index);
        draft.update_item(0, 3).unwrap();
        draft.add_item(&fx.products[1], 4).unwrap();

        let updated = fx.db.invoices().update(&created.id, &draft).await.unwrap();
        assert_eq!(updated.total_cents, 3 * 999 + 4 * 500);
        assert_eq!(updated.invoice_number, created.invoice_number);

        let (reloaded, new_items) = fx
            .db
            .invoices()
            .get_with_items(&created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.total_cents, 3 * 999 + 4 * 500);
        assert_eq!(new_items.len(), 2);

        // Updated in place: the kept line still has its persisted id.
        let kept = new_items.iter().find(|i| i.id == kept_id).unwrap();
        assert_eq!(kept.quantity, 3);
        assert_eq!(kept.total_price_cents, 3 * 999);

        // The dropped line is gone; the added line is new.
        let added = new_items.iter().find(|i| i.id != kept_id).unwrap();
        assert_eq!(added.product_id, fx.products[1].id);
        assert_eq!(added.quantity, 4);
    }

    #[tokio::test]
    async fn test_item_price_is_a_snapshot() {
        let fx = fixture().await;
        let created = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, march(15)))
            .await
            .unwrap();

        // Raise the product price after the invoice is saved.
        let mut input = product_input(&fx.factory.id, "Cotton Fabric Roll", 1299);
        input.sku = fx.products[0].sku.clone();
        fx.db
            .products()
            .update(&fx.products[0].id, input)
            .await
            .unwrap();

        // The saved line still carries the price frozen at add-time.
        let items = fx.db.invoices().get_items(&created.id).await.unwrap();
        let line = items
            .iter()
            .find(|i| i.product_id == fx.products[0].id)
            .unwrap();
        assert_eq!(line.unit_price_cents, 999);

        let reloaded = fx.db.invoices().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total_cents, 2498);
    }

    #[tokio::test]
    async fn test_create_without_items_is_blocked() {
        let fx = fixture().await;
        let draft = InvoiceDraft::new(fx.customer_id.clone(), fx.factory.id.clone(), march(15));

        let err = fx.db.invoices().create(&draft).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::NoItems)
        ));

        // Nothing was written.
        assert!(fx.db.invoices().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_invoice_and_items() {
        let fx = fixture().await;
        let created = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, march(15)))
            .await
            .unwrap();

        fx.db.invoices().delete(&created.id).await.unwrap();

        assert!(fx.db.invoices().get_by_id(&created.id).await.unwrap().is_none());
        assert!(fx.db.invoices().get_items(&created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_lines_pair_items_with_products() {
        let fx = fixture().await;
        let created = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, march(15)))
            .await
            .unwrap();

        let lines = fx.db.invoices().get_document_lines(&created.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines
            .iter()
            .any(|(item, product)| product.name == "Cotton Fabric Roll" && item.quantity == 2));
    }

    #[tokio::test]
    async fn test_change_feed_reports_committed_saves() {
        let fx = fixture().await;
        let mut feed = fx.db.subscribe();

        let created = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, march(15)))
            .await
            .unwrap();

        let event = feed.recv().await.unwrap();
        assert_eq!(event.entity, EntityKind::Invoice);
        assert_eq!(event.op, ChangeOp::Created);
        assert_eq!(event.id, created.id);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let fx = fixture().await;
        let first = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, march(15)))
            .await
            .unwrap();
        let second = fx
            .db
            .invoices()
            .create(&draft_with_items(&fx, march(16)))
            .await
            .unwrap();

        let listed = fx.db.invoices().list().await.unwrap();
        assert_eq!(listed.len(), 2);
        // Same-instant creation is possible in tests; both orders of an
        // exact tie are acceptable, but the second invoice must not sort
        // strictly after the first.
        let pos_first = listed.iter().position(|i| i.id == first.id).unwrap();
        let pos_second = listed.iter().position(|i| i.id == second.id).unwrap();
        assert!(pos_second <= pos_first || listed[0].created_at == listed[1].created_at);
    }
}
