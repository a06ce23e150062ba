//! # Invoice Draft
//!
//! The in-progress invoice being composed or edited, and the total
//! calculator that runs every time its item list changes.
//!
//! ## Composition Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Invoice Draft Operations                            │
//! │                                                                         │
//! │  User Action                Draft Change           Totals               │
//! │  ───────────                ────────────           ──────               │
//! │                                                                         │
//! │  Pick product ────────────► add_item(product, qty)  recomputed          │
//! │                                                                         │
//! │  Edit a line ─────────────► update_item(i, qty)     recomputed          │
//! │                                                                         │
//! │  Remove a line ───────────► remove_item(i)          recomputed          │
//! │                                                                         │
//! │  Save ────────────────────► validate() then hand the draft to the       │
//! │                             invoice repository (numbering + persist)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are pure functions of the item list: nothing here caches a sum,
//! so the draft can never disagree with its own lines.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Invoice, InvoiceItem, InvoiceStatus, Product};
use crate::validation::{validate_quantity, validate_unit_price_cents, ValidationResult};
use crate::DEFAULT_DUE_DAYS;

// =============================================================================
// Draft Item
// =============================================================================

/// A line on an in-progress invoice.
///
/// ## Price Freezing
/// `unit_price_cents` is captured from the product when the line is added.
/// If the product price changes in the database afterwards, this line keeps
/// the original price (snapshot semantics).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftItem {
    /// Persisted item id, present when editing a saved invoice.
    /// `None` marks a line that does not exist in the store yet.
    pub id: Option<String>,

    /// Product being billed.
    pub product_id: String,

    /// Quantity billed.
    pub quantity: i64,

    /// Unit price in cents at add-time (frozen).
    pub unit_price_cents: i64,
}

impl DraftItem {
    /// Creates a draft line from a product, freezing its current price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        DraftItem {
            id: None,
            product_id: product.id.clone(),
            quantity,
            unit_price_cents: product.price_cents,
        }
    }

    /// Line total in cents (`quantity × unit price`).
    #[inline]
    pub fn total_price_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Line total as Money.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents())
    }

    fn validate(&self) -> ValidationResult<()> {
        if self.product_id.trim().is_empty() {
            return Err(ValidationError::required("product"));
        }
        validate_quantity(self.quantity)?;
        validate_unit_price_cents(self.unit_price_cents)?;
        Ok(())
    }
}

// =============================================================================
// Invoice Draft
// =============================================================================

/// An invoice being composed (new) or edited (loaded from the store).
///
/// ## Invariants
/// - A draft saves only with at least one item.
/// - Item quantities are positive, unit prices non-negative.
/// - `due_date`, when set, is on or after `date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    /// Customer being billed.
    pub customer_id: String,

    /// Factory issuing the invoice.
    pub factory_id: String,

    /// Invoice date.
    pub date: NaiveDate,

    /// Payment due date; `None` means `date` + 30 days on save.
    pub due_date: Option<NaiveDate>,

    /// Lifecycle status.
    pub status: InvoiceStatus,

    /// Lines on the invoice.
    pub items: Vec<DraftItem>,

    /// Flat tax amount in cents, if any.
    pub tax_cents: Option<i64>,

    /// Flat discount amount in cents, if any.
    pub discount_cents: Option<i64>,

    /// Free-form notes printed on the document.
    pub notes: Option<String>,
}

impl InvoiceDraft {
    /// Creates an empty draft for the given parties and date.
    pub fn new(
        customer_id: impl Into<String>,
        factory_id: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        InvoiceDraft {
            customer_id: customer_id.into(),
            factory_id: factory_id.into(),
            date,
            due_date: None,
            status: InvoiceStatus::default(),
            items: Vec::new(),
            tax_cents: None,
            discount_cents: None,
            notes: None,
        }
    }

    /// Rebuilds the draft for a saved invoice, for the edit flow.
    ///
    /// Lines keep their persisted ids so the save can diff them against the
    /// store: a line removed from the draft is deleted, a line added without
    /// an id is inserted, the rest are updated in place.
    pub fn from_invoice(invoice: &Invoice, items: &[InvoiceItem]) -> Self {
        InvoiceDraft {
            customer_id: invoice.customer_id.clone(),
            factory_id: invoice.factory_id.clone(),
            date: invoice.date,
            due_date: invoice.due_date,
            status: invoice.status,
            items: items
                .iter()
                .map(|item| DraftItem {
                    id: Some(item.id.clone()),
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                })
                .collect(),
            tax_cents: invoice.tax_cents,
            discount_cents: invoice.discount_cents,
            notes: invoice.notes.clone(),
        }
    }

    /// Adds a line for a product, freezing its current price.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> ValidationResult<()> {
        let item = DraftItem::from_product(product, quantity);
        item.validate()?;
        self.items.push(item);
        Ok(())
    }

    /// Replaces the quantity of the line at `index`.
    pub fn update_item(&mut self, index: usize, quantity: i64) -> ValidationResult<()> {
        validate_quantity(quantity)?;
        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| ValidationError::required("item"))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Removes the line at `index`. Out-of-range indexes are ignored.
    pub fn remove_item(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    /// Sum of line totals in cents. This is what gets persisted as the
    /// invoice `total_cents` on save.
    pub fn total_cents(&self) -> i64 {
        self.items.iter().map(DraftItem::total_price_cents).sum()
    }

    /// Sum of line totals as Money.
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents())
    }

    /// Grand total for display: `total + tax - discount`, missing parts
    /// treated as zero. Never persisted separately.
    pub fn grand_total_cents(&self) -> i64 {
        self.total_cents() + self.tax_cents.unwrap_or(0) - self.discount_cents.unwrap_or(0)
    }

    /// Effective due date (`date` + 30 days when unset).
    pub fn due_date_or_default(&self) -> NaiveDate {
        self.due_date
            .unwrap_or_else(|| self.date + Duration::days(DEFAULT_DUE_DAYS))
    }

    /// Totals summary for display alongside the item list.
    pub fn totals(&self) -> DraftTotals {
        DraftTotals {
            item_count: self.items.len(),
            total_quantity: self.items.iter().map(|i| i.quantity).sum(),
            total_cents: self.total_cents(),
            tax_cents: self.tax_cents.unwrap_or(0),
            discount_cents: self.discount_cents.unwrap_or(0),
            grand_total_cents: self.grand_total_cents(),
        }
    }

    /// Gates a save: first failure wins, and its message is what the user
    /// sees.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.customer_id.trim().is_empty() {
            return Err(ValidationError::required("customer"));
        }
        if self.factory_id.trim().is_empty() {
            return Err(ValidationError::required("factory"));
        }
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }
        if let Some(due) = self.due_date {
            if due < self.date {
                return Err(ValidationError::DueDateBeforeDate);
            }
        }
        if let Some(tax) = self.tax_cents {
            if tax < 0 {
                return Err(ValidationError::Negative {
                    field: "tax".to_string(),
                });
            }
        }
        if let Some(discount) = self.discount_cents {
            if discount < 0 {
                return Err(ValidationError::Negative {
                    field: "discount".to_string(),
                });
            }
        }
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }
}

// =============================================================================
// Draft Totals
// =============================================================================

/// Totals summary computed from a draft's item list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub grand_total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
