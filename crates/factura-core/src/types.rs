//! # Domain Types
//!
//! Core domain types used throughout Factura.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Entity Graph                                    │
//! │                                                                         │
//! │   ┌──────────┐                      ┌──────────┐                       │
//! │   │ Customer │◄────────┐            │ Factory  │                       │
//! │   └──────────┘         │            └────┬─────┘                       │
//! │                        │                 │    ▲                        │
//! │                        │          has many    │                        │
//! │                        │                 │    │                        │
//! │                        │                 ▼    │                        │
//! │                   customer_id       ┌─────────┴┐                       │
//! │                        │            │ Product  │     factory_id        │
//! │                        │            └────┬─────┘                       │
//! │                   ┌────┴─────┐           │                             │
//! │                   │ Invoice  │      product_id (price snapshot)        │
//! │                   └────┬─────┘           │                             │
//! │                        │                 ▼                             │
//! │                   owns many ──────► ┌─────────────┐                    │
//! │                                     │ InvoiceItem │                    │
//! │                                     └─────────────┘                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has an `id` (UUID v4, immutable, used for relations);
//! invoices additionally carry a human-readable business key
//! (`invoice_number`, see [`crate::numbering`]).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;
use crate::{DEFAULT_DUE_DAYS, DEFAULT_FACTORY_CODE};

/// Generates a fresh entity id (UUID v4 string).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Invoice Status
// =============================================================================

/// The lifecycle status of an invoice.
///
/// Stored lowercase in the database; `Overdue` can also be derived for
/// display from `due_date` via [`Invoice::is_overdue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Invoice is being composed, not yet issued.
    Draft,
    /// Invoice has been issued and awaits payment.
    Pending,
    /// Invoice has been paid in full.
    Paid,
    /// Invoice passed its due date without payment.
    Overdue,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

/// Lowercase form, matching the stored representation.
impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A billed party.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on invoices.
    pub name: String,

    /// Goods and Services Tax Identification Number.
    pub gstin: String,

    /// Contact phone number.
    pub phone: String,

    /// Contact email, if known.
    pub email: Option<String>,

    /// Billing address.
    pub address: Option<String>,

    /// Company name, when billing a business contact.
    pub company: Option<String>,

    /// Free-form notes.
    pub notes: Option<String>,

    /// When the customer was created.
    pub created_at: DateTime<Utc>,

    /// When the customer was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Editable customer fields, used for both create and full-record update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub gstin: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Factory
// =============================================================================

/// A supplier/manufacturer that owns products and issues invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Factory {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on invoices.
    pub name: String,

    /// Goods and Services Tax Identification Number.
    pub gstin: String,

    /// Contact phone number.
    pub phone: String,

    /// Contact email, if known.
    pub email: Option<String>,

    /// Factory address.
    pub address: Option<String>,

    /// Short code embedded in invoice numbers (e.g., "ADH").
    pub code: Option<String>,

    /// When the factory was created.
    pub created_at: DateTime<Utc>,

    /// When the factory was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Factory {
    /// Returns the code used when building invoice numbers.
    ///
    /// Falls back to [`DEFAULT_FACTORY_CODE`] when no code is set
    /// or the stored code is blank.
    pub fn number_code(&self) -> &str {
        match self.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code,
            _ => DEFAULT_FACTORY_CODE,
        }
    }
}

/// Editable factory fields, used for both create and full-record update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactoryInput {
    pub name: String,
    pub gstin: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub code: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A product offered by a factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Factory this product belongs to.
    pub factory_id: String,

    /// Display name shown on invoice lines.
    pub name: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: Option<String>,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Whether the product is currently available.
    pub in_stock: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Editable product fields, used for both create and full-record update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductInput {
    pub factory_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price_cents: i64,
    pub in_stock: bool,
}

// =============================================================================
// Invoice
// =============================================================================

/// An issued (or draft) invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable business key, unique across all invoices.
    pub invoice_number: String,

    /// Customer being billed.
    pub customer_id: String,

    /// Factory issuing the invoice.
    pub factory_id: String,

    /// Invoice date.
    pub date: NaiveDate,

    /// Payment due date; defaults to `date` + 30 days when not given.
    pub due_date: Option<NaiveDate>,

    /// Lifecycle status.
    pub status: InvoiceStatus,

    /// Sum of item totals in cents (derived, persisted on save).
    pub total_cents: i64,

    /// Flat tax amount in cents, if any.
    pub tax_cents: Option<i64>,

    /// Flat discount amount in cents, if any.
    pub discount_cents: Option<i64>,

    /// Free-form notes printed on the document.
    pub notes: Option<String>,

    /// When the invoice was created.
    pub created_at: DateTime<Utc>,

    /// When the invoice was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns the persisted item total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the flat tax amount, treating absent as zero.
    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents.unwrap_or(0))
    }

    /// Returns the flat discount amount, treating absent as zero.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents.unwrap_or(0))
    }

    /// Grand total for display: `total + tax - discount`.
    ///
    /// Not persisted separately; always recomputed from the stored parts.
    pub fn grand_total(&self) -> Money {
        self.total() + self.tax() - self.discount()
    }

    /// Returns the effective due date (`date` + 30 days when unset).
    pub fn due_date_or_default(&self) -> NaiveDate {
        self.due_date
            .unwrap_or_else(|| self.date + Duration::days(DEFAULT_DUE_DAYS))
    }

    /// Whether the invoice is past due and still unpaid as of `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != InvoiceStatus::Paid && self.due_date_or_default() < today
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line item on an invoice.
/// Uses snapshot pattern: the unit price is frozen at add-time and is not
/// re-synced if the product price later changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Invoice this line belongs to.
    pub invoice_id: String,

    /// Product being billed.
    pub product_id: String,

    /// Quantity billed (always > 0).
    pub quantity: i64,

    /// Unit price in cents at add-time (frozen).
    pub unit_price_cents: i64,

    /// Line total in cents (`quantity × unit_price_cents`).
    pub total_price_cents: i64,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl InvoiceItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
