//! # factura-core: Pure Business Logic for Factura
//!
//! This crate is the **heart** of Factura. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Factura Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ factura-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   draft   │  │ numbering │  │   │
//! │  │   │ Customer  │  │   Money   │  │  Invoice  │  │  monthly  │  │   │
//! │  │   │  Invoice  │  │  parsing  │  │   Draft   │  │  counter  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 factura-db (Database Layer)                     │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Customer, Factory, Product, Invoice, InvoiceItem)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`draft`] - In-progress invoice composition and total calculation
//! - [`numbering`] - Invoice number formatting and sequencing rules
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod draft;
pub mod error;
pub mod money;
pub mod numbering;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use factura_core::Money` instead of
// `use factura_core::money::Money`

pub use draft::{DraftItem, DraftTotals, InvoiceDraft};
pub use error::ValidationError;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Factory code used in invoice numbers when a factory has no `code` set.
pub const DEFAULT_FACTORY_CODE: &str = "ADH";

/// Days added to the invoice date when no due date is given.
pub const DEFAULT_DUE_DAYS: i64 = 30;

/// Maximum length for entity display names.
pub const MAX_NAME_LEN: usize = 200;
