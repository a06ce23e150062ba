//! # factura-db: Database Layer for Factura
//!
//! This crate provides database access for Factura.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Factura Data Flow                                │
//! │                                                                         │
//! │  Caller (form submit, list screen, document export)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     factura-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (customer.rs, │    │  (embedded)  │  │   │
//! │  │   │               │    │  invoice.rs,  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  ...)         │    │ 001_init.sql │  │   │
//! │  │   │ Change feed   │    │               │    │ 002_....sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                    SQLite Database (factura.db)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`events`] - Change notifications published after each commit
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (customer, factory, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use factura_db::{Database, DbConfig};
//!
//! // Open the store once at startup
//! let db = Database::new(DbConfig::new("path/to/factura.db")).await?;
//!
//! // Use repositories
//! let customers = db.customers().list().await?;
//!
//! // Watch for committed changes
//! let mut feed = db.subscribe();
//!
//! // Close at shutdown
//! db.close().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod events;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use events::{ChangeEvent, ChangeOp, EntityKind};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::factory::FactoryRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::product::ProductRepository;
