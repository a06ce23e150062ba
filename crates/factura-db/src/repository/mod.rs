//! # Repository Implementations
//!
//! One repository per entity. Every repository follows the same contract:
//!
//! 1. Validate input via factura-core before touching the store
//! 2. Run the whole logical save in one transaction
//! 3. Publish a change event only after the commit
//! 4. Translate constraint failures into typed [`DbError`](crate::DbError)s

pub mod customer;
pub mod factory;
pub mod invoice;
pub mod product;
